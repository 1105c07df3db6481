use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use fantasy_planner::board::{
    BoardEntry, Fixture, FixtureBoard, available_for_selection, predict_matchday,
};
use fantasy_planner::config::load_planner_config;
use fantasy_planner::difficulty::ClubStrengthTable;
use fantasy_planner::optimizer::{OptimizedSquad, RiskProfile, optimize_profiles, optimize_with};
use fantasy_planner::profile::PlayerRecord;
use fantasy_planner::report::write_json_atomic;
use fantasy_planner::rules::{FreeTransfers, Stage};
use fantasy_planner::sample_pool;

const DEMO_SEED: u64 = 2026;
const DEMO_CLUBS: usize = 16;
const DEMO_MATCHDAYS: u32 = 6;

#[derive(Debug, Deserialize)]
struct MatchdayInput {
    #[serde(default)]
    stage: Option<Stage>,
    players: Vec<PlayerRecord>,
    fixtures: Vec<Fixture>,
}

#[derive(Debug, Serialize)]
struct Report<'a> {
    generated_at: String,
    stage: Stage,
    budget: f64,
    max_per_club: u32,
    predictions: &'a [BoardEntry],
    squads: Vec<&'a OptimizedSquad>,
    failures: Vec<(RiskProfile, String)>,
}

enum ProfileArg {
    One(RiskProfile),
    All,
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    init_logging();

    let mut cfg = load_planner_config()?;
    let mut args = env::args().skip(1);
    let input_path = args.next().filter(|a| a != "-").map(PathBuf::from);
    let profile_arg = match args.next() {
        Some(raw) if raw.eq_ignore_ascii_case("all") => ProfileArg::All,
        Some(raw) => match RiskProfile::parse(&raw) {
            Some(p) => ProfileArg::One(p),
            None => bail!("unknown risk profile {raw:?} (safe, balanced, aggressive, all)"),
        },
        None => ProfileArg::One(cfg.risk_profile),
    };

    let (records, fixtures) = match &input_path {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("read matchday input {}", path.display()))?;
            let input: MatchdayInput = serde_json::from_str(&raw)
                .with_context(|| format!("parse matchday input {}", path.display()))?;
            if let Some(stage) = input.stage {
                cfg.stage = stage;
            }
            (input.players, input.fixtures)
        }
        None => {
            info!(seed = DEMO_SEED, "no input file, planning on a synthetic pool");
            let pool = sample_pool::generate(DEMO_SEED, DEMO_CLUBS, DEMO_MATCHDAYS, &cfg.clubs);
            (pool.records, pool.fixtures)
        }
    };

    let constraints = cfg.constraints().context("squad constraints")?;
    let board = FixtureBoard::from_fixtures(&fixtures, cfg.stage, &cfg.clubs);
    let entries = predict_matchday(&records, &board, &cfg.scoring);
    let pool = available_for_selection(&entries);
    info!(
        stage = cfg.stage.key(),
        players = records.len(),
        selectable = pool.len(),
        "predictions ready"
    );

    let results = match profile_arg {
        ProfileArg::One(profile) => vec![(
            profile,
            optimize_with(&pool, &constraints, profile, &cfg.solver),
        )],
        ProfileArg::All => optimize_profiles(&pool, &constraints, &cfg.solver),
    };

    let stage_rules = cfg.stage.rules();
    let transfers = match stage_rules.free_transfers {
        FreeTransfers::Unlimited => "unlimited".to_string(),
        FreeTransfers::Limited(n) => n.to_string(),
    };
    println!(
        "{} | budget {:.1} | max {} per club | free transfers {transfers} (then -{} pts)",
        stage_rules.label,
        constraints.budget(),
        constraints.max_per_club(),
        stage_rules.transfer_penalty
    );
    let mut squads = Vec::new();
    let mut failures = Vec::new();
    for (profile, result) in &results {
        match result {
            Ok(squad) => {
                print_squad(squad, &board, &cfg.clubs);
                squads.push(squad);
            }
            Err(err) => {
                warn!(profile = profile.label(), error = %err, "no squad");
                println!("[{}] {err}", profile.label());
                failures.push((*profile, err.to_string()));
            }
        }
    }

    if let Ok(path) = env::var("PLANNER_REPORT_PATH") {
        let report = Report {
            generated_at: chrono::Utc::now().to_rfc3339(),
            stage: cfg.stage,
            budget: constraints.budget(),
            max_per_club: constraints.max_per_club(),
            predictions: &entries,
            squads,
            failures,
        };
        write_json_atomic(&PathBuf::from(path), &report)?;
    }

    if results.iter().all(|(_, r)| r.is_err()) {
        bail!("no squad satisfies these constraints");
    }
    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = env::var("PLANNER_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if json {
        fmt().json().with_env_filter(filter).with_writer(std::io::stderr).init();
    } else {
        fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
    }
}

fn print_squad(squad: &OptimizedSquad, board: &FixtureBoard, clubs: &ClubStrengthTable) {
    println!(
        "[{}] {} | cost {:.1} | expected {:.0} pts | captain {}",
        squad.risk_profile.label(),
        squad.formation,
        squad.total_cost,
        squad.total_expected,
        squad.captain.name
    );
    for p in &squad.starting_xi {
        let armband = if squad.is_captain(p) { " (C)" } else { "" };
        let opponent = board
            .fixture_for(&p.club, None)
            .map(|f| {
                let venue = if f.is_home { "H" } else { "A" };
                let fdr = clubs.fixture_difficulty(&f.opponent_club, f.is_home);
                format!("{} ({venue}) fdr {fdr}", f.opponent_club)
            })
            .unwrap_or_default();
        println!(
            "  {:<3} {:<24} {:<20} {:>5.1}m {:>4.0} pts  risk {:<6} {opponent}{armband}",
            p.position.code(),
            p.name,
            p.club,
            p.price,
            squad.reported_points(p),
            p.risk.label()
        );
    }
    println!("  bench:");
    for p in &squad.bench {
        println!(
            "  {:<3} {:<24} {:<20} {:>5.1}m {:>4.0} pts",
            p.position.code(),
            p.name,
            p.club,
            p.price,
            p.expected_points
        );
    }
}

use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use fantasy_planner::board::{FixtureBoard, available_for_selection, predict_matchday};
use fantasy_planner::difficulty::ClubStrengthTable;
use fantasy_planner::optimizer::{RiskProfile, optimize};
use fantasy_planner::rules::{SquadConstraints, Stage};
use fantasy_planner::sample_pool;
use fantasy_planner::scoring::{ScoringRules, score};

fn bench_score_matches(c: &mut Criterion) {
    let pool = sample_pool::generate(1, 8, 6, &ClubStrengthTable::default());
    let stats: Vec<_> = pool
        .records
        .iter()
        .flat_map(|r| r.matches.iter().map(|m| m.stats.clone()))
        .collect();
    c.bench_function("score_matches", |b| {
        b.iter(|| {
            let total: i32 = stats.iter().map(|s| score(black_box(s))).sum();
            black_box(total);
        })
    });
}

fn bench_predict_matchday(c: &mut Criterion) {
    let clubs = ClubStrengthTable::default();
    let pool = sample_pool::generate(2, 32, 6, &clubs);
    let board = FixtureBoard::from_fixtures(&pool.fixtures, Stage::LeaguePhase, &clubs);
    let rules = ScoringRules::default();
    c.bench_function("predict_matchday_768", |b| {
        b.iter(|| {
            let entries = predict_matchday(black_box(&pool.records), &board, &rules);
            black_box(entries.len());
        })
    });
}

fn bench_optimize(c: &mut Criterion) {
    let clubs = ClubStrengthTable::default();
    let pool = sample_pool::generate(3, 16, 6, &clubs);
    let board = FixtureBoard::from_fixtures(&pool.fixtures, Stage::LeaguePhase, &clubs);
    let entries = predict_matchday(&pool.records, &board, &ScoringRules::default());
    let selectable = available_for_selection(&entries);
    let constraints = SquadConstraints::for_stage(Stage::LeaguePhase);

    let mut group = c.benchmark_group("optimize");
    group.sample_size(10);
    group.bench_function("balanced_384", |b| {
        b.iter(|| {
            let squad = optimize(black_box(&selectable), &constraints, RiskProfile::Balanced);
            black_box(squad.map(|s| s.total_expected).ok());
        })
    });
    group.finish();
}

criterion_group!(
    perf,
    bench_score_matches,
    bench_predict_matchday,
    bench_optimize
);
criterion_main!(perf);

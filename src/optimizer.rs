use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::OptimizeError;
use crate::predictor::{Confidence, Prediction, RiskLevel};
use crate::rules::{STARTING_XI, SquadConstraints, xi_minimum};
use crate::scoring::Position;
use crate::solver::{GroupConstraint, GroupSense, SelectionProblem, SolverConfig, solve_selection};

const BUDGET_EPS: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskProfile {
    Safe,
    #[default]
    Balanced,
    Aggressive,
}

impl RiskProfile {
    pub const ALL: [RiskProfile; 3] = [RiskProfile::Safe, RiskProfile::Balanced, RiskProfile::Aggressive];

    pub fn parse(raw: &str) -> Option<RiskProfile> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "safe" => Some(RiskProfile::Safe),
            "balanced" => Some(RiskProfile::Balanced),
            "aggressive" => Some(RiskProfile::Aggressive),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RiskProfile::Safe => "safe",
            RiskProfile::Balanced => "balanced",
            RiskProfile::Aggressive => "aggressive",
        }
    }

    /// Objective weight for one candidate under this profile.
    pub fn adjusted_score(self, p: &Prediction) -> f64 {
        let strategy: fn(&Prediction) -> f64 = match self {
            RiskProfile::Safe => safe_score,
            RiskProfile::Balanced => balanced_score,
            RiskProfile::Aggressive => aggressive_score,
        };
        strategy(p)
    }
}

fn balanced_score(p: &Prediction) -> f64 {
    p.expected_points
}

fn safe_score(p: &Prediction) -> f64 {
    let mut s = p.expected_points;
    s *= match p.risk {
        RiskLevel::High => 0.3,
        RiskLevel::Medium => 0.7,
        RiskLevel::Low => 1.0,
    };
    s *= match p.confidence {
        Confidence::High => 1.2,
        Confidence::Medium => 1.0,
        Confidence::Low => 0.6,
    };
    s
}

fn aggressive_score(p: &Prediction) -> f64 {
    let mut s = p.expected_points;
    s *= match p.risk {
        RiskLevel::High => 1.4,
        RiskLevel::Medium => 1.0,
        RiskLevel::Low => 0.85,
    };
    // Low-confidence picks are the differentials.
    if p.confidence == Confidence::Low {
        s *= 1.3;
    }
    s + p.points_per_million * 0.3
}

#[derive(Debug, Clone, Serialize)]
pub struct OptimizedSquad {
    pub risk_profile: RiskProfile,
    /// Ordered by risk-adjusted score, best first.
    pub squad: Vec<Prediction>,
    pub starting_xi: Vec<Prediction>,
    pub bench: Vec<Prediction>,
    pub captain: Prediction,
    pub formation: String,
    pub total_cost: f64,
    /// Starting XI expected points with the captain counted twice.
    pub total_expected: f64,
    /// Objective value of the chosen squad.
    pub total_adjusted: f64,
}

impl OptimizedSquad {
    pub fn is_captain(&self, p: &Prediction) -> bool {
        p.player_id == self.captain.player_id
    }

    /// Points as reported for display: doubled for the captain.
    pub fn reported_points(&self, p: &Prediction) -> f64 {
        if self.is_captain(p) {
            p.expected_points * 2.0
        } else {
            p.expected_points
        }
    }
}

pub fn optimize(
    predictions: &[Prediction],
    constraints: &SquadConstraints,
    profile: RiskProfile,
) -> Result<OptimizedSquad, OptimizeError> {
    optimize_with(predictions, constraints, profile, &SolverConfig::default())
}

pub fn optimize_with(
    predictions: &[Prediction],
    constraints: &SquadConstraints,
    profile: RiskProfile,
    solver: &SolverConfig,
) -> Result<OptimizedSquad, OptimizeError> {
    let candidates: Vec<&Prediction> = predictions
        .iter()
        .filter(|p| p.expected_points > 0.0)
        .collect();

    for position in Position::ALL {
        let required = constraints.quota(position);
        let available = candidates.iter().filter(|p| p.position == position).count();
        if available < required as usize {
            warn!(
                position = position.code(),
                available, required, "not enough candidates for quota"
            );
            return Err(OptimizeError::NotEnoughCandidates {
                position,
                available,
                required,
            });
        }
    }

    let scores: Vec<f64> = candidates.iter().map(|p| profile.adjusted_score(p)).collect();
    let problem = build_problem(&candidates, &scores, constraints);

    let chosen = match solve_selection(problem, solver.time_limit()) {
        Ok(chosen) => chosen,
        Err(err) => {
            warn!(profile = profile.label(), error = %err, "squad optimization failed");
            return Err(err);
        }
    };
    check_selection(&candidates, &chosen, constraints)?;

    // Stable sort keeps input order among equal scores.
    let mut ranked: Vec<(f64, &Prediction)> = chosen.iter().map(|&i| (scores[i], candidates[i])).collect();
    ranked.sort_by(|a, b| b.0.total_cmp(&a.0));
    let total_adjusted: f64 = ranked.iter().map(|(s, _)| s).sum();
    let squad: Vec<Prediction> = ranked.into_iter().map(|(_, p)| p.clone()).collect();

    let starting_xi = pick_starting_xi(&squad);
    let bench: Vec<Prediction> = squad
        .iter()
        .filter(|p| !starting_xi.iter().any(|s| s.player_id == p.player_id))
        .cloned()
        .collect();
    let captain = pick_captain(&starting_xi).ok_or(OptimizeError::Infeasible)?;
    let formation = formation_of(&starting_xi);

    let total_cost = round2(squad.iter().map(|p| p.price).sum());
    let total_expected =
        round2(starting_xi.iter().map(|p| p.expected_points).sum::<f64>() + captain.expected_points);

    info!(
        profile = profile.label(),
        candidates = candidates.len(),
        formation = %formation,
        total_cost,
        total_expected,
        captain = %captain.name,
        "squad optimized"
    );

    Ok(OptimizedSquad {
        risk_profile: profile,
        squad,
        starting_xi,
        bench,
        captain,
        formation,
        total_cost,
        total_expected,
        total_adjusted: round2(total_adjusted),
    })
}

/// Runs every risk profile over the same pool in parallel.
pub fn optimize_profiles(
    predictions: &[Prediction],
    constraints: &SquadConstraints,
    solver: &SolverConfig,
) -> Vec<(RiskProfile, Result<OptimizedSquad, OptimizeError>)> {
    RiskProfile::ALL
        .par_iter()
        .map(|&profile| {
            (
                profile,
                optimize_with(predictions, constraints, profile, solver),
            )
        })
        .collect()
}

fn build_problem(
    candidates: &[&Prediction],
    scores: &[f64],
    constraints: &SquadConstraints,
) -> SelectionProblem {
    let mut groups = Vec::new();
    for position in Position::ALL {
        groups.push(GroupConstraint {
            members: members_where(candidates, |p| p.position == position),
            sense: GroupSense::Exactly,
            count: constraints.quota(position),
        });
    }

    for club in clubs_of(candidates).into_keys() {
        let members = members_where(candidates, |p| p.club == club);
        // A club that cannot exceed the cap on its own needs no row.
        if members.len() > constraints.max_per_club() as usize {
            groups.push(GroupConstraint {
                members,
                sense: GroupSense::AtMost,
                count: constraints.max_per_club(),
            });
        }
    }

    SelectionProblem {
        scores: scores.to_vec(),
        costs: candidates.iter().map(|p| p.price).collect(),
        budget: constraints.budget(),
        pick: constraints.squad_size(),
        groups,
    }
}

fn members_where(candidates: &[&Prediction], keep: impl Fn(&Prediction) -> bool) -> Vec<usize> {
    candidates
        .iter()
        .enumerate()
        .filter(|(_, p)| keep(p))
        .map(|(i, _)| i)
        .collect()
}

fn clubs_of(players: &[&Prediction]) -> BTreeMap<String, usize> {
    let mut out = BTreeMap::new();
    for p in players {
        *out.entry(p.club.clone()).or_insert(0) += 1;
    }
    out
}

// The solver works in floating point; re-check the integral answer before
// handing it out.
fn check_selection(
    candidates: &[&Prediction],
    chosen: &[usize],
    constraints: &SquadConstraints,
) -> Result<(), OptimizeError> {
    let picked: Vec<&Prediction> = chosen.iter().map(|&i| candidates[i]).collect();
    if picked.len() != constraints.squad_size() as usize {
        return Err(OptimizeError::Solver(format!(
            "solver picked {} players, expected {}",
            picked.len(),
            constraints.squad_size()
        )));
    }
    let cost: f64 = picked.iter().map(|p| p.price).sum();
    if cost > constraints.budget() + BUDGET_EPS {
        return Err(OptimizeError::Solver(format!(
            "solver squad costs {cost:.2} over budget {:.2}",
            constraints.budget()
        )));
    }
    for position in Position::ALL {
        let n = picked.iter().filter(|p| p.position == position).count();
        if n != constraints.quota(position) as usize {
            return Err(OptimizeError::Solver(format!(
                "solver picked {n} {} against a quota of {}",
                position.code(),
                constraints.quota(position)
            )));
        }
    }
    if let Some((club, n)) = clubs_of(&picked)
        .into_iter()
        .find(|(_, n)| *n > constraints.max_per_club() as usize)
    {
        return Err(OptimizeError::Solver(format!(
            "solver picked {n} players from {club}"
        )));
    }
    Ok(())
}

/// One goalkeeper, formation minimums by raw expected points, then the best
/// remaining outfielders. Greedy is exact here since squad membership is fixed.
pub fn pick_starting_xi(squad: &[Prediction]) -> Vec<Prediction> {
    let mut by_points: Vec<&Prediction> = squad.iter().collect();
    by_points.sort_by(|a, b| b.expected_points.total_cmp(&a.expected_points));

    let mut xi: Vec<&Prediction> = Vec::with_capacity(STARTING_XI);
    for position in Position::ALL {
        xi.extend(
            by_points
                .iter()
                .copied()
                .filter(|p| p.position == position)
                .take(xi_minimum(position) as usize),
        );
    }

    for &p in &by_points {
        if xi.len() >= STARTING_XI {
            break;
        }
        if p.position == Position::Goalkeeper {
            continue;
        }
        if xi.iter().any(|s| s.player_id == p.player_id) {
            continue;
        }
        xi.push(p);
    }

    xi.into_iter().cloned().collect()
}

/// Highest raw expected points; the first one wins a tie.
pub fn pick_captain(xi: &[Prediction]) -> Option<Prediction> {
    let mut best: Option<&Prediction> = None;
    for p in xi {
        if best.is_none_or(|b| p.expected_points > b.expected_points) {
            best = Some(p);
        }
    }
    best.cloned()
}

pub fn formation_of(xi: &[Prediction]) -> String {
    let count = |pos: Position| xi.iter().filter(|p| p.position == pos).count();
    format!(
        "{}-{}-{}",
        count(Position::Defender),
        count(Position::Midfielder),
        count(Position::Forward)
    )
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

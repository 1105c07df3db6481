//! 0/1 selection problems solved exactly with good_lp's pure-Rust `microlp`
//! backend.
//!
//! The solve runs on its own thread so the caller can give up after a fixed
//! time budget instead of blocking on a pathological instance.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use good_lp::solvers::microlp::microlp;
use good_lp::{
    Expression, ResolutionError, Solution, SolverModel, Variable, constraint, variable, variables,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::OptimizeError;

pub const DEFAULT_TIME_LIMIT_MS: u64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub time_limit_ms: u64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            time_limit_ms: DEFAULT_TIME_LIMIT_MS,
        }
    }
}

impl SolverConfig {
    pub fn time_limit(&self) -> Duration {
        Duration::from_millis(self.time_limit_ms.max(1))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupSense {
    Exactly,
    AtMost,
}

/// "Pick exactly / at most `count` of these candidates."
#[derive(Debug, Clone)]
pub struct GroupConstraint {
    pub members: Vec<usize>,
    pub sense: GroupSense,
    pub count: u32,
}

/// maximize sum(score_i * x_i)
/// s.t.      sum(cost_i * x_i) <= budget
///           sum(x_i)           = pick
///           group constraints
///           x_i in {0, 1}
#[derive(Debug, Clone)]
pub struct SelectionProblem {
    pub scores: Vec<f64>,
    pub costs: Vec<f64>,
    pub budget: f64,
    pub pick: u32,
    pub groups: Vec<GroupConstraint>,
}

/// Indices of the chosen candidates, ascending.
pub fn solve_selection(
    problem: SelectionProblem,
    time_limit: Duration,
) -> Result<Vec<usize>, OptimizeError> {
    let (tx, rx) = mpsc::channel();
    let vars = problem.scores.len();
    let groups = problem.groups.len();

    thread::Builder::new()
        .name("squad-ilp".to_string())
        .spawn(move || {
            let started = Instant::now();
            let result = solve_blocking(&problem);
            debug!(elapsed_ms = started.elapsed().as_millis() as u64, "ilp finished");
            let _ = tx.send(result);
        })
        .map_err(|err| OptimizeError::Solver(format!("spawn solver thread: {err}")))?;

    debug!(vars, groups, limit_ms = time_limit.as_millis() as u64, "ilp submitted");
    match rx.recv_timeout(time_limit) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => {
            // The worker is detached; its result is dropped when it eventually sends.
            warn!(limit_ms = time_limit.as_millis() as u64, "ilp timed out");
            Err(OptimizeError::TimedOut(time_limit))
        }
        Err(RecvTimeoutError::Disconnected) => Err(OptimizeError::Solver(
            "solver thread exited without a result".to_string(),
        )),
    }
}

fn solve_blocking(problem: &SelectionProblem) -> Result<Vec<usize>, OptimizeError> {
    let n = problem.scores.len();
    if n == 0 {
        return if problem.pick == 0 {
            Ok(Vec::new())
        } else {
            Err(OptimizeError::Infeasible)
        };
    }

    let mut vars = variables!();
    let xs: Vec<Variable> = (0..n).map(|_| vars.add(variable().binary())).collect();

    let objective: Expression = xs
        .iter()
        .zip(problem.scores.iter())
        .map(|(x, s)| *s * *x)
        .sum();
    let mut model = vars.maximise(objective).using(microlp);

    let spend: Expression = xs
        .iter()
        .zip(problem.costs.iter())
        .map(|(x, c)| *c * *x)
        .sum();
    let budget = problem.budget;
    model = model.with(constraint!(spend <= budget));

    let picked: Expression = xs.iter().map(|x| Expression::from(*x)).sum();
    let pick = f64::from(problem.pick);
    model = model.with(constraint!(picked == pick));

    for group in &problem.groups {
        let lhs: Expression = group
            .members
            .iter()
            .map(|&i| Expression::from(xs[i]))
            .sum();
        let rhs = f64::from(group.count);
        model = match group.sense {
            GroupSense::Exactly => model.with(constraint!(lhs == rhs)),
            GroupSense::AtMost => model.with(constraint!(lhs <= rhs)),
        };
    }

    match model.solve() {
        Ok(solution) => Ok(xs
            .iter()
            .enumerate()
            .filter(|(_, x)| solution.value(**x) > 0.5)
            .map(|(i, _)| i)
            .collect()),
        Err(ResolutionError::Infeasible) => Err(OptimizeError::Infeasible),
        Err(err) => Err(OptimizeError::Solver(err.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limit() -> Duration {
        Duration::from_secs(10)
    }

    #[test]
    fn picks_best_pair_under_budget() {
        // Greedy by score takes 0 (cost 8) and can then only afford 3.
        let problem = SelectionProblem {
            scores: vec![10.0, 7.0, 7.0, 1.0],
            costs: vec![8.0, 5.0, 5.0, 1.0],
            budget: 10.0,
            pick: 2,
            groups: Vec::new(),
        };
        assert_eq!(solve_selection(problem, limit()).unwrap(), vec![1, 2]);
    }

    #[test]
    fn group_caps_are_respected() {
        let problem = SelectionProblem {
            scores: vec![9.0, 8.0, 7.0, 1.0],
            costs: vec![1.0; 4],
            budget: 10.0,
            pick: 2,
            groups: vec![GroupConstraint {
                members: vec![0, 1, 2],
                sense: GroupSense::AtMost,
                count: 1,
            }],
        };
        assert_eq!(solve_selection(problem, limit()).unwrap(), vec![0, 3]);
    }

    #[test]
    fn over_budget_is_infeasible() {
        let problem = SelectionProblem {
            scores: vec![1.0, 1.0],
            costs: vec![6.0, 6.0],
            budget: 10.0,
            pick: 2,
            groups: Vec::new(),
        };
        assert_eq!(
            solve_selection(problem, limit()),
            Err(OptimizeError::Infeasible)
        );
    }

    #[test]
    fn empty_problem() {
        let problem = SelectionProblem {
            scores: Vec::new(),
            costs: Vec::new(),
            budget: 0.0,
            pick: 0,
            groups: Vec::new(),
        };
        assert_eq!(solve_selection(problem, limit()).unwrap(), Vec::<usize>::new());
    }
}

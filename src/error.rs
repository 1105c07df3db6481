use std::time::Duration;

use thiserror::Error;

use crate::scoring::Position;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("position quotas sum to {quota_total} but squad size is {squad_size}")]
    QuotaMismatch { quota_total: u32, squad_size: u32 },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] serde_json::Error),
}

/// Outcomes of a squad optimization that did not produce a squad.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OptimizeError {
    #[error("only {available} {} candidates for a quota of {required}", .position.code())]
    NotEnoughCandidates {
        position: Position,
        available: usize,
        required: u32,
    },

    #[error("no squad satisfies these constraints")]
    Infeasible,

    #[error("solver gave up after {0:?}")]
    TimedOut(Duration),

    #[error("solver failure: {0}")]
    Solver(String),
}

impl OptimizeError {
    /// True for every "no squad exists" outcome, as opposed to the solver
    /// running out of time or breaking.
    pub fn is_infeasible(&self) -> bool {
        matches!(
            self,
            OptimizeError::Infeasible | OptimizeError::NotEnoughCandidates { .. }
        )
    }
}

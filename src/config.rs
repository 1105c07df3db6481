use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::difficulty::ClubStrengthTable;
use crate::error::ConfigError;
use crate::optimizer::RiskProfile;
use crate::rules::{SquadConstraints, Stage};
use crate::scoring::ScoringRules;
use crate::solver::SolverConfig;

const CONFIG_DIR: &str = "fantasy_planner";
const CONFIG_FILE: &str = "planner_config.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub stage: Stage,
    pub risk_profile: RiskProfile,
    /// Overrides the stage budget when set.
    pub budget: Option<f64>,
    /// Overrides the stage club limit when set.
    pub max_per_club: Option<u32>,
    pub scoring: ScoringRules,
    pub clubs: ClubStrengthTable,
    pub solver: SolverConfig,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            stage: Stage::LeaguePhase,
            risk_profile: RiskProfile::Balanced,
            budget: None,
            max_per_club: None,
            scoring: ScoringRules::default(),
            clubs: ClubStrengthTable::default(),
            solver: SolverConfig::default(),
        }
    }
}

impl PlannerConfig {
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(raw).map_err(ConfigError::Parse)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::from_json(&raw)
    }

    /// Stage limits with any explicit overrides applied.
    pub fn constraints(&self) -> Result<SquadConstraints, ConfigError> {
        let mut c = SquadConstraints::for_stage(self.stage);
        if let Some(budget) = self.budget {
            c = c.with_budget(budget)?;
        }
        if let Some(max) = self.max_per_club {
            c = c.with_max_per_club(max)?;
        }
        Ok(c)
    }

    /// `PLANNER_STAGE`, `PLANNER_RISK_PROFILE`, `PLANNER_BUDGET` and
    /// `PLANNER_SOLVER_TIMEOUT_MS` win over the file.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(raw) = env::var("PLANNER_STAGE") {
            self.stage = Stage::parse(&raw);
        }
        if let Ok(raw) = env::var("PLANNER_RISK_PROFILE") {
            self.risk_profile = RiskProfile::parse(&raw).ok_or_else(|| ConfigError::InvalidValue {
                field: "PLANNER_RISK_PROFILE",
                reason: format!("unknown profile {raw:?}"),
            })?;
        }
        if let Ok(raw) = env::var("PLANNER_BUDGET") {
            let budget = raw.trim().parse::<f64>().map_err(|err| ConfigError::InvalidValue {
                field: "PLANNER_BUDGET",
                reason: err.to_string(),
            })?;
            self.budget = Some(budget);
        }
        if let Some(ms) = env::var("PLANNER_SOLVER_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
        {
            self.solver.time_limit_ms = ms.max(100);
        }
        Ok(())
    }
}

/// Explicit path override, then the per-user config file, then defaults.
pub fn load_planner_config() -> Result<PlannerConfig> {
    let mut cfg = match locate_config() {
        Some(path) => {
            info!(path = %path.display(), "loading planner config");
            PlannerConfig::from_path(&path)
                .with_context(|| format!("load planner config {}", path.display()))?
        }
        None => {
            debug!("no planner config found, using defaults");
            PlannerConfig::default()
        }
    };
    cfg.apply_env_overrides().context("apply env overrides")?;
    cfg.constraints().context("validate squad constraints")?;
    Ok(cfg)
}

fn locate_config() -> Option<PathBuf> {
    if let Ok(raw) = env::var("PLANNER_CONFIG_PATH") {
        let path = PathBuf::from(raw.trim());
        if path.exists() {
            return Some(path);
        }
    }
    config_dir()
        .map(|dir| dir.join(CONFIG_FILE))
        .filter(|path| path.exists())
}

fn config_dir() -> Option<PathBuf> {
    if let Ok(xdg) = env::var("XDG_CONFIG_HOME")
        && !xdg.trim().is_empty()
    {
        return Some(PathBuf::from(xdg).join(CONFIG_DIR));
    }
    env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .ok()
        .map(|home| PathBuf::from(home).join(".config").join(CONFIG_DIR))
}

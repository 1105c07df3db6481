use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::scoring::Position;

pub const SQUAD_SIZE: u32 = 15;
pub const STARTING_XI: usize = 11;

/// Fewest players of a position any starting XI fields.
pub fn xi_minimum(position: Position) -> u32 {
    match position {
        Position::Goalkeeper => 1,
        Position::Defender => 3,
        Position::Midfielder => 2,
        Position::Forward => 1,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    LeaguePhase,
    KoPlayoffs,
    KoPlayoffsLeg2,
    #[serde(rename = "round_of_16")]
    RoundOf16,
    #[serde(rename = "round_of_16_leg2")]
    RoundOf16Leg2,
    QuarterFinals,
    QuarterFinalsLeg2,
    SemiFinals,
    SemiFinalsLeg2,
    Final,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FreeTransfers {
    Unlimited,
    Limited(u8),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageRules {
    pub stage: Stage,
    pub label: &'static str,
    pub budget: f64,
    pub max_per_club: u32,
    pub transfer_penalty: u32,
    pub free_transfers: FreeTransfers,
    /// Unused transfers that may roll over to the next matchday.
    pub max_carry: u8,
}

impl Stage {
    pub const ALL: [Stage; 10] = [
        Stage::LeaguePhase,
        Stage::KoPlayoffs,
        Stage::KoPlayoffsLeg2,
        Stage::RoundOf16,
        Stage::RoundOf16Leg2,
        Stage::QuarterFinals,
        Stage::QuarterFinalsLeg2,
        Stage::SemiFinals,
        Stage::SemiFinalsLeg2,
        Stage::Final,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Stage::LeaguePhase => "league_phase",
            Stage::KoPlayoffs => "ko_playoffs",
            Stage::KoPlayoffsLeg2 => "ko_playoffs_leg2",
            Stage::RoundOf16 => "round_of_16",
            Stage::RoundOf16Leg2 => "round_of_16_leg2",
            Stage::QuarterFinals => "quarter_finals",
            Stage::QuarterFinalsLeg2 => "quarter_finals_leg2",
            Stage::SemiFinals => "semi_finals",
            Stage::SemiFinalsLeg2 => "semi_finals_leg2",
            Stage::Final => "final",
        }
    }

    /// Unknown keys fall back to the league phase, which has the strictest limits.
    pub fn parse(raw: &str) -> Stage {
        let k = raw.trim().to_ascii_lowercase();
        Stage::ALL
            .into_iter()
            .find(|s| s.key() == k)
            .unwrap_or(Stage::LeaguePhase)
    }

    pub fn is_knockout(self) -> bool {
        self != Stage::LeaguePhase
    }

    pub fn rules(self) -> StageRules {
        let (label, budget, max_per_club, free_transfers) = match self {
            Stage::LeaguePhase => ("League Phase", 100.0, 3, FreeTransfers::Limited(2)),
            Stage::KoPlayoffs => (
                "Knockout Play-offs (Leg 1)",
                105.0,
                4,
                FreeTransfers::Unlimited,
            ),
            Stage::KoPlayoffsLeg2 => (
                "Knockout Play-offs (Leg 2)",
                105.0,
                4,
                FreeTransfers::Limited(2),
            ),
            Stage::RoundOf16 => ("Round of 16 (Leg 1)", 105.0, 4, FreeTransfers::Unlimited),
            Stage::RoundOf16Leg2 => ("Round of 16 (Leg 2)", 105.0, 4, FreeTransfers::Limited(3)),
            Stage::QuarterFinals => ("Quarter-finals (Leg 1)", 105.0, 5, FreeTransfers::Limited(5)),
            Stage::QuarterFinalsLeg2 => (
                "Quarter-finals (Leg 2)",
                105.0,
                5,
                FreeTransfers::Limited(3),
            ),
            Stage::SemiFinals => ("Semi-finals (Leg 1)", 105.0, 6, FreeTransfers::Limited(5)),
            Stage::SemiFinalsLeg2 => ("Semi-finals (Leg 2)", 105.0, 6, FreeTransfers::Limited(3)),
            Stage::Final => ("Final", 105.0, 8, FreeTransfers::Limited(5)),
        };
        StageRules {
            stage: self,
            label,
            budget,
            max_per_club,
            transfer_penalty: 4,
            free_transfers,
            max_carry: if self == Stage::LeaguePhase { 1 } else { 0 },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionQuotas {
    pub goalkeepers: u32,
    pub defenders: u32,
    pub midfielders: u32,
    pub forwards: u32,
}

impl Default for PositionQuotas {
    fn default() -> Self {
        Self {
            goalkeepers: 2,
            defenders: 5,
            midfielders: 5,
            forwards: 3,
        }
    }
}

impl PositionQuotas {
    pub fn get(&self, position: Position) -> u32 {
        match position {
            Position::Goalkeeper => self.goalkeepers,
            Position::Defender => self.defenders,
            Position::Midfielder => self.midfielders,
            Position::Forward => self.forwards,
        }
    }

    pub fn total(&self) -> u32 {
        self.goalkeepers + self.defenders + self.midfielders + self.forwards
    }
}

#[derive(Debug, Clone, Deserialize)]
struct RawSquadConstraints {
    budget: f64,
    max_per_club: u32,
    #[serde(default = "default_squad_size")]
    squad_size: u32,
    #[serde(default)]
    quotas: PositionQuotas,
}

fn default_squad_size() -> u32 {
    SQUAD_SIZE
}

/// Validated squad-building limits. Quotas always sum to the squad size; a
/// mismatched configuration is rejected here rather than at solve time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSquadConstraints")]
pub struct SquadConstraints {
    budget: f64,
    max_per_club: u32,
    squad_size: u32,
    quotas: PositionQuotas,
}

impl TryFrom<RawSquadConstraints> for SquadConstraints {
    type Error = ConfigError;

    fn try_from(raw: RawSquadConstraints) -> Result<Self, Self::Error> {
        SquadConstraints::new(raw.budget, raw.max_per_club, raw.squad_size, raw.quotas)
    }
}

impl Default for SquadConstraints {
    fn default() -> Self {
        Self::for_stage(Stage::LeaguePhase)
    }
}

impl SquadConstraints {
    pub fn new(
        budget: f64,
        max_per_club: u32,
        squad_size: u32,
        quotas: PositionQuotas,
    ) -> Result<Self, ConfigError> {
        if !budget.is_finite() || budget < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "budget",
                reason: format!("{budget} is not a non-negative amount"),
            });
        }
        if max_per_club == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_per_club",
                reason: "must allow at least one player per club".to_string(),
            });
        }
        if (squad_size as usize) < STARTING_XI {
            return Err(ConfigError::InvalidValue {
                field: "squad_size",
                reason: format!("{squad_size} players cannot field a starting XI"),
            });
        }
        for (position, field) in [
            (Position::Goalkeeper, "quotas.goalkeepers"),
            (Position::Defender, "quotas.defenders"),
            (Position::Midfielder, "quotas.midfielders"),
            (Position::Forward, "quotas.forwards"),
        ] {
            let min = xi_minimum(position);
            if quotas.get(position) < min {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: format!("a starting XI needs at least {min} {}", position.code()),
                });
            }
        }
        let outfield = quotas.defenders + quotas.midfielders + quotas.forwards;
        if (outfield as usize) < STARTING_XI - 1 {
            return Err(ConfigError::InvalidValue {
                field: "quotas",
                reason: format!("{outfield} outfielders cannot fill a starting XI"),
            });
        }
        if quotas.total() != squad_size {
            return Err(ConfigError::QuotaMismatch {
                quota_total: quotas.total(),
                squad_size,
            });
        }
        Ok(Self {
            budget,
            max_per_club,
            squad_size,
            quotas,
        })
    }

    pub fn for_stage(stage: Stage) -> Self {
        let rules = stage.rules();
        Self {
            budget: rules.budget,
            max_per_club: rules.max_per_club,
            squad_size: SQUAD_SIZE,
            quotas: PositionQuotas::default(),
        }
    }

    pub fn with_budget(mut self, budget: f64) -> Result<Self, ConfigError> {
        if !budget.is_finite() || budget < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "budget",
                reason: format!("{budget} is not a non-negative amount"),
            });
        }
        self.budget = budget;
        Ok(self)
    }

    pub fn with_max_per_club(mut self, max_per_club: u32) -> Result<Self, ConfigError> {
        if max_per_club == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_per_club",
                reason: "must allow at least one player per club".to_string(),
            });
        }
        self.max_per_club = max_per_club;
        Ok(self)
    }

    pub fn budget(&self) -> f64 {
        self.budget
    }

    pub fn max_per_club(&self) -> u32 {
        self.max_per_club
    }

    pub fn squad_size(&self) -> u32 {
        self.squad_size
    }

    pub fn quotas(&self) -> PositionQuotas {
        self.quotas
    }

    pub fn quota(&self, position: Position) -> u32 {
        self.quotas.get(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_stage_falls_back_to_league_phase() {
        assert_eq!(Stage::parse("round_of_16_leg2"), Stage::RoundOf16Leg2);
        assert_eq!(Stage::parse(" FINAL "), Stage::Final);
        assert_eq!(Stage::parse("group_stage"), Stage::LeaguePhase);
    }

    #[test]
    fn club_limit_grows_through_knockouts() {
        let limits: Vec<u32> = Stage::ALL.iter().map(|s| s.rules().max_per_club).collect();
        assert_eq!(limits, vec![3, 4, 4, 4, 4, 5, 5, 6, 6, 8]);
        assert!(limits.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn only_league_phase_carries_transfers() {
        assert_eq!(Stage::LeaguePhase.rules().max_carry, 1);
        assert!(Stage::ALL[1..].iter().all(|s| s.rules().max_carry == 0));
        assert!(!Stage::LeaguePhase.is_knockout());
        assert!(Stage::Final.is_knockout());
    }

    #[test]
    fn mismatched_quotas_are_a_config_error() {
        let quotas = PositionQuotas {
            goalkeepers: 2,
            defenders: 5,
            midfielders: 5,
            forwards: 2,
        };
        let err = SquadConstraints::new(100.0, 3, 15, quotas).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::QuotaMismatch {
                quota_total: 14,
                squad_size: 15
            }
        ));
    }

    #[test]
    fn quotas_must_cover_the_starting_formation() {
        let thin_defence = PositionQuotas {
            goalkeepers: 1,
            defenders: 2,
            midfielders: 2,
            forwards: 10,
        };
        let err = SquadConstraints::new(500.0, 15, 15, thin_defence).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "quotas.defenders",
                ..
            }
        ));

        let keepers_heavy = PositionQuotas {
            goalkeepers: 3,
            defenders: 4,
            midfielders: 3,
            forwards: 2,
        };
        let err = SquadConstraints::new(100.0, 3, 12, keepers_heavy).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { field: "quotas", .. }));
    }

    #[test]
    fn squad_smaller_than_an_xi_is_rejected() {
        let tiny = PositionQuotas {
            goalkeepers: 1,
            defenders: 3,
            midfielders: 2,
            forwards: 1,
        };
        let err = SquadConstraints::new(100.0, 3, 7, tiny).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { field: "squad_size", .. }));

        let bad = serde_json::from_str::<SquadConstraints>(
            r#"{"budget": 100, "max_per_club": 3, "squad_size": 7,
                "quotas": {"goalkeepers": 1, "defenders": 3, "midfielders": 2, "forwards": 1}}"#,
        );
        assert!(bad.is_err());

        let thin = serde_json::from_str::<SquadConstraints>(
            r#"{"budget": 100, "max_per_club": 3,
                "quotas": {"goalkeepers": 1, "defenders": 2, "midfielders": 2, "forwards": 10}}"#,
        );
        assert!(thin.is_err());
    }

    #[test]
    fn deserialization_validates_quotas() {
        let ok: SquadConstraints =
            serde_json::from_str(r#"{"budget": 95.5, "max_per_club": 4}"#).unwrap();
        assert_eq!(ok.squad_size(), 15);
        assert_eq!(ok.quota(Position::Defender), 5);

        let bad = serde_json::from_str::<SquadConstraints>(
            r#"{"budget": 100, "max_per_club": 3, "squad_size": 16}"#,
        );
        assert!(bad.is_err());
    }
}

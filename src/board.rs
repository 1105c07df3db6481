use std::collections::HashMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::difficulty::ClubStrengthTable;
use crate::predictor::{FixtureInfo, Prediction, predict};
use crate::profile::{PlayerRecord, build_profile};
use crate::rules::Stage;
use crate::scoring::ScoringRules;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FixtureStatus {
    #[default]
    Scheduled,
    Played,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fixture {
    pub home_club: String,
    pub away_club: String,
    #[serde(default)]
    pub home_code: Option<String>,
    #[serde(default)]
    pub away_code: Option<String>,
    /// Normalized [0, 1]; derived from the club table when absent.
    #[serde(default)]
    pub home_strength: Option<f64>,
    #[serde(default)]
    pub away_strength: Option<f64>,
    #[serde(default)]
    pub status: FixtureStatus,
    /// Round the fixture belongs to; lets played fixtures report actual points.
    #[serde(default)]
    pub matchday: Option<u32>,
}

/// Club (name or short code) -> this round's fixture from that club's side.
#[derive(Debug, Clone, Default)]
pub struct FixtureBoard {
    by_club: HashMap<String, FixtureInfo>,
    played: HashMap<String, Option<u32>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BoardEntry {
    #[serde(flatten)]
    pub prediction: Prediction,
    pub fixture_played: bool,
    /// Points scored in the played fixture, when its stats are on record.
    pub actual_points: Option<i32>,
}

impl FixtureBoard {
    pub fn from_fixtures(fixtures: &[Fixture], stage: Stage, clubs: &ClubStrengthTable) -> Self {
        let mut board = FixtureBoard::default();
        let is_knockout = stage.is_knockout();

        for f in fixtures {
            let home_strength = f
                .home_strength
                .unwrap_or_else(|| clubs.normalized_strength(&f.home_club));
            let away_strength = f
                .away_strength
                .unwrap_or_else(|| clubs.normalized_strength(&f.away_club));

            let home_side = FixtureInfo {
                opponent_club: f.away_club.clone(),
                opponent_strength: away_strength,
                is_home: true,
                is_knockout,
            };
            let away_side = FixtureInfo {
                opponent_club: f.home_club.clone(),
                opponent_strength: home_strength,
                is_home: false,
                is_knockout,
            };

            let home_keys = club_keys(&f.home_club, f.home_code.as_deref());
            let away_keys = club_keys(&f.away_club, f.away_code.as_deref());
            if f.status == FixtureStatus::Played {
                for k in home_keys.iter().chain(away_keys.iter()) {
                    board.played.insert(k.clone(), f.matchday);
                }
            }
            for k in home_keys {
                board.by_club.insert(k, home_side.clone());
            }
            for k in away_keys {
                board.by_club.insert(k, away_side.clone());
            }
        }
        debug!(
            fixtures = fixtures.len(),
            clubs = board.by_club.len(),
            "fixture board built"
        );
        board
    }

    pub fn fixture_for(&self, club: &str, code: Option<&str>) -> Option<&FixtureInfo> {
        self.by_club
            .get(&normalize_club(club))
            .or_else(|| code.and_then(|c| self.by_club.get(&normalize_club(c))))
    }

    pub fn is_played(&self, club: &str, code: Option<&str>) -> bool {
        self.played_entry(club, code).is_some()
    }

    /// Matchday of the club's played fixture, if it is known.
    pub fn played_matchday(&self, club: &str, code: Option<&str>) -> Option<u32> {
        self.played_entry(club, code).copied().flatten()
    }

    fn played_entry(&self, club: &str, code: Option<&str>) -> Option<&Option<u32>> {
        self.played
            .get(&normalize_club(club))
            .or_else(|| code.and_then(|c| self.played.get(&normalize_club(c))))
    }

    pub fn len(&self) -> usize {
        self.by_club.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_club.is_empty()
    }
}

/// Predicts every player whose club has a fixture on the board, best first.
pub fn predict_matchday(
    records: &[PlayerRecord],
    board: &FixtureBoard,
    rules: &ScoringRules,
) -> Vec<BoardEntry> {
    let mut out: Vec<BoardEntry> = records
        .par_iter()
        .filter_map(|record| {
            let code = record.club_code.as_deref();
            let fixture = board.fixture_for(&record.club, code)?;
            let profile = build_profile(record, rules);
            let actual_points = board
                .played_matchday(&record.club, code)
                .and_then(|md| record.matches.iter().find(|m| m.matchday == md))
                .map(|m| rules.score(&m.stats));
            Some(BoardEntry {
                prediction: predict(&profile, fixture),
                fixture_played: board.is_played(&record.club, code),
                actual_points,
            })
        })
        .collect();

    out.sort_by(|a, b| {
        b.prediction
            .expected_points
            .total_cmp(&a.prediction.expected_points)
            .then(a.prediction.player_id.cmp(&b.prediction.player_id))
    });
    info!(
        players = records.len(),
        predicted = out.len(),
        "matchday predictions ready"
    );
    out
}

/// Players still selectable this round: their fixture has not kicked off.
pub fn available_for_selection(entries: &[BoardEntry]) -> Vec<Prediction> {
    entries
        .iter()
        .filter(|e| !e.fixture_played)
        .map(|e| e.prediction.clone())
        .collect()
}

fn club_keys(club: &str, code: Option<&str>) -> Vec<String> {
    let mut keys = vec![normalize_club(club)];
    if let Some(c) = code {
        let c = normalize_club(c);
        if !c.is_empty() && !keys.contains(&c) {
            keys.push(c);
        }
    }
    keys
}

fn normalize_club(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::RecordedMatch;
    use crate::scoring::{MatchStats, Position};

    fn fixture(home: &str, away: &str, status: FixtureStatus) -> Fixture {
        Fixture {
            home_club: home.to_string(),
            away_club: away.to_string(),
            home_code: None,
            away_code: None,
            home_strength: None,
            away_strength: Some(0.2),
            status,
            matchday: None,
        }
    }

    #[test]
    fn both_sides_get_mirrored_fixtures() {
        let clubs = ClubStrengthTable::empty().with_club("Home FC", 5.0);
        let board = FixtureBoard::from_fixtures(
            &[fixture("Home FC", "Away FC", FixtureStatus::Scheduled)],
            Stage::RoundOf16,
            &clubs,
        );
        let home = board.fixture_for("home fc", None).unwrap();
        assert_eq!(home.opponent_club, "Away FC");
        assert_eq!(home.opponent_strength, 0.2);
        assert!(home.is_home);
        assert!(home.is_knockout);

        let away = board.fixture_for("Away FC", None).unwrap();
        assert_eq!(away.opponent_club, "Home FC");
        assert_eq!(away.opponent_strength, 1.0);
        assert!(!away.is_home);
    }

    #[test]
    fn codes_resolve_and_played_is_tracked() {
        let mut f = fixture("Real Madrid", "Liverpool", FixtureStatus::Played);
        f.home_code = Some("RMA".to_string());
        let board =
            FixtureBoard::from_fixtures(&[f], Stage::LeaguePhase, &ClubStrengthTable::default());
        assert!(board.fixture_for("Unknown", Some("rma")).is_some());
        assert!(board.is_played("Unknown", Some("RMA")));
        assert!(board.is_played("Liverpool", None));
        assert!(!board.fixture_for("Liverpool", None).unwrap().is_knockout);
        assert_eq!(board.played_matchday("Liverpool", None), None);
    }

    #[test]
    fn played_fixtures_report_actual_points() {
        let mut f = fixture("Home FC", "Away FC", FixtureStatus::Played);
        f.matchday = Some(3);
        let board =
            FixtureBoard::from_fixtures(&[f], Stage::LeaguePhase, &ClubStrengthTable::empty());
        assert_eq!(board.played_matchday("away fc", None), Some(3));

        let mut stats = MatchStats::new(10, Position::Forward);
        stats.minutes = 90;
        stats.goals = 1;
        let record = PlayerRecord {
            player_id: 10,
            name: "Nine".to_string(),
            club: "Home FC".to_string(),
            club_code: None,
            position: Position::Forward,
            price: 7.0,
            is_starter: true,
            is_set_piece_taker: false,
            injury_status: Default::default(),
            season: Default::default(),
            matches: vec![
                RecordedMatch {
                    matchday: 2,
                    stats: MatchStats::new(10, Position::Forward),
                },
                RecordedMatch { matchday: 3, stats },
            ],
        };
        let mut idle = record.clone();
        idle.player_id = 11;
        idle.matches.truncate(1);

        let entries = predict_matchday(&[record, idle], &board, &ScoringRules::default());
        let by_id = |id: u32| entries.iter().find(|e| e.prediction.player_id == id).unwrap();
        assert!(by_id(10).fixture_played);
        assert_eq!(by_id(10).actual_points, Some(6));
        assert_eq!(by_id(11).actual_points, None);
        assert!(available_for_selection(&entries).is_empty());
    }
}

use serde::{Deserialize, Serialize};

use crate::predictor::{InjuryStatus, PlayerProfile};
use crate::scoring::{MatchStats, Position, ScoringRules};

pub const FORM_WINDOW: usize = 5;
// Season summaries carry minutes but no match count; assume a full league phase.
const SUMMARY_MATCHDAYS: f64 = 8.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedMatch {
    pub matchday: u32,
    pub stats: MatchStats,
}

/// Provider-reported season numbers, used when we hold no per-match stats.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeasonSummary {
    #[serde(default)]
    pub avg_points: f64,
    #[serde(default)]
    pub total_points: f64,
    #[serde(default)]
    pub minutes_played: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub player_id: u32,
    pub name: String,
    pub club: String,
    #[serde(default)]
    pub club_code: Option<String>,
    pub position: Position,
    pub price: f64,
    #[serde(default = "default_true")]
    pub is_starter: bool,
    #[serde(default)]
    pub is_set_piece_taker: bool,
    #[serde(default)]
    pub injury_status: InjuryStatus,
    #[serde(default)]
    pub season: SeasonSummary,
    #[serde(default)]
    pub matches: Vec<RecordedMatch>,
}

fn default_true() -> bool {
    true
}

pub fn build_profile(record: &PlayerRecord, rules: &ScoringRules) -> PlayerProfile {
    let mut profile = PlayerProfile {
        player_id: record.player_id,
        name: record.name.clone(),
        club: record.club.clone(),
        position: record.position,
        price: record.price,
        avg_minutes_last5: 0.0,
        avg_points_last5: 0.0,
        total_goals: 0,
        total_assists: 0,
        total_clean_sheets: 0,
        matches_played: 0,
        is_starter: record.is_starter,
        is_set_piece_taker: record.is_set_piece_taker,
        injury_status: record.injury_status,
    };

    for m in &record.matches {
        profile.total_goals += m.stats.goals;
        profile.total_assists += m.stats.assists;
        if m.stats.clean_sheet {
            profile.total_clean_sheets += 1;
        }
    }

    if record.matches.is_empty() {
        apply_season_summary(&mut profile, &record.season);
        return profile;
    }

    let mut recent: Vec<&RecordedMatch> = record.matches.iter().collect();
    recent.sort_by(|a, b| b.matchday.cmp(&a.matchday));
    recent.truncate(FORM_WINDOW);

    let n = recent.len() as f64;
    let points: i32 = recent.iter().map(|m| rules.score(&m.stats)).sum();
    let minutes: u32 = recent.iter().map(|m| m.stats.minutes).sum();
    profile.avg_points_last5 = f64::from(points) / n;
    profile.avg_minutes_last5 = f64::from(minutes) / n;
    profile.matches_played = recent.len() as u32;
    profile
}

fn apply_season_summary(profile: &mut PlayerProfile, season: &SeasonSummary) {
    let mins = season.minutes_played;
    let full_games = f64::from((mins / 90).max(1));
    profile.avg_points_last5 = if season.avg_points > 0.0 {
        season.avg_points
    } else {
        (season.total_points / full_games).max(0.0)
    };
    profile.avg_minutes_last5 = f64::from(mins) / SUMMARY_MATCHDAYS;
    profile.matches_played = if mins > 0 { (mins / 60).max(1) } else { 0 };
}

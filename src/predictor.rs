use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::scoring::Position;

// Availability tiers.
const P_DOUBT: f64 = 0.30;
const P_BENCH: f64 = 0.35;
const P_UNPROVEN_STARTER: f64 = 0.75;
const P_NINETY: f64 = 0.92;
const P_REGULAR: f64 = 0.80;
const P_ROTATION: f64 = 0.55;
const P_FRINGE: f64 = 0.30;

// Rolling-average vs price-implied blend. Tuned by hand; keep as-is.
const BLEND_ESTABLISHED_AVG: f64 = 0.80;
const BLEND_ESTABLISHED_PRICE: f64 = 0.20;
const BLEND_EARLY_AVG: f64 = 0.65;
const BLEND_EARLY_PRICE: f64 = 0.35;
const ESTABLISHED_MATCHES: u32 = 5;
const MIN_HISTORY_MATCHES: u32 = 2;

// Price-implied expectation: PRICE_INTERCEPT + PRICE_SLOPE * price.
const PRICE_INTERCEPT: f64 = 0.6;
const PRICE_SLOPE: f64 = 0.45;

const STRENGTH_SLOPE: f64 = 0.6;
const ATTACK_WEAK_OPP: f64 = 0.15;
const CLEAN_SHEET_WEAK_OPP: f64 = 0.10;
const HOME_BONUS: f64 = 0.08;
const KNOCKOUT_BOOST: f64 = 1.05;
const FIXTURE_MOD_MIN: f64 = 0.5;
const FIXTURE_MOD_MAX: f64 = 1.5;

const SET_PIECE_BONUS: f64 = 0.8;
const SET_PIECE_WEAK_OPP: f64 = 0.25;

const UPSIDE_FACTOR: f64 = 1.15;
const PREMIUM_UPSIDE: f64 = 0.05;
const PREMIUM_PRICE: f64 = 8.0;

const SUB_APPEARANCE_POINTS: f64 = 1.0;
const MIN_PRICE: f64 = 0.1;

/// League-phase average points by position; the floor for players with no
/// usable history.
pub fn position_baseline(position: Position) -> f64 {
    match position {
        Position::Goalkeeper => 3.5,
        Position::Defender => 3.8,
        Position::Midfielder => 3.5,
        Position::Forward => 3.2,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InjuryStatus {
    #[default]
    Fit,
    #[serde(alias = "doubtful")]
    Doubt,
    #[serde(alias = "injured", alias = "suspended")]
    Out,
}

impl InjuryStatus {
    pub fn parse(raw: &str) -> InjuryStatus {
        match raw.trim().to_ascii_lowercase().as_str() {
            "out" | "injured" | "suspended" => InjuryStatus::Out,
            "doubt" | "doubtful" => InjuryStatus::Doubt,
            _ => InjuryStatus::Fit,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub player_id: u32,
    pub name: String,
    pub club: String,
    pub position: Position,
    /// In millions.
    pub price: f64,
    #[serde(default)]
    pub avg_minutes_last5: f64,
    #[serde(default)]
    pub avg_points_last5: f64,
    #[serde(default)]
    pub total_goals: u32,
    #[serde(default)]
    pub total_assists: u32,
    #[serde(default)]
    pub total_clean_sheets: u32,
    #[serde(default)]
    pub matches_played: u32,
    #[serde(default = "default_true")]
    pub is_starter: bool,
    #[serde(default)]
    pub is_set_piece_taker: bool,
    #[serde(default)]
    pub injury_status: InjuryStatus,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureInfo {
    pub opponent_club: String,
    /// 0 = weakest, 1 = strongest.
    pub opponent_strength: f64,
    #[serde(default = "default_true")]
    pub is_home: bool,
    #[serde(default)]
    pub is_knockout: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl Confidence {
    pub fn label(self) -> &'static str {
        match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
        }
    }
}

impl RiskLevel {
    pub fn label(self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub player_id: u32,
    pub name: String,
    pub club: String,
    pub position: Position,
    pub price: f64,
    /// Whole points, never negative.
    pub expected_points: f64,
    pub points_per_million: f64,
    pub confidence: Confidence,
    pub risk: RiskLevel,
    /// Why the number came out the way it did, in the order the model applied it.
    pub factors: Vec<String>,
}

pub fn predict(profile: &PlayerProfile, fixture: &FixtureInfo) -> Prediction {
    let mut factors = Vec::with_capacity(8);
    let strength = clamp_unit(fixture.opponent_strength);

    let p_play = availability(profile);
    if p_play <= 0.0 {
        return Prediction {
            player_id: profile.player_id,
            name: profile.name.clone(),
            club: profile.club.clone(),
            position: profile.position,
            price: profile.price,
            expected_points: 0.0,
            points_per_million: 0.0,
            confidence: Confidence::High,
            risk: RiskLevel::High,
            factors: vec!["Unavailable (injured or suspended)".to_string()],
        };
    }
    factors.push(format!("Availability: {:.0}%", p_play * 100.0));

    let base = base_rate(profile, &mut factors);

    let fix_mod = fixture_modifier(fixture, profile.position);
    factors.push(format!("Fixture vs {}: x{fix_mod:.2}", fixture.opponent_club));

    let mut points = base * fix_mod;

    if profile.is_set_piece_taker {
        let bonus = SET_PIECE_BONUS * (1.0 + SET_PIECE_WEAK_OPP * (1.0 - strength));
        points += bonus;
        factors.push(format!("Set piece taker: +{bonus:.1}"));
    } else {
        factors.push("No set-piece duties".to_string());
    }

    let upside = upside_factor(profile.price);
    points *= upside;
    factors.push(format!("Upside (right-skewed scoring): x{upside:.2}"));

    let mut expected = points * p_play;
    if p_play < 1.0 {
        expected += (1.0 - p_play) * SUB_APPEARANCE_POINTS;
    }
    factors.push(format!("Scaled by availability: {expected:.1} pts"));

    let confidence = confidence_for(profile.matches_played, p_play);
    factors.push(format!(
        "Confidence {} ({} matches)",
        confidence.label(),
        profile.matches_played
    ));

    let risk = risk_for(profile, p_play);
    factors.push(format!("Risk {}", risk.label()));

    let (expected_points, points_per_million) = headline_numbers(expected, profile.price);

    Prediction {
        player_id: profile.player_id,
        name: profile.name.clone(),
        club: profile.club.clone(),
        position: profile.position,
        price: profile.price,
        expected_points,
        points_per_million,
        confidence,
        risk,
        factors,
    }
}

/// Predicts every profile that has a fixture. `fixture_for` returns `None` for
/// clubs without a match this round; those players are skipped.
pub fn predict_all<'a, F>(profiles: &[PlayerProfile], fixture_for: F) -> Vec<Prediction>
where
    F: Fn(&PlayerProfile) -> Option<&'a FixtureInfo> + Sync,
{
    let out: Vec<Prediction> = profiles
        .par_iter()
        .filter_map(|profile| fixture_for(profile).map(|fixture| predict(profile, fixture)))
        .collect();
    debug!(
        players = profiles.len(),
        predicted = out.len(),
        "roster predictions built"
    );
    out
}

/// Probability of a meaningful appearance.
pub fn availability(profile: &PlayerProfile) -> f64 {
    match profile.injury_status {
        InjuryStatus::Out => return 0.0,
        InjuryStatus::Doubt => return P_DOUBT,
        InjuryStatus::Fit => {}
    }
    if !profile.is_starter {
        return P_BENCH;
    }
    if profile.matches_played == 0 {
        return P_UNPROVEN_STARTER;
    }
    let mins = profile.avg_minutes_last5;
    if mins >= 80.0 {
        P_NINETY
    } else if mins >= 60.0 {
        P_REGULAR
    } else if mins >= 30.0 {
        P_ROTATION
    } else {
        P_FRINGE
    }
}

pub fn price_implied_points(price: f64) -> f64 {
    PRICE_INTERCEPT + PRICE_SLOPE * price.max(0.0)
}

fn base_rate(profile: &PlayerProfile, factors: &mut Vec<String>) -> f64 {
    let implied = price_implied_points(profile.price);
    let avg = finite_non_negative(profile.avg_points_last5);

    if profile.matches_played >= MIN_HISTORY_MATCHES && avg > 0.0 {
        let (w_avg, w_price) = if profile.matches_played >= ESTABLISHED_MATCHES {
            (BLEND_ESTABLISHED_AVG, BLEND_ESTABLISHED_PRICE)
        } else {
            (BLEND_EARLY_AVG, BLEND_EARLY_PRICE)
        };
        let base = w_avg * avg + w_price * implied;
        factors.push(format!(
            "Base {base:.1}: form {avg:.1} ({:.0}%) + price {implied:.1} ({:.0}%)",
            w_avg * 100.0,
            w_price * 100.0
        ));
        return base;
    }

    let floor = position_baseline(profile.position);
    let base = implied.max(floor);
    factors.push(format!(
        "Base {base:.1}: no usable form, price {implied:.1} / {} floor {floor:.1}",
        profile.position.code()
    ));
    base
}

/// Multiplier around 1.0: weak opponents push it up, strong ones down.
pub fn fixture_modifier(fixture: &FixtureInfo, position: Position) -> f64 {
    let s = clamp_unit(fixture.opponent_strength);
    let weakness = 1.0 - s;
    let mut m = 1.0 - (s - 0.5) * STRENGTH_SLOPE;
    if position.is_attacking() {
        m += weakness * ATTACK_WEAK_OPP;
    } else {
        m += weakness * CLEAN_SHEET_WEAK_OPP;
    }
    if fixture.is_home {
        m += HOME_BONUS;
    }
    if fixture.is_knockout {
        m *= KNOCKOUT_BOOST;
    }
    m.clamp(FIXTURE_MOD_MIN, FIXTURE_MOD_MAX)
}

fn upside_factor(price: f64) -> f64 {
    if price >= PREMIUM_PRICE {
        UPSIDE_FACTOR + PREMIUM_UPSIDE
    } else {
        UPSIDE_FACTOR
    }
}

fn confidence_for(matches: u32, p_play: f64) -> Confidence {
    if matches >= 5 && p_play > 0.8 {
        Confidence::High
    } else if matches >= 2 && p_play > 0.5 {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}

fn risk_for(profile: &PlayerProfile, p_play: f64) -> RiskLevel {
    if p_play < 0.5 || profile.injury_status == InjuryStatus::Doubt {
        RiskLevel::High
    } else if p_play < 0.8 || profile.matches_played < 3 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

// NaN strengths are treated as an average opponent.
fn clamp_unit(v: f64) -> f64 {
    if v.is_nan() { 0.5 } else { v.clamp(0.0, 1.0) }
}

fn finite_non_negative(v: f64) -> f64 {
    if v.is_finite() { v.max(0.0) } else { 0.0 }
}

/// Whole expected points (ties to even) and value per million, the latter
/// taken from the unrounded expectation.
fn headline_numbers(expected: f64, price: f64) -> (f64, f64) {
    let expected = finite_non_negative(expected);
    let ppm = round1(expected / finite_non_negative(price).max(MIN_PRICE));
    (expected.round_ties_even(), ppm)
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

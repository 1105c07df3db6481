use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::board::{Fixture, FixtureStatus};
use crate::difficulty::ClubStrengthTable;
use crate::predictor::InjuryStatus;
use crate::profile::{PlayerRecord, RecordedMatch, SeasonSummary};
use crate::scoring::{MatchStats, Position};

// Per-club squad shape: 3 GK, 8 DEF, 8 MID, 5 FWD.
const CLUB_SHAPE: [(Position, u32); 4] = [
    (Position::Goalkeeper, 3),
    (Position::Defender, 8),
    (Position::Midfielder, 8),
    (Position::Forward, 5),
];

pub struct SamplePool {
    pub records: Vec<PlayerRecord>,
    pub fixtures: Vec<Fixture>,
}

/// Deterministic roster for demos and benchmarks: `clubs` clubs taken from
/// the strength table, `matchdays` recorded rounds per player, and one
/// upcoming round pairing neighbouring clubs.
pub fn generate(seed: u64, clubs: usize, matchdays: u32, table: &ClubStrengthTable) -> SamplePool {
    let mut rng = StdRng::seed_from_u64(seed);
    let names: Vec<String> = table
        .clubs
        .iter()
        .take(clubs)
        .map(|c| c.club.clone())
        .collect();

    let mut records = Vec::new();
    let mut next_id = 1u32;
    for club in &names {
        let quality = table.normalized_strength(club);
        for (position, count) in CLUB_SHAPE {
            for slot in 0..count {
                let id = next_id;
                next_id += 1;
                let starter = slot < count / 2 + 1;
                let price = sample_price(&mut rng, position, quality, starter);
                let injury_status = match rng.gen_range(0..40) {
                    0 => InjuryStatus::Out,
                    1 | 2 => InjuryStatus::Doubt,
                    _ => InjuryStatus::Fit,
                };
                let matches = (1..=matchdays)
                    .map(|md| RecordedMatch {
                        matchday: md,
                        stats: sample_stats(&mut rng, id, position, quality, starter),
                    })
                    .collect();
                records.push(PlayerRecord {
                    player_id: id,
                    name: format!("{} {}{}", short_code(club), position.code(), slot + 1),
                    club: club.clone(),
                    club_code: Some(short_code(club)),
                    position,
                    price,
                    is_starter: starter,
                    is_set_piece_taker: starter && position.is_attacking() && slot == 0,
                    injury_status,
                    season: SeasonSummary::default(),
                    matches,
                });
            }
        }
    }

    let fixtures = names
        .chunks(2)
        .filter(|pair| pair.len() == 2)
        .map(|pair| Fixture {
            home_club: pair[0].clone(),
            away_club: pair[1].clone(),
            home_code: Some(short_code(&pair[0])),
            away_code: Some(short_code(&pair[1])),
            home_strength: None,
            away_strength: None,
            status: FixtureStatus::Scheduled,
            matchday: Some(matchdays + 1),
        })
        .collect();

    SamplePool { records, fixtures }
}

fn sample_price(rng: &mut StdRng, position: Position, quality: f64, starter: bool) -> f64 {
    let (lo, hi) = match position {
        Position::Goalkeeper => (4.0, 6.0),
        Position::Defender => (4.0, 7.0),
        Position::Midfielder => (4.5, 10.5),
        Position::Forward => (5.0, 11.0),
    };
    let mut price = lo + (hi - lo) * (0.6 * quality + 0.4 * rng.gen_range(0.0..1.0));
    if !starter {
        price = (price - 1.0).max(lo);
    }
    (price * 2.0).round() / 2.0
}

fn sample_stats(
    rng: &mut StdRng,
    player_id: u32,
    position: Position,
    quality: f64,
    starter: bool,
) -> MatchStats {
    let mut s = MatchStats::new(player_id, position);
    if !starter && rng.gen_bool(0.5) {
        return s;
    }
    s.minutes = if starter {
        rng.gen_range(60..=90)
    } else {
        rng.gen_range(5..=30)
    };
    let attack = match position {
        Position::Goalkeeper => 0.0,
        Position::Defender => 0.06,
        Position::Midfielder => 0.18,
        Position::Forward => 0.35,
    } * (0.6 + quality);
    if rng.gen_bool(attack.min(0.9)) {
        s.goals = 1;
        s.goals_outside_box = u32::from(rng.gen_bool(0.15));
    }
    if rng.gen_bool((attack * 0.8).min(0.9)) {
        s.assists = 1;
    }
    s.balls_recovered = rng.gen_range(0..8);
    s.yellow_card = rng.gen_bool(0.1);
    s.goals_conceded = rng.gen_range(0..=3);
    s.clean_sheet = s.goals_conceded == 0 && s.minutes >= 60;
    if position == Position::Goalkeeper {
        s.saves = rng.gen_range(0..7);
    }
    s
}

// "Bayern München" -> "BAYM", "Liverpool" -> "LIV".
fn short_code(club: &str) -> String {
    let mut words = club.split_whitespace();
    let mut code: String = words
        .next()
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .take(3)
        .collect();
    for w in words {
        if let Some(c) = w.chars().find(|c| c.is_ascii_alphabetic()) {
            code.push(c);
        }
    }
    code.to_ascii_uppercase()
}

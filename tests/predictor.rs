use fantasy_planner::predictor::{
    Confidence, FixtureInfo, InjuryStatus, PlayerProfile, RiskLevel, fixture_modifier, predict,
    predict_all,
};
use fantasy_planner::scoring::Position;

fn profile(id: u32, position: Position) -> PlayerProfile {
    PlayerProfile {
        player_id: id,
        name: format!("Player {id}"),
        club: "Home FC".to_string(),
        position,
        price: 7.5,
        avg_minutes_last5: 88.0,
        avg_points_last5: 6.0,
        total_goals: 3,
        total_assists: 2,
        total_clean_sheets: 1,
        matches_played: 6,
        is_starter: true,
        is_set_piece_taker: false,
        injury_status: InjuryStatus::Fit,
    }
}

fn fixture(strength: f64, is_home: bool, is_knockout: bool) -> FixtureInfo {
    FixtureInfo {
        opponent_club: "Away FC".to_string(),
        opponent_strength: strength,
        is_home,
        is_knockout,
    }
}

#[test]
fn ruled_out_players_score_zero_everywhere() {
    for position in Position::ALL {
        let mut p = profile(1, position);
        p.injury_status = InjuryStatus::Out;
        p.is_set_piece_taker = true;
        for strength in [0.0, 0.5, 1.0] {
            for is_home in [true, false] {
                let pred = predict(&p, &fixture(strength, is_home, true));
                assert_eq!(pred.expected_points, 0.0);
                assert_eq!(pred.points_per_million, 0.0);
                assert_eq!(pred.risk, RiskLevel::High);
                assert_eq!(pred.confidence, Confidence::High);
                assert_eq!(pred.factors.len(), 1);
            }
        }
    }
}

#[test]
fn predictions_stay_finite_on_degenerate_input() {
    let mut p = profile(2, Position::Forward);
    p.price = 0.0;
    p.avg_points_last5 = f64::NAN;
    for strength in [f64::NAN, -3.0, 0.0, 1.0, 7.0] {
        let pred = predict(&p, &fixture(strength, false, false));
        assert!(pred.expected_points.is_finite());
        assert!(pred.expected_points >= 0.0);
        assert!(pred.points_per_million.is_finite());
    }
}

#[test]
fn weaker_opponents_never_hurt() {
    for position in Position::ALL {
        let p = profile(3, position);
        let easy = predict(&p, &fixture(0.1, true, false));
        let hard = predict(&p, &fixture(0.9, true, false));
        assert!(
            easy.expected_points >= hard.expected_points,
            "{}: {} < {}",
            position.code(),
            easy.expected_points,
            hard.expected_points
        );
        assert!(fixture_modifier(&fixture(0.1, true, false), position)
            > fixture_modifier(&fixture(0.9, true, false), position));
    }
}

#[test]
fn home_and_knockout_lift_the_modifier() {
    let away = fixture_modifier(&fixture(0.5, false, false), Position::Midfielder);
    let home = fixture_modifier(&fixture(0.5, true, false), Position::Midfielder);
    let knockout = fixture_modifier(&fixture(0.5, true, true), Position::Midfielder);
    assert!(home > away);
    assert!(knockout > home);
    for strength in [0.0, 1.0] {
        let m = fixture_modifier(&fixture(strength, true, true), Position::Forward);
        assert!((0.5..=1.5).contains(&m));
    }
}

#[test]
fn explanation_trail_covers_each_step() {
    let mut p = profile(4, Position::Midfielder);
    p.is_set_piece_taker = true;
    let pred = predict(&p, &fixture(0.3, true, false));
    assert_eq!(pred.factors.len(), 8);
    assert!(pred.factors[0].starts_with("Availability"));
    assert!(pred.factors.iter().any(|f| f.starts_with("Fixture vs Away FC")));
    assert!(pred.factors.iter().any(|f| f.starts_with("Set piece taker")));
    assert_eq!(pred.expected_points, pred.expected_points.round());
}

#[test]
fn doubtful_players_are_high_risk() {
    let mut p = profile(5, Position::Defender);
    p.injury_status = InjuryStatus::parse("Doubtful");
    let pred = predict(&p, &fixture(0.5, true, false));
    assert_eq!(pred.risk, RiskLevel::High);
    assert!(pred.expected_points > 0.0);
}

#[test]
fn predict_all_skips_clubs_without_a_fixture() {
    let mut away = profile(6, Position::Forward);
    away.club = "Idle FC".to_string();
    let profiles = vec![profile(5, Position::Defender), away];
    let fx = fixture(0.5, true, false);
    let preds = predict_all(&profiles, |p| (p.club == "Home FC").then_some(&fx));
    assert_eq!(preds.len(), 1);
    assert_eq!(preds[0].player_id, 5);
}

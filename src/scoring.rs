use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Position {
    #[serde(rename = "GK")]
    Goalkeeper,
    #[serde(rename = "DEF")]
    Defender,
    #[serde(rename = "MID")]
    Midfielder,
    #[serde(rename = "FWD")]
    Forward,
}

impl Position {
    pub const ALL: [Position; 4] = [
        Position::Goalkeeper,
        Position::Defender,
        Position::Midfielder,
        Position::Forward,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Position::Goalkeeper => "GK",
            Position::Defender => "DEF",
            Position::Midfielder => "MID",
            Position::Forward => "FWD",
        }
    }

    pub fn is_attacking(self) -> bool {
        matches!(self, Position::Midfielder | Position::Forward)
    }

    /// Accepts short codes ("GK", "def") as well as the longer group titles
    /// feeds tend to use ("Goalkeepers", "Centre-back", "Striker").
    pub fn from_label(raw: &str) -> Option<Position> {
        let s = raw.trim().to_lowercase();
        match s.as_str() {
            "gk" | "g" => return Some(Position::Goalkeeper),
            "def" | "d" => return Some(Position::Defender),
            "mid" | "m" => return Some(Position::Midfielder),
            "fwd" | "f" | "att" => return Some(Position::Forward),
            _ => {}
        }
        if s.contains("keeper") {
            return Some(Position::Goalkeeper);
        }
        if s.contains("defender") || s.contains("back") {
            return Some(Position::Defender);
        }
        if s.contains("midfield") {
            return Some(Position::Midfielder);
        }
        if s.contains("forward") || s.contains("striker") || s.contains("attacker") || s.contains("wing") {
            return Some(Position::Forward);
        }
        None
    }
}

/// Raw counters for one player in one fixture. Callers clamp bad feed values
/// to zero before building this.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchStats {
    pub player_id: u32,
    pub position: Position,
    #[serde(default)]
    pub minutes: u32,
    #[serde(default)]
    pub goals: u32,
    #[serde(default)]
    pub goals_outside_box: u32,
    #[serde(default)]
    pub assists: u32,
    #[serde(default)]
    pub balls_recovered: u32,
    #[serde(default)]
    pub player_of_match: bool,
    #[serde(default)]
    pub penalty_won: u32,
    #[serde(default)]
    pub penalty_conceded: u32,
    #[serde(default)]
    pub penalty_missed: u32,
    #[serde(default)]
    pub penalty_saved: u32,
    #[serde(default)]
    pub yellow_card: bool,
    #[serde(default)]
    pub red_card: bool,
    #[serde(default)]
    pub own_goal: u32,
    #[serde(default)]
    pub saves: u32,
    #[serde(default)]
    pub goals_conceded: u32,
    #[serde(default)]
    pub clean_sheet: bool,
}

impl MatchStats {
    pub fn new(player_id: u32, position: Position) -> Self {
        Self {
            player_id,
            position,
            minutes: 0,
            goals: 0,
            goals_outside_box: 0,
            assists: 0,
            balls_recovered: 0,
            player_of_match: false,
            penalty_won: 0,
            penalty_conceded: 0,
            penalty_missed: 0,
            penalty_saved: 0,
            yellow_card: false,
            red_card: false,
            own_goal: 0,
            saves: 0,
            goals_conceded: 0,
            clean_sheet: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionWeights {
    pub goalkeeper: i32,
    pub defender: i32,
    pub midfielder: i32,
    pub forward: i32,
}

impl PositionWeights {
    pub fn get(&self, position: Position) -> i32 {
        match position {
            Position::Goalkeeper => self.goalkeeper,
            Position::Defender => self.defender,
            Position::Midfielder => self.midfielder,
            Position::Forward => self.forward,
        }
    }
}

/// Point values of the rulebook. `Default` is the Champions League fantasy
/// ruleset; tests and alternative competitions inject their own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringRules {
    pub appearance: i32,
    pub sixty_minutes: i32,
    pub goal: PositionWeights,
    pub goal_outside_box: i32,
    pub assist: i32,
    pub recoveries_per_point: u32,
    pub player_of_match: i32,
    pub penalty_won: i32,
    pub penalty_conceded: i32,
    pub penalty_missed: i32,
    pub penalty_saved: i32,
    pub yellow_card: i32,
    pub red_card: i32,
    pub own_goal: i32,
    pub clean_sheet: PositionWeights,
    pub conceded_per_penalty: u32,
    pub saves_per_point: u32,
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            appearance: 1,
            sixty_minutes: 1,
            goal: PositionWeights {
                goalkeeper: 6,
                defender: 6,
                midfielder: 5,
                forward: 4,
            },
            goal_outside_box: 1,
            assist: 3,
            recoveries_per_point: 3,
            player_of_match: 3,
            penalty_won: 2,
            penalty_conceded: -1,
            penalty_missed: -2,
            penalty_saved: 5,
            yellow_card: -1,
            red_card: -3,
            own_goal: -2,
            clean_sheet: PositionWeights {
                goalkeeper: 4,
                defender: 4,
                midfielder: 1,
                forward: 0,
            },
            conceded_per_penalty: 2,
            saves_per_point: 3,
        }
    }
}

impl ScoringRules {
    pub fn score(&self, stats: &MatchStats) -> i32 {
        let pos = stats.position;
        let keeper = pos == Position::Goalkeeper;
        let back_line = matches!(pos, Position::Goalkeeper | Position::Defender);
        let mut pts = Tally::default();

        if stats.minutes > 0 {
            pts.add(self.appearance);
        }
        if stats.minutes >= 60 {
            pts.add(self.sixty_minutes);
        }

        pts.add_each(stats.goals, self.goal.get(pos));
        pts.add_each(stats.goals_outside_box, self.goal_outside_box);
        pts.add_each(stats.assists, self.assist);
        pts.add(per_bucket(stats.balls_recovered, self.recoveries_per_point));

        if stats.player_of_match {
            pts.add(self.player_of_match);
        }

        pts.add_each(stats.penalty_won, self.penalty_won);
        pts.add_each(stats.penalty_conceded, self.penalty_conceded);
        pts.add_each(stats.penalty_missed, self.penalty_missed);

        // A second yellow shows up as a red; only the red counts.
        if stats.red_card {
            pts.add(self.red_card);
        } else if stats.yellow_card {
            pts.add(self.yellow_card);
        }

        pts.add_each(stats.own_goal, self.own_goal);

        if stats.clean_sheet {
            pts.add(self.clean_sheet.get(pos));
        }
        if back_line {
            pts.add(per_bucket(stats.goals_conceded, self.conceded_per_penalty).saturating_neg());
        }
        if keeper {
            pts.add_each(stats.penalty_saved, self.penalty_saved);
            pts.add(per_bucket(stats.saves, self.saves_per_point));
        }

        pts.0
    }
}

// Saturating running total, so absurd counters clamp instead of overflowing.
#[derive(Default)]
struct Tally(i32);

impl Tally {
    fn add(&mut self, pts: i32) {
        self.0 = self.0.saturating_add(pts);
    }

    fn add_each(&mut self, n: u32, weight: i32) {
        self.add(count(n).saturating_mul(weight));
    }
}

/// Scores one match under the default rulebook.
pub fn score(stats: &MatchStats) -> i32 {
    ScoringRules::default().score(stats)
}

fn count(n: u32) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

fn per_bucket(n: u32, size: u32) -> i32 {
    if size == 0 {
        return 0;
    }
    count(n / size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn huge_counters_saturate() {
        let mut s = MatchStats::new(1, Position::Goalkeeper);
        s.minutes = u32::MAX;
        s.goals = u32::MAX;
        s.assists = u32::MAX;
        s.saves = u32::MAX;
        assert_eq!(score(&s), i32::MAX);

        let mut s = MatchStats::new(2, Position::Defender);
        s.own_goal = u32::MAX;
        s.penalty_missed = u32::MAX;
        s.goals_conceded = u32::MAX;
        assert_eq!(score(&s), i32::MIN);
    }

    #[test]
    fn position_labels_map_to_groups() {
        assert_eq!(Position::from_label("GK"), Some(Position::Goalkeeper));
        assert_eq!(Position::from_label("Centre-back"), Some(Position::Defender));
        assert_eq!(Position::from_label("Midfielders"), Some(Position::Midfielder));
        assert_eq!(Position::from_label("striker"), Some(Position::Forward));
        assert_eq!(Position::from_label("coach"), None);
    }

    #[test]
    fn red_card_replaces_yellow() {
        let mut stats = MatchStats::new(1, Position::Midfielder);
        stats.minutes = 70;
        stats.yellow_card = true;
        stats.red_card = true;
        assert_eq!(score(&stats), 1 + 1 - 3);
    }

    #[test]
    fn zero_bucket_size_disables_rule() {
        let rules = ScoringRules {
            saves_per_point: 0,
            ..ScoringRules::default()
        };
        let mut stats = MatchStats::new(1, Position::Goalkeeper);
        stats.saves = 9;
        assert_eq!(rules.score(&stats), 0);
    }
}

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Full-time or half-time result from the home side's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchOutcome {
    #[serde(rename = "H")]
    Home,
    #[serde(rename = "D")]
    Draw,
    #[serde(rename = "A")]
    Away,
}

impl MatchOutcome {
    pub fn from_goals(home_goals: u16, away_goals: u16) -> Self {
        if home_goals > away_goals {
            MatchOutcome::Home
        } else if home_goals < away_goals {
            MatchOutcome::Away
        } else {
            MatchOutcome::Draw
        }
    }

    pub fn from_code(raw: &str) -> Option<Self> {
        match raw.trim() {
            "H" | "h" => Some(MatchOutcome::Home),
            "D" | "d" => Some(MatchOutcome::Draw),
            "A" | "a" => Some(MatchOutcome::Away),
            _ => None,
        }
    }

    pub fn code(self) -> char {
        match self {
            MatchOutcome::Home => 'H',
            MatchOutcome::Draw => 'D',
            MatchOutcome::Away => 'A',
        }
    }
}

/// A result seen from one team's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TeamResult {
    #[serde(rename = "W")]
    Win,
    #[serde(rename = "D")]
    Draw,
    #[serde(rename = "L")]
    Loss,
}

impl TeamResult {
    pub fn from_perspective(outcome: MatchOutcome, is_home: bool) -> Self {
        match (outcome, is_home) {
            (MatchOutcome::Draw, _) => TeamResult::Draw,
            (MatchOutcome::Home, true) | (MatchOutcome::Away, false) => TeamResult::Win,
            _ => TeamResult::Loss,
        }
    }

    pub fn letter(self) -> char {
        match self {
            TeamResult::Win => 'W',
            TeamResult::Draw => 'D',
            TeamResult::Loss => 'L',
        }
    }

    pub fn points(self) -> u32 {
        match self {
            TeamResult::Win => 3,
            TeamResult::Draw => 1,
            TeamResult::Loss => 0,
        }
    }
}

/// League points for one side of a fixture: 3 for a win, 1 for a draw.
pub fn points_for(scored: u16, conceded: u16) -> u8 {
    if scored > conceded {
        3
    } else if scored == conceded {
        1
    } else {
        0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct League {
    pub league_id: u32,
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Team {
    pub team_id: u32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Referee {
    pub referee_id: u32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Season {
    pub season_id: u32,
    pub label: String,
    pub league_id: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Match {
    pub match_id: u32,
    pub season_id: u32,
    pub match_date: NaiveDate,
    pub kickoff_time: Option<NaiveTime>,
    pub home_team_id: u32,
    pub away_team_id: u32,
    pub referee_id: u32,
    pub ft_home_goals: u16,
    pub ft_away_goals: u16,
    pub ft_result: MatchOutcome,
    pub ht_home_goals: u16,
    pub ht_away_goals: u16,
    pub ht_result: MatchOutcome,
}

/// One side of a fixture. Every match has exactly two, mirrored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TeamMatchStat {
    pub stat_id: u32,
    pub match_id: u32,
    pub team_id: u32,
    pub opponent_id: u32,
    pub is_home: bool,
    pub goals_scored: u16,
    pub goals_conceded: u16,
    pub shots: u16,
    pub shots_on_target: u16,
    pub fouls: u16,
    pub corners: u16,
    pub yellow_cards: u16,
    pub red_cards: u16,
    pub points: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PointsAdjustment {
    pub adjustment_id: u32,
    pub team_id: u32,
    pub season_id: u32,
    pub adjustment: i32,
    pub reason: String,
}

/// Match joined with team, referee and season names. This is the collection
/// the aggregation engine works on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRow {
    pub match_id: u32,
    pub season: String,
    pub date: NaiveDate,
    pub kickoff_time: Option<NaiveTime>,
    pub home_team: String,
    pub away_team: String,
    pub referee: String,
    pub ft_home_goals: u16,
    pub ft_away_goals: u16,
    pub ft_result: MatchOutcome,
    pub ht_home_goals: u16,
    pub ht_away_goals: u16,
    pub ht_result: MatchOutcome,
    pub home_shots: u16,
    pub away_shots: u16,
    pub home_shots_on_target: u16,
    pub away_shots_on_target: u16,
}

impl MatchRow {
    pub fn involves(&self, team: &str) -> bool {
        self.home_team == team || self.away_team == team
    }

    pub fn is_between(&self, team_a: &str, team_b: &str) -> bool {
        (self.home_team == team_a && self.away_team == team_b)
            || (self.home_team == team_b && self.away_team == team_a)
    }

    pub fn opponent_of(&self, team: &str) -> Option<&str> {
        if self.home_team == team {
            Some(self.away_team.as_str())
        } else if self.away_team == team {
            Some(self.home_team.as_str())
        } else {
            None
        }
    }

    /// Newest first: date, then kickoff, then id.
    pub fn recency_cmp(&self, other: &Self) -> std::cmp::Ordering {
        other
            .date
            .cmp(&self.date)
            .then_with(|| other.kickoff_time.cmp(&self.kickoff_time))
            .then_with(|| other.match_id.cmp(&self.match_id))
    }
}

/// Row of the unpivoted per-team-per-match fact table, with names resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamMatchRow {
    pub stat_id: u32,
    pub match_id: u32,
    pub team: String,
    pub opponent: String,
    pub is_home: bool,
    pub date: NaiveDate,
    pub season: String,
    pub goals_scored: u16,
    pub goals_conceded: u16,
    pub shots: u16,
    pub shots_on_target: u16,
    pub fouls: u16,
    pub corners: u16,
    pub yellow_cards: u16,
    pub red_cards: u16,
    pub points: u8,
}

/// One line of the persisted standings view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandingRow {
    pub position: u32,
    pub season: String,
    pub team: String,
    pub played: u32,
    pub won: u32,
    pub drawn: u32,
    pub lost: u32,
    pub goals_for: u32,
    pub goals_against: u32,
    pub goal_difference: i32,
    pub points: i32,
    pub points_adjustment: i32,
}

//! Pure statistics over a match collection.
//!
//! Nothing in here touches storage. Every function reads its slice of
//! [`MatchRow`]s and returns owned results, so callers may share one
//! collection across threads freely.

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use chrono::NaiveDate;
use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};
use crate::model::{MatchOutcome, MatchRow, TeamResult};

const RATE_DECIMALS: i32 = 3;
const PER_GAME_DECIMALS: i32 = 2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VenueRecord {
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
}

impl VenueRecord {
    fn record(&mut self, result: TeamResult) {
        match result {
            TeamResult::Win => self.wins += 1,
            TeamResult::Draw => self.draws += 1,
            TeamResult::Loss => self.losses += 1,
        }
    }

    pub fn played(&self) -> u32 {
        self.wins + self.draws + self.losses
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamStats {
    pub team: String,
    pub matches_played: u32,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub goals_scored: u32,
    pub goals_conceded: u32,
    pub goal_difference: i32,
    pub points: u32,
    pub win_rate: f64,
    pub points_per_game: f64,
    pub goals_per_game: f64,
    pub clean_sheets: u32,
    pub shots: u32,
    pub shots_on_target: u32,
    pub home_record: VenueRecord,
    pub away_record: VenueRecord,
}

impl TeamStats {
    pub fn metric_value(&self, metric: Metric) -> f64 {
        match metric {
            Metric::MatchesPlayed => f64::from(self.matches_played),
            Metric::Wins => f64::from(self.wins),
            Metric::Draws => f64::from(self.draws),
            Metric::Losses => f64::from(self.losses),
            Metric::GoalsScored => f64::from(self.goals_scored),
            Metric::GoalsConceded => f64::from(self.goals_conceded),
            Metric::GoalDifference => f64::from(self.goal_difference),
            Metric::Points => f64::from(self.points),
            Metric::WinRate => self.win_rate,
            Metric::PointsPerGame => self.points_per_game,
            Metric::GoalsPerGame => self.goals_per_game,
            Metric::CleanSheets => f64::from(self.clean_sheets),
            Metric::Shots => f64::from(self.shots),
            Metric::ShotsOnTarget => f64::from(self.shots_on_target),
        }
    }
}

/// Numeric fields of [`TeamStats`] that rankings can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    MatchesPlayed,
    Wins,
    Draws,
    Losses,
    GoalsScored,
    GoalsConceded,
    GoalDifference,
    Points,
    WinRate,
    PointsPerGame,
    GoalsPerGame,
    CleanSheets,
    Shots,
    ShotsOnTarget,
}

impl Metric {
    pub const ALL: [Metric; 14] = [
        Metric::MatchesPlayed,
        Metric::Wins,
        Metric::Draws,
        Metric::Losses,
        Metric::GoalsScored,
        Metric::GoalsConceded,
        Metric::GoalDifference,
        Metric::Points,
        Metric::WinRate,
        Metric::PointsPerGame,
        Metric::GoalsPerGame,
        Metric::CleanSheets,
        Metric::Shots,
        Metric::ShotsOnTarget,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Metric::MatchesPlayed => "matches_played",
            Metric::Wins => "wins",
            Metric::Draws => "draws",
            Metric::Losses => "losses",
            Metric::GoalsScored => "goals_scored",
            Metric::GoalsConceded => "goals_conceded",
            Metric::GoalDifference => "goal_difference",
            Metric::Points => "points",
            Metric::WinRate => "win_rate",
            Metric::PointsPerGame => "points_per_game",
            Metric::GoalsPerGame => "goals_per_game",
            Metric::CleanSheets => "clean_sheets",
            Metric::Shots => "shots",
            Metric::ShotsOnTarget => "shots_on_target",
        }
    }
}

impl FromStr for Metric {
    type Err = LedgerError;

    fn from_str(raw: &str) -> Result<Self> {
        let key = raw.trim();
        Metric::ALL
            .iter()
            .copied()
            .find(|m| m.name().eq_ignore_ascii_case(key))
            .ok_or_else(|| LedgerError::InvalidMetric(raw.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Venue {
    #[serde(rename = "H")]
    Home,
    #[serde(rename = "A")]
    Away,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormEntry {
    pub opponent: String,
    pub result: TeamResult,
    pub score: String,
    pub venue: Venue,
    pub date: NaiveDate,
    pub running_points: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormRecord {
    pub team: String,
    pub form_string: String,
    pub form_points: u32,
    pub recent_results: Vec<FormEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeagueTableEntry {
    pub position: u32,
    #[serde(flatten)]
    pub stats: TeamStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopPerformer {
    pub rank: u32,
    pub metric: Metric,
    pub value: f64,
    #[serde(flatten)]
    pub stats: TeamStats,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadToHeadRecord {
    pub team_a: String,
    pub team_b: String,
    pub total_matches: u32,
    pub team_a_wins: u32,
    pub team_b_wins: u32,
    pub draws: u32,
    pub team_a_goals: u32,
    pub team_b_goals: u32,
}

pub fn compute_team_stats(matches: &[MatchRow], team: &str) -> TeamStats {
    let mut home_record = VenueRecord::default();
    let mut away_record = VenueRecord::default();
    let mut goals_scored = 0u32;
    let mut goals_conceded = 0u32;
    let mut clean_sheets = 0u32;
    let mut shots = 0u32;
    let mut shots_on_target = 0u32;

    for m in matches {
        let is_home = if m.home_team == team {
            true
        } else if m.away_team == team {
            false
        } else {
            continue;
        };

        let (scored, conceded, team_shots, team_sot) = if is_home {
            (m.ft_home_goals, m.ft_away_goals, m.home_shots, m.home_shots_on_target)
        } else {
            (m.ft_away_goals, m.ft_home_goals, m.away_shots, m.away_shots_on_target)
        };

        let result = TeamResult::from_perspective(m.ft_result, is_home);
        if is_home {
            home_record.record(result);
        } else {
            away_record.record(result);
        }

        goals_scored += u32::from(scored);
        goals_conceded += u32::from(conceded);
        shots += u32::from(team_shots);
        shots_on_target += u32::from(team_sot);
        if conceded == 0 {
            clean_sheets += 1;
        }
    }

    let wins = home_record.wins + away_record.wins;
    let draws = home_record.draws + away_record.draws;
    let losses = home_record.losses + away_record.losses;
    let matches_played = home_record.played() + away_record.played();
    let points = wins * 3 + draws;

    TeamStats {
        team: team.to_string(),
        matches_played,
        wins,
        draws,
        losses,
        goals_scored,
        goals_conceded,
        goal_difference: goals_scored as i32 - goals_conceded as i32,
        points,
        win_rate: ratio(wins, matches_played, RATE_DECIMALS),
        points_per_game: ratio(points, matches_played, PER_GAME_DECIMALS),
        goals_per_game: ratio(goals_scored, matches_played, PER_GAME_DECIMALS),
        clean_sheets,
        shots,
        shots_on_target,
        home_record,
        away_record,
    }
}

/// Most recent `last_n` results for `team`, newest first.
///
/// The input does not need to be pre-sorted or pre-filtered: fixtures not
/// involving `team` are skipped and the rest are ordered by date, kickoff
/// and id, newest first, before the window is taken.
pub fn compute_team_form(matches: &[MatchRow], team: &str, last_n: usize) -> FormRecord {
    let mut team_matches: Vec<&MatchRow> = matches.iter().filter(|m| m.involves(team)).collect();
    team_matches.sort_by(|a, b| a.recency_cmp(b));
    team_matches.truncate(last_n);

    let mut record = FormRecord {
        team: team.to_string(),
        ..FormRecord::default()
    };

    for m in team_matches {
        let is_home = m.home_team == team;
        let (opponent, team_goals, opp_goals) = if is_home {
            (&m.away_team, m.ft_home_goals, m.ft_away_goals)
        } else {
            (&m.home_team, m.ft_away_goals, m.ft_home_goals)
        };
        let result = TeamResult::from_perspective(m.ft_result, is_home);

        record.form_string.push(result.letter());
        record.form_points += result.points();
        record.recent_results.push(FormEntry {
            opponent: opponent.clone(),
            result,
            score: format!("{team_goals}-{opp_goals}"),
            venue: if is_home { Venue::Home } else { Venue::Away },
            date: m.date,
            running_points: record.form_points,
        });
    }

    record
}

/// Standings from match results alone. Points adjustments are not applied;
/// use the store's adjusted standings when they matter.
pub fn compute_league_table(matches: &[MatchRow]) -> Vec<LeagueTableEntry> {
    let mut stats: Vec<TeamStats> = distinct_teams(matches)
        .iter()
        .map(|team| compute_team_stats(matches, team))
        .collect();

    stats.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then_with(|| b.goal_difference.cmp(&a.goal_difference))
            .then_with(|| b.goals_scored.cmp(&a.goals_scored))
    });

    let table: Vec<LeagueTableEntry> = stats
        .into_iter()
        .enumerate()
        .map(|(idx, stats)| LeagueTableEntry {
            position: idx as u32 + 1,
            stats,
        })
        .collect();

    info!("Generated league table with {} teams", table.len());
    table
}

pub fn compute_top_performers(
    matches: &[MatchRow],
    metric: &str,
    n: usize,
) -> Result<Vec<TopPerformer>> {
    let metric = metric.parse::<Metric>()?;

    let mut stats: Vec<(f64, TeamStats)> = distinct_teams(matches)
        .iter()
        .map(|team| {
            let s = compute_team_stats(matches, team);
            (s.metric_value(metric), s)
        })
        .collect();

    // Ties keep the alphabetical order of `distinct_teams`.
    stats.sort_by(|a, b| b.0.total_cmp(&a.0));

    let top: Vec<TopPerformer> = stats
        .into_iter()
        .take(n)
        .enumerate()
        .map(|(idx, (value, stats))| TopPerformer {
            rank: idx as u32 + 1,
            metric,
            value,
            stats,
        })
        .collect();

    info!("Generated top {} by {}", n, metric.name());
    Ok(top)
}

/// Stats for each named team, each computed over the whole collection.
pub fn compare_teams<S: AsRef<str>>(
    matches: &[MatchRow],
    teams: &[S],
) -> BTreeMap<String, TeamStats> {
    let comparison: BTreeMap<String, TeamStats> = teams
        .iter()
        .map(|t| (t.as_ref().to_string(), compute_team_stats(matches, t.as_ref())))
        .collect();
    info!("Compared {} teams", teams.len());
    comparison
}

/// Head-to-head record over fixtures between `team_a` and `team_b`.
///
/// `matches` must contain only fixtures between the two teams; anything else
/// is rejected with [`LedgerError::PreconditionViolated`] rather than being
/// counted. An empty slice gives an all-zero record.
pub fn compute_head_to_head(
    matches: &[MatchRow],
    team_a: &str,
    team_b: &str,
) -> Result<HeadToHeadRecord> {
    let mut record = HeadToHeadRecord {
        team_a: team_a.to_string(),
        team_b: team_b.to_string(),
        ..HeadToHeadRecord::default()
    };

    for m in matches {
        if !m.is_between(team_a, team_b) {
            return Err(LedgerError::PreconditionViolated(format!(
                "head-to-head input contains {} vs {} (match {}), expected only {team_a} vs {team_b}",
                m.home_team, m.away_team, m.match_id
            )));
        }

        let a_is_home = m.home_team == team_a;
        let (a_goals, b_goals) = if a_is_home {
            (m.ft_home_goals, m.ft_away_goals)
        } else {
            (m.ft_away_goals, m.ft_home_goals)
        };
        record.team_a_goals += u32::from(a_goals);
        record.team_b_goals += u32::from(b_goals);

        match (m.ft_result, a_is_home) {
            (MatchOutcome::Draw, _) => record.draws += 1,
            (MatchOutcome::Home, true) | (MatchOutcome::Away, false) => record.team_a_wins += 1,
            _ => record.team_b_wins += 1,
        }
        record.total_matches += 1;
    }

    Ok(record)
}

/// Every team appearing in the collection, sorted by name.
pub fn distinct_teams(matches: &[MatchRow]) -> Vec<String> {
    let teams: BTreeSet<&str> = matches
        .iter()
        .flat_map(|m| [m.home_team.as_str(), m.away_team.as_str()])
        .collect();
    teams.into_iter().map(str::to_string).collect()
}

fn ratio(numerator: u32, denominator: u32, decimals: i32) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    round_to(f64::from(numerator) / f64::from(denominator), decimals)
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

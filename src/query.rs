//! Query descriptors as handed over by the intent parser.
//!
//! The parser emits a loose JSON mapping ([`RawQueryDescriptor`]). It is
//! checked once here and turned into a [`Query`] whose variants carry only
//! what each query type needs, so nothing downstream re-validates.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::aggregation::Metric;
use crate::error::{LedgerError, Result};

const DEFAULT_LAST_N: usize = 5;
const DEFAULT_TOP_N: usize = 10;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawQueryDescriptor {
    pub query_type: String,
    #[serde(default)]
    pub teams: Vec<String>,
    #[serde(default)]
    pub opponent: Option<String>,
    #[serde(default)]
    pub season: Option<String>,
    #[serde(default)]
    pub date_range: Option<RawDateRange>,
    #[serde(default)]
    pub metrics: Vec<String>,
    #[serde(default)]
    pub visualization_hint: Option<String>,
    #[serde(default)]
    pub filters: Option<RawFilters>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawDateRange {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub n_games: Option<usize>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawFilters {
    #[serde(default)]
    pub top_n: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeasonSelector {
    All,
    Season(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DateRange {
    FullSeason,
    LastNGames {
        n_games: usize,
    },
    Custom {
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Scope {
    pub season: SeasonSelector,
    pub date_range: DateRange,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RankingKind {
    Table,
    TopPerformers { metric: Metric, top_n: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "query_type", rename_all = "snake_case")]
pub enum Query {
    SingleTeam {
        team: String,
        scope: Scope,
        metrics: Vec<String>,
    },
    Comparison {
        teams: Vec<String>,
        scope: Scope,
        metrics: Vec<String>,
    },
    HeadToHead {
        team: String,
        opponent: String,
        scope: Scope,
    },
    Ranking {
        ranking: RankingKind,
        scope: Scope,
    },
    Trend {
        team: String,
        scope: Scope,
    },
}

impl Query {
    pub fn scope(&self) -> &Scope {
        match self {
            Query::SingleTeam { scope, .. }
            | Query::Comparison { scope, .. }
            | Query::HeadToHead { scope, .. }
            | Query::Ranking { scope, .. }
            | Query::Trend { scope, .. } => scope,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Query::SingleTeam { .. } => "single_team",
            Query::Comparison { .. } => "comparison",
            Query::HeadToHead { .. } => "head_to_head",
            Query::Ranking { .. } => "ranking",
            Query::Trend { .. } => "trend",
        }
    }

    /// Teams the fetch stage should narrow to. Empty means every team.
    pub fn focus_teams(&self) -> Vec<&str> {
        match self {
            Query::SingleTeam { team, .. } | Query::Trend { team, .. } => vec![team.as_str()],
            Query::Comparison { teams, .. } => teams.iter().map(String::as_str).collect(),
            Query::HeadToHead { team, opponent, .. } => vec![team.as_str(), opponent.as_str()],
            Query::Ranking { .. } => Vec::new(),
        }
    }
}

/// A validated query plus the presentation hint, which the core ignores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryRequest {
    pub query: Query,
    pub visualization_hint: Option<String>,
}

impl QueryRequest {
    pub fn from_json(raw: &str) -> Result<Self> {
        let descriptor: RawQueryDescriptor = serde_json::from_str(raw.trim())
            .map_err(|err| LedgerError::InvalidQuery(format!("malformed descriptor: {err}")))?;
        Self::try_from(descriptor)
    }
}

impl TryFrom<RawQueryDescriptor> for QueryRequest {
    type Error = LedgerError;

    fn try_from(raw: RawQueryDescriptor) -> Result<Self> {
        let scope = Scope {
            season: parse_season(raw.season.as_deref())?,
            date_range: parse_date_range(raw.date_range.as_ref())?,
        };
        let teams = clean_names(&raw.teams)?;

        let query = match raw.query_type.trim() {
            "single_team" => Query::SingleTeam {
                team: first_team(&teams, "single_team")?,
                scope,
                metrics: raw.metrics,
            },
            "trend" => Query::Trend {
                team: first_team(&teams, "trend")?,
                scope,
            },
            "comparison" => {
                let mut distinct: Vec<String> = Vec::new();
                for t in teams {
                    if !distinct.contains(&t) {
                        distinct.push(t);
                    }
                }
                if distinct.len() < 2 {
                    return Err(LedgerError::InvalidQuery(
                        "comparison needs at least two distinct teams".to_string(),
                    ));
                }
                Query::Comparison {
                    teams: distinct,
                    scope,
                    metrics: raw.metrics,
                }
            }
            "head_to_head" => {
                let team = first_team(&teams, "head_to_head")?;
                let opponent = raw
                    .opponent
                    .as_deref()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .or_else(|| teams.get(1).cloned())
                    .ok_or_else(|| {
                        LedgerError::InvalidQuery("head_to_head needs an opponent".to_string())
                    })?;
                if opponent == team {
                    return Err(LedgerError::InvalidQuery(format!(
                        "head_to_head needs two different teams, got {team} twice"
                    )));
                }
                Query::HeadToHead {
                    team,
                    opponent,
                    scope,
                }
            }
            "ranking" => {
                let wants_table = raw.metrics.is_empty()
                    || raw
                        .metrics
                        .iter()
                        .any(|m| {
                            let m = m.trim();
                            m.eq_ignore_ascii_case("points") || m.eq_ignore_ascii_case("table")
                        });
                let ranking = if wants_table {
                    RankingKind::Table
                } else {
                    let top_n = raw
                        .filters
                        .as_ref()
                        .and_then(|f| f.top_n)
                        .unwrap_or(DEFAULT_TOP_N);
                    if top_n == 0 {
                        return Err(LedgerError::InvalidQuery("top_n must be positive".to_string()));
                    }
                    RankingKind::TopPerformers {
                        metric: raw.metrics[0].parse::<Metric>()?,
                        top_n,
                    }
                };
                Query::Ranking { ranking, scope }
            }
            other => {
                return Err(LedgerError::InvalidQuery(format!("unknown query_type {other:?}")));
            }
        };

        Ok(QueryRequest {
            query,
            visualization_hint: raw.visualization_hint,
        })
    }
}

fn clean_names(raw: &[String]) -> Result<Vec<String>> {
    raw.iter()
        .map(|t| {
            let t = t.trim();
            if t.is_empty() {
                Err(LedgerError::InvalidQuery("blank team name".to_string()))
            } else {
                Ok(t.to_string())
            }
        })
        .collect()
}

fn first_team(teams: &[String], query_type: &str) -> Result<String> {
    teams
        .first()
        .cloned()
        .ok_or_else(|| LedgerError::InvalidQuery(format!("{query_type} needs a team")))
}

fn parse_season(raw: Option<&str>) -> Result<SeasonSelector> {
    match raw.map(str::trim) {
        None | Some("") => Err(LedgerError::InvalidQuery("season is required".to_string())),
        Some(s) if s.eq_ignore_ascii_case("all") => Ok(SeasonSelector::All),
        Some(s) => Ok(SeasonSelector::Season(s.to_string())),
    }
}

fn parse_date_range(raw: Option<&RawDateRange>) -> Result<DateRange> {
    let Some(raw) = raw else {
        return Ok(DateRange::FullSeason);
    };
    match raw.kind.as_deref().map(str::trim).unwrap_or("full_season") {
        "full_season" => Ok(DateRange::FullSeason),
        "last_n_games" => {
            let n_games = raw.n_games.unwrap_or(DEFAULT_LAST_N);
            if n_games == 0 {
                return Err(LedgerError::InvalidQuery("n_games must be positive".to_string()));
            }
            Ok(DateRange::LastNGames { n_games })
        }
        "custom" => {
            let start = parse_iso_date(raw.start_date.as_deref())?;
            let end = parse_iso_date(raw.end_date.as_deref())?;
            if start.is_none() && end.is_none() {
                return Err(LedgerError::InvalidQuery(
                    "custom date range needs a start or end date".to_string(),
                ));
            }
            if let (Some(s), Some(e)) = (start, end)
                && s > e
            {
                return Err(LedgerError::InvalidQuery(format!(
                    "date range starts after it ends ({s} > {e})"
                )));
            }
            Ok(DateRange::Custom { start, end })
        }
        other => Err(LedgerError::InvalidQuery(format!("unknown date range type {other:?}"))),
    }
}

fn parse_iso_date(raw: Option<&str>) -> Result<Option<NaiveDate>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| LedgerError::InvalidQuery(format!("bad date {s:?}, expected YYYY-MM-DD"))),
    }
}

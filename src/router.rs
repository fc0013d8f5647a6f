//! Query → ledger fetch → aggregation.
//!
//! [`fetch`] narrows the ledger to the fixtures a query is about, already
//! ordered newest first and, for head-to-head queries, restricted to the two
//! sides; those are exactly the preconditions [`analyze`] relies on.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use log::info;
use serde::Serialize;

use crate::aggregation::{
    FormRecord, HeadToHeadRecord, LeagueTableEntry, TeamStats, TopPerformer, compare_teams,
    compute_head_to_head, compute_league_table, compute_team_form, compute_team_stats,
    compute_top_performers,
};
use crate::error::Result;
use crate::filters::{
    filter_by_date_range, filter_by_opponent, filter_by_teams, last_n_matches, sort_newest_first,
};
use crate::model::MatchRow;
use crate::query::{DateRange, Query, QueryRequest, RankingKind, SeasonSelector};
use crate::store::LedgerStore;

const SINGLE_TEAM_FORM: usize = 5;
const TREND_FORM: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FetchMetadata {
    pub total_matches: usize,
    pub seasons: Vec<String>,
    pub teams: Vec<String>,
    pub earliest: Option<NaiveDate>,
    pub latest: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchedMatches {
    pub matches: Vec<MatchRow>,
    pub metadata: FetchMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result_type", rename_all = "snake_case")]
pub enum Analysis {
    SingleTeam {
        team_stats: TeamStats,
        form: FormRecord,
    },
    Comparison {
        comparison: BTreeMap<String, TeamStats>,
    },
    HeadToHead {
        head_to_head: HeadToHeadRecord,
    },
    LeagueTable {
        league_table: Vec<LeagueTableEntry>,
    },
    TopPerformers {
        top_performers: Vec<TopPerformer>,
    },
    Trend {
        team_stats: TeamStats,
        form: FormRecord,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryOutcome {
    pub query_type: &'static str,
    pub visualization_hint: Option<String>,
    pub metadata: FetchMetadata,
    pub analysis: Analysis,
}

/// Runs a validated request end to end against the ledger.
pub fn answer(store: &LedgerStore, request: &QueryRequest) -> Result<QueryOutcome> {
    let fetched = fetch(store, &request.query)?;
    let analysis = analyze(&request.query, &fetched.matches)?;
    Ok(QueryOutcome {
        query_type: request.query.kind(),
        visualization_hint: request.visualization_hint.clone(),
        metadata: fetched.metadata,
        analysis,
    })
}

pub fn fetch(store: &LedgerStore, query: &Query) -> Result<FetchedMatches> {
    info!("Fetching data for {} query: {:?}", query.kind(), query.scope().season);
    for team in query.focus_teams() {
        store.ensure_team(team)?;
    }
    let matches = match &query.scope().season {
        SeasonSelector::All => store.all_matches()?,
        SeasonSelector::Season(label) => store.season_matches(label)?,
    };
    let fetched = narrow(matches, query);
    info!("Fetched {} matches", fetched.metadata.total_matches);
    Ok(fetched)
}

/// The storage-free half of [`fetch`]: team, opponent and date filters.
pub fn narrow(matches: Vec<MatchRow>, query: &Query) -> FetchedMatches {
    let mut matches = match query {
        Query::HeadToHead { team, opponent, .. } => filter_by_opponent(matches, team, opponent),
        _ => filter_by_teams(matches, &query.focus_teams()),
    };

    match &query.scope().date_range {
        DateRange::FullSeason => {}
        DateRange::LastNGames { n_games } => {
            matches = match query {
                // Each compared team gets its own window.
                Query::Comparison { teams, .. } => {
                    let mut windowed: Vec<MatchRow> = Vec::new();
                    let mut seen = BTreeSet::new();
                    for team in teams {
                        for m in last_n_matches(matches.clone(), Some(team.as_str()), *n_games) {
                            if seen.insert(m.match_id) {
                                windowed.push(m);
                            }
                        }
                    }
                    windowed
                }
                Query::Ranking { .. } => last_n_matches(matches, None, *n_games),
                Query::SingleTeam { team, .. }
                | Query::Trend { team, .. }
                | Query::HeadToHead { team, .. } => {
                    last_n_matches(matches, Some(team.as_str()), *n_games)
                }
            };
        }
        DateRange::Custom { start, end } => {
            matches = filter_by_date_range(matches, *start, *end);
        }
    }

    sort_newest_first(&mut matches);
    let metadata = describe(&matches);
    FetchedMatches { matches, metadata }
}

/// Picks and runs the aggregation functions for `query`.
pub fn analyze(query: &Query, matches: &[MatchRow]) -> Result<Analysis> {
    info!("Computing analytics for: {}", query.kind());
    let analysis = match query {
        Query::SingleTeam { team, .. } => Analysis::SingleTeam {
            team_stats: compute_team_stats(matches, team),
            form: compute_team_form(matches, team, SINGLE_TEAM_FORM),
        },
        Query::Comparison { teams, .. } => Analysis::Comparison {
            comparison: compare_teams(matches, teams),
        },
        Query::HeadToHead { team, opponent, .. } => Analysis::HeadToHead {
            head_to_head: compute_head_to_head(matches, team, opponent)?,
        },
        Query::Ranking {
            ranking: RankingKind::Table,
            ..
        } => Analysis::LeagueTable {
            league_table: compute_league_table(matches),
        },
        Query::Ranking {
            ranking: RankingKind::TopPerformers { metric, top_n },
            ..
        } => Analysis::TopPerformers {
            top_performers: compute_top_performers(matches, metric.name(), *top_n)?,
        },
        Query::Trend { team, .. } => Analysis::Trend {
            team_stats: compute_team_stats(matches, team),
            form: compute_team_form(matches, team, TREND_FORM),
        },
    };
    Ok(analysis)
}

fn describe(matches: &[MatchRow]) -> FetchMetadata {
    let seasons: BTreeSet<&str> = matches.iter().map(|m| m.season.as_str()).collect();
    let teams: BTreeSet<&str> = matches
        .iter()
        .flat_map(|m| [m.home_team.as_str(), m.away_team.as_str()])
        .collect();
    FetchMetadata {
        total_matches: matches.len(),
        seasons: seasons.into_iter().map(str::to_string).collect(),
        teams: teams.into_iter().map(str::to_string).collect(),
        earliest: matches.iter().map(|m| m.date).min(),
        latest: matches.iter().map(|m| m.date).max(),
    }
}

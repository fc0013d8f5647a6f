//! Flat per-fixture records into the normalized ledger entity set.
//!
//! Ids are assigned deterministically (sorted names, sorted season starts,
//! input order for matches) so the same input always yields the same foreign
//! keys.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::io::Read;
use std::path::Path;

use chrono::{NaiveDate, NaiveTime};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{DimensionKind, LedgerError, Result};
use crate::model::{
    League, Match, MatchOutcome, PointsAdjustment, Referee, Season, Team, TeamMatchStat, points_for,
};

/// One fixture as it appears in the merged season CSV. The short
/// football-data headers are accepted too.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlatMatchRecord {
    #[serde(alias = "Div", default)]
    pub league_division: Option<String>,
    #[serde(alias = "Date")]
    pub match_date: String,
    #[serde(alias = "Time", default)]
    pub match_kickoff_time: Option<String>,
    #[serde(alias = "HomeTeam")]
    pub home_team: String,
    #[serde(alias = "AwayTeam")]
    pub away_team: String,
    #[serde(alias = "FTHG")]
    pub full_time_home_team_goals: u16,
    #[serde(alias = "FTAG")]
    pub full_time_away_team_goals: u16,
    #[serde(alias = "FTR")]
    pub full_time_result: String,
    #[serde(alias = "HTHG")]
    pub half_time_home_team_goals: u16,
    #[serde(alias = "HTAG")]
    pub half_time_away_team_goals: u16,
    #[serde(alias = "HTR")]
    pub half_time_result: String,
    #[serde(alias = "Referee")]
    pub match_referee: String,
    #[serde(alias = "HS")]
    pub home_team_shots: u16,
    #[serde(alias = "AS")]
    pub away_team_shots: u16,
    #[serde(alias = "HST")]
    pub home_team_shots_on_target: u16,
    #[serde(alias = "AST")]
    pub away_team_shots_on_target: u16,
    #[serde(alias = "HF")]
    pub home_team_fouls_committed: u16,
    #[serde(alias = "AF")]
    pub away_team_fouls_committed: u16,
    #[serde(alias = "HC")]
    pub home_team_corners: u16,
    #[serde(alias = "AC")]
    pub away_team_corners: u16,
    #[serde(alias = "HY")]
    pub home_team_yellow_cards: u16,
    #[serde(alias = "AY")]
    pub away_team_yellow_cards: u16,
    #[serde(alias = "HR")]
    pub home_team_red_cards: u16,
    #[serde(alias = "AR")]
    pub away_team_red_cards: u16,
    #[serde(default)]
    pub season: Option<String>,
}

/// Externally announced points deduction or award, keyed by names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentSeed {
    pub team_name: String,
    pub season: String,
    pub adjustment: i32,
    pub reason: String,
}

/// Deductions imposed within the seasons the ledger was built for.
pub fn default_adjustments() -> Vec<AdjustmentSeed> {
    vec![
        AdjustmentSeed {
            team_name: "Everton".to_string(),
            season: "2023_2024".to_string(),
            adjustment: -6,
            reason: "PSR breach (2021-22 assessment period), initially -10, reduced to -6 on appeal"
                .to_string(),
        },
        AdjustmentSeed {
            team_name: "Everton".to_string(),
            season: "2023_2024".to_string(),
            adjustment: -2,
            reason: "PSR breach (2022-23 assessment period), second charge".to_string(),
        },
        AdjustmentSeed {
            team_name: "Nott'm Forest".to_string(),
            season: "2023_2024".to_string(),
            adjustment: -4,
            reason: "PSR breach (2022-23 assessment period), exceeded threshold by 34.5m"
                .to_string(),
        },
    ]
}

/// Drops seeds whose team or season does not occur in `records`.
pub fn applicable_adjustments(
    seeds: &[AdjustmentSeed],
    records: &[FlatMatchRecord],
) -> Vec<AdjustmentSeed> {
    let teams: HashSet<&str> = records
        .iter()
        .flat_map(|r| [r.home_team.trim(), r.away_team.trim()])
        .collect();
    let seasons: HashSet<&str> = records
        .iter()
        .filter_map(|r| r.season.as_deref().map(str::trim))
        .collect();

    seeds
        .iter()
        .filter(|seed| {
            let keep = teams.contains(seed.team_name.as_str())
                && seasons.contains(seed.season.as_str());
            if !keep {
                warn!(
                    "Skipping adjustment for {} {}: not present in source data",
                    seed.team_name, seed.season
                );
            }
            keep
        })
        .cloned()
        .collect()
}

pub fn read_flat_csv(path: &Path) -> Result<Vec<FlatMatchRecord>> {
    let file = std::fs::File::open(path)?;
    let records = read_flat_records(file)?;
    info!("Read {} match records from {}", records.len(), path.display());
    Ok(records)
}

/// Reads one raw season file and stamps `season` on rows that lack it.
pub fn read_season_csv(path: &Path, season: &str) -> Result<Vec<FlatMatchRecord>> {
    let mut records = read_flat_csv(path)?;
    for record in &mut records {
        if record.season.as_deref().is_none_or(|s| s.trim().is_empty()) {
            record.season = Some(season.to_string());
        }
    }
    Ok(records)
}

pub fn read_flat_records<R: Read>(reader: R) -> Result<Vec<FlatMatchRecord>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut out = Vec::new();
    for row in rdr.deserialize() {
        out.push(row?);
    }
    Ok(out)
}

/// The full normalized entity set produced by one transform run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerSet {
    pub league: League,
    pub teams: Vec<Team>,
    pub referees: Vec<Referee>,
    pub seasons: Vec<Season>,
    pub matches: Vec<Match>,
    pub match_team_stats: Vec<TeamMatchStat>,
    pub points_adjustments: Vec<PointsAdjustment>,
}

impl LedgerSet {
    /// SHA-256 over the canonical JSON form of the entity set.
    pub fn fingerprint(&self) -> Result<String> {
        let bytes = serde_json::to_vec(self)
            .map_err(|err| LedgerError::Integrity(format!("serialize ledger: {err}")))?;
        let digest = Sha256::digest(&bytes);
        Ok(format!("{digest:x}"))
    }

    /// Referential integrity plus the mirrored-row rules for every match.
    pub fn check_integrity(&self) -> Result<()> {
        let team_ids: HashSet<u32> = self.teams.iter().map(|t| t.team_id).collect();
        let referee_ids: HashSet<u32> = self.referees.iter().map(|r| r.referee_id).collect();
        let season_ids: HashSet<u32> = self.seasons.iter().map(|s| s.season_id).collect();

        for m in &self.matches {
            if !season_ids.contains(&m.season_id)
                || !team_ids.contains(&m.home_team_id)
                || !team_ids.contains(&m.away_team_id)
                || !referee_ids.contains(&m.referee_id)
            {
                return Err(LedgerError::Integrity(format!(
                    "match {} references a missing dimension row",
                    m.match_id
                )));
            }
            if MatchOutcome::from_goals(m.ft_home_goals, m.ft_away_goals) != m.ft_result {
                return Err(LedgerError::Integrity(format!(
                    "match {} full-time result disagrees with score",
                    m.match_id
                )));
            }
        }

        let mut by_match: HashMap<u32, Vec<&TeamMatchStat>> = HashMap::new();
        for row in &self.match_team_stats {
            if !team_ids.contains(&row.team_id) || !team_ids.contains(&row.opponent_id) {
                return Err(LedgerError::Integrity(format!(
                    "stat row {} references a missing team",
                    row.stat_id
                )));
            }
            by_match.entry(row.match_id).or_default().push(row);
        }

        for m in &self.matches {
            let rows = by_match.remove(&m.match_id).unwrap_or_default();
            let [a, b] = rows.as_slice() else {
                return Err(LedgerError::Integrity(format!(
                    "match {} has {} stat rows, expected 2",
                    m.match_id,
                    rows.len()
                )));
            };
            check_mirrored(m.match_id, a, b)?;
        }
        if let Some(orphan) = by_match.keys().next() {
            return Err(LedgerError::Integrity(format!(
                "stat rows reference unknown match {orphan}"
            )));
        }

        for adj in &self.points_adjustments {
            if !team_ids.contains(&adj.team_id) || !season_ids.contains(&adj.season_id) {
                return Err(LedgerError::Integrity(format!(
                    "adjustment {} references a missing team or season",
                    adj.adjustment_id
                )));
            }
        }
        Ok(())
    }
}

fn check_mirrored(match_id: u32, a: &TeamMatchStat, b: &TeamMatchStat) -> Result<()> {
    let mirrored = a.goals_scored == b.goals_conceded
        && a.goals_conceded == b.goals_scored
        && a.team_id == b.opponent_id
        && a.opponent_id == b.team_id
        && a.is_home != b.is_home;
    let points_ok = match a.goals_scored.cmp(&a.goals_conceded) {
        std::cmp::Ordering::Equal => a.points + b.points == 2,
        _ => a.points + b.points == 3,
    };
    if mirrored && points_ok {
        Ok(())
    } else {
        Err(LedgerError::Integrity(format!(
            "stat rows for match {match_id} are not mirror images"
        )))
    }
}

struct ParsedRecord<'a> {
    raw: &'a FlatMatchRecord,
    season: &'a str,
    date: NaiveDate,
    kickoff: Option<NaiveTime>,
    ft_result: MatchOutcome,
    ht_result: MatchOutcome,
}

pub fn build_ledger(
    records: &[FlatMatchRecord],
    adjustments: &[AdjustmentSeed],
    league_code: &str,
    league_name: &str,
) -> Result<LedgerSet> {
    let parsed = records
        .iter()
        .enumerate()
        .map(|(idx, raw)| parse_record(idx + 1, raw))
        .collect::<Result<Vec<_>>>()?;

    let league = League {
        league_id: 1,
        code: league_code.to_string(),
        name: league_name.to_string(),
    };

    // Season windows come from the data itself.
    let mut windows: BTreeMap<&str, (NaiveDate, NaiveDate)> = BTreeMap::new();
    for p in &parsed {
        windows
            .entry(p.season)
            .and_modify(|(start, end)| {
                *start = (*start).min(p.date);
                *end = (*end).max(p.date);
            })
            .or_insert((p.date, p.date));
    }
    let mut windows: Vec<(&str, NaiveDate, NaiveDate)> =
        windows.into_iter().map(|(label, (s, e))| (label, s, e)).collect();
    windows.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));
    let seasons: Vec<Season> = windows
        .into_iter()
        .enumerate()
        .map(|(idx, (label, start_date, end_date))| Season {
            season_id: idx as u32 + 1,
            label: label.to_string(),
            league_id: league.league_id,
            start_date,
            end_date,
        })
        .collect();

    let team_names: BTreeSet<&str> = parsed
        .iter()
        .flat_map(|p| [p.raw.home_team.trim(), p.raw.away_team.trim()])
        .collect();
    let teams: Vec<Team> = team_names
        .into_iter()
        .enumerate()
        .map(|(idx, name)| Team {
            team_id: idx as u32 + 1,
            name: name.to_string(),
        })
        .collect();

    let referee_names: BTreeSet<&str> = parsed.iter().map(|p| p.raw.match_referee.trim()).collect();
    let referees: Vec<Referee> = referee_names
        .into_iter()
        .enumerate()
        .map(|(idx, name)| Referee {
            referee_id: idx as u32 + 1,
            name: name.to_string(),
        })
        .collect();

    let team_ids: HashMap<&str, u32> = teams.iter().map(|t| (t.name.as_str(), t.team_id)).collect();
    let referee_ids: HashMap<&str, u32> =
        referees.iter().map(|r| (r.name.as_str(), r.referee_id)).collect();
    let season_ids: HashMap<&str, u32> =
        seasons.iter().map(|s| (s.label.as_str(), s.season_id)).collect();

    let mut matches = Vec::with_capacity(parsed.len());
    let mut match_team_stats = Vec::with_capacity(parsed.len() * 2);
    for (idx, p) in parsed.iter().enumerate() {
        let match_id = idx as u32 + 1;
        let r = p.raw;
        let home_id = resolve(&team_ids, DimensionKind::Team, r.home_team.trim())?;
        let away_id = resolve(&team_ids, DimensionKind::Team, r.away_team.trim())?;
        let referee_id = resolve(&referee_ids, DimensionKind::Referee, r.match_referee.trim())?;
        let season_id = resolve(&season_ids, DimensionKind::Season, p.season)?;

        matches.push(Match {
            match_id,
            season_id,
            match_date: p.date,
            kickoff_time: p.kickoff,
            home_team_id: home_id,
            away_team_id: away_id,
            referee_id,
            ft_home_goals: r.full_time_home_team_goals,
            ft_away_goals: r.full_time_away_team_goals,
            ft_result: p.ft_result,
            ht_home_goals: r.half_time_home_team_goals,
            ht_away_goals: r.half_time_away_team_goals,
            ht_result: p.ht_result,
        });

        let home_goals = r.full_time_home_team_goals;
        let away_goals = r.full_time_away_team_goals;
        match_team_stats.push(TeamMatchStat {
            stat_id: match_team_stats.len() as u32 + 1,
            match_id,
            team_id: home_id,
            opponent_id: away_id,
            is_home: true,
            goals_scored: home_goals,
            goals_conceded: away_goals,
            shots: r.home_team_shots,
            shots_on_target: r.home_team_shots_on_target,
            fouls: r.home_team_fouls_committed,
            corners: r.home_team_corners,
            yellow_cards: r.home_team_yellow_cards,
            red_cards: r.home_team_red_cards,
            points: points_for(home_goals, away_goals),
        });
        match_team_stats.push(TeamMatchStat {
            stat_id: match_team_stats.len() as u32 + 1,
            match_id,
            team_id: away_id,
            opponent_id: home_id,
            is_home: false,
            goals_scored: away_goals,
            goals_conceded: home_goals,
            shots: r.away_team_shots,
            shots_on_target: r.away_team_shots_on_target,
            fouls: r.away_team_fouls_committed,
            corners: r.away_team_corners,
            yellow_cards: r.away_team_yellow_cards,
            red_cards: r.away_team_red_cards,
            points: points_for(away_goals, home_goals),
        });
    }

    let mut points_adjustments = Vec::with_capacity(adjustments.len());
    for (idx, seed) in adjustments.iter().enumerate() {
        points_adjustments.push(PointsAdjustment {
            adjustment_id: idx as u32 + 1,
            team_id: resolve(&team_ids, DimensionKind::Team, seed.team_name.trim())?,
            season_id: resolve(&season_ids, DimensionKind::Season, seed.season.trim())?,
            adjustment: seed.adjustment,
            reason: seed.reason.clone(),
        });
    }

    info!(
        "Transformed {} matches: {} teams, {} referees, {} seasons, {} adjustments",
        matches.len(),
        teams.len(),
        referees.len(),
        seasons.len(),
        points_adjustments.len()
    );

    Ok(LedgerSet {
        league,
        teams,
        referees,
        seasons,
        matches,
        match_team_stats,
        points_adjustments,
    })
}

fn resolve(ids: &HashMap<&str, u32>, kind: DimensionKind, name: &str) -> Result<u32> {
    ids.get(name)
        .copied()
        .ok_or_else(|| LedgerError::unresolved(kind, name))
}

fn parse_record(row: usize, raw: &FlatMatchRecord) -> Result<ParsedRecord<'_>> {
    let invalid = |reason: String| LedgerError::InvalidRecord { row, reason };

    let season = raw
        .season
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| invalid("missing season label".to_string()))?;
    if raw.home_team.trim().is_empty() || raw.away_team.trim().is_empty() {
        return Err(invalid("missing team name".to_string()));
    }
    if raw.home_team.trim() == raw.away_team.trim() {
        return Err(invalid(format!("{} listed as both sides", raw.home_team.trim())));
    }
    if raw.match_referee.trim().is_empty() {
        return Err(invalid("missing referee".to_string()));
    }

    let date = parse_match_date(&raw.match_date)
        .ok_or_else(|| invalid(format!("unparseable date {:?}", raw.match_date)))?;
    let kickoff = match raw.match_kickoff_time.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(t) => Some(
            parse_kickoff(t).ok_or_else(|| invalid(format!("unparseable kickoff time {t:?}")))?,
        ),
    };

    let ft_result = checked_outcome(
        row,
        "full-time",
        &raw.full_time_result,
        raw.full_time_home_team_goals,
        raw.full_time_away_team_goals,
    )?;
    let ht_result = checked_outcome(
        row,
        "half-time",
        &raw.half_time_result,
        raw.half_time_home_team_goals,
        raw.half_time_away_team_goals,
    )?;

    Ok(ParsedRecord {
        raw,
        season,
        date,
        kickoff,
        ft_result,
        ht_result,
    })
}

fn checked_outcome(
    row: usize,
    half: &'static str,
    code: &str,
    home_goals: u16,
    away_goals: u16,
) -> Result<MatchOutcome> {
    let inconsistent = || LedgerError::InconsistentResult {
        row,
        half,
        result: code.to_string(),
        home_goals,
        away_goals,
    };
    let outcome = MatchOutcome::from_code(code).ok_or_else(inconsistent)?;
    if outcome != MatchOutcome::from_goals(home_goals, away_goals) {
        return Err(inconsistent());
    }
    Ok(outcome)
}

/// Accepts `DD/MM/YYYY`, `DD/MM/YY` and `YYYY-MM-DD`.
pub fn parse_match_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.contains('-') {
        return NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok();
    }
    let year_len = raw.rsplit('/').next().map(str::len)?;
    let fmt = if year_len == 2 { "%d/%m/%y" } else { "%d/%m/%Y" };
    NaiveDate::parse_from_str(raw, fmt).ok()
}

fn parse_kickoff(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_match_date_accepts_known_formats() {
        let expected = NaiveDate::from_ymd_opt(2021, 8, 13);
        assert_eq!(parse_match_date("13/08/2021"), expected);
        assert_eq!(parse_match_date("13/08/21"), expected);
        assert_eq!(parse_match_date("2021-08-13"), expected);
        assert_eq!(parse_match_date("13.08.2021"), None);
    }

    #[test]
    fn outcome_must_agree_with_goals() {
        assert_eq!(
            checked_outcome(1, "full-time", "H", 2, 0).unwrap(),
            MatchOutcome::Home
        );
        assert!(matches!(
            checked_outcome(4, "full-time", "D", 2, 0),
            Err(LedgerError::InconsistentResult { row: 4, .. })
        ));
        assert!(checked_outcome(1, "half-time", "?", 0, 0).is_err());
    }
}

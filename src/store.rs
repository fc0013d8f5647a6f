//! Normalized SQLite ledger behind a small connection pool.
//!
//! The pool is owned by [`LedgerStore`]; build one at startup and pass it
//! (or clones of it) to whoever needs to read. Connections are validated on
//! checkout and run with foreign keys enforced.

use std::path::Path;

use chrono::{NaiveDate, NaiveTime};
use log::{debug, info};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, Transaction, params};

use crate::aggregation::{LeagueTableEntry, compute_league_table};
use crate::config::LedgerConfig;
use crate::error::{DimensionKind, LedgerError, Result};
use crate::model::{MatchOutcome, MatchRow, Season, StandingRow, Team, TeamMatchRow};
use crate::transform::{AdjustmentSeed, LedgerSet};

pub type ConnectionPool = Pool<SqliteConnectionManager>;

const DATE_FMT: &str = "%Y-%m-%d";
const TIME_FMT: &str = "%H:%M";

const SCHEMA_DDL: &str = r#"
    DROP VIEW  IF EXISTS league_table;
    DROP TABLE IF EXISTS points_adjustments;
    DROP TABLE IF EXISTS match_team_stats;
    DROP TABLE IF EXISTS matches;
    DROP TABLE IF EXISTS seasons;
    DROP TABLE IF EXISTS referees;
    DROP TABLE IF EXISTS teams;
    DROP TABLE IF EXISTS leagues;

    CREATE TABLE leagues (
        league_id   INTEGER PRIMARY KEY,
        league_code TEXT UNIQUE NOT NULL,
        league_name TEXT NOT NULL
    );

    CREATE TABLE teams (
        team_id   INTEGER PRIMARY KEY,
        team_name TEXT UNIQUE NOT NULL
    );

    CREATE TABLE referees (
        referee_id   INTEGER PRIMARY KEY,
        referee_name TEXT UNIQUE NOT NULL
    );

    CREATE TABLE seasons (
        season_id  INTEGER PRIMARY KEY,
        season     TEXT NOT NULL,
        league_id  INTEGER NOT NULL REFERENCES leagues(league_id),
        start_date TEXT NOT NULL,
        end_date   TEXT NOT NULL,
        UNIQUE (season, league_id)
    );

    CREATE TABLE matches (
        match_id      INTEGER PRIMARY KEY,
        season_id     INTEGER NOT NULL REFERENCES seasons(season_id),
        match_date    TEXT NOT NULL,
        kickoff_time  TEXT NULL,
        home_team_id  INTEGER NOT NULL REFERENCES teams(team_id),
        away_team_id  INTEGER NOT NULL REFERENCES teams(team_id),
        referee_id    INTEGER NOT NULL REFERENCES referees(referee_id),
        ft_home_goals INTEGER NOT NULL,
        ft_away_goals INTEGER NOT NULL,
        ft_result     TEXT NOT NULL CHECK (ft_result IN ('H', 'D', 'A')),
        ht_home_goals INTEGER NOT NULL,
        ht_away_goals INTEGER NOT NULL,
        ht_result     TEXT NOT NULL CHECK (ht_result IN ('H', 'D', 'A'))
    );

    -- Two rows per match, one from each side.
    CREATE TABLE match_team_stats (
        match_team_stat_id INTEGER PRIMARY KEY,
        match_id           INTEGER NOT NULL REFERENCES matches(match_id),
        team_id            INTEGER NOT NULL REFERENCES teams(team_id),
        opponent_id        INTEGER NOT NULL REFERENCES teams(team_id),
        is_home            INTEGER NOT NULL,
        goals_scored       INTEGER NOT NULL,
        goals_conceded     INTEGER NOT NULL,
        shots              INTEGER NOT NULL,
        shots_on_target    INTEGER NOT NULL,
        fouls              INTEGER NOT NULL,
        corners            INTEGER NOT NULL,
        yellow_cards       INTEGER NOT NULL,
        red_cards          INTEGER NOT NULL,
        points             INTEGER NOT NULL CHECK (points IN (0, 1, 3)),
        UNIQUE (match_id, team_id)
    );

    CREATE TABLE points_adjustments (
        adjustment_id INTEGER PRIMARY KEY,
        team_id       INTEGER NOT NULL REFERENCES teams(team_id),
        season_id     INTEGER NOT NULL REFERENCES seasons(season_id),
        adjustment    INTEGER NOT NULL,
        reason        TEXT NOT NULL,
        UNIQUE (team_id, season_id, reason)
    );

    CREATE INDEX idx_matches_season    ON matches(season_id);
    CREATE INDEX idx_matches_date      ON matches(match_date);
    CREATE INDEX idx_matches_home_team ON matches(home_team_id);
    CREATE INDEX idx_matches_away_team ON matches(away_team_id);
    CREATE INDEX idx_mts_match         ON match_team_stats(match_id);
    CREATE INDEX idx_mts_team          ON match_team_stats(team_id);
    CREATE INDEX idx_mts_team_match    ON match_team_stats(team_id, match_id);

    -- Standings with adjustments folded in: points, then GD, then GF.
    CREATE VIEW league_table AS
    SELECT
        s.season,
        t.team_name,
        COUNT(*)                                                               AS played,
        SUM(CASE WHEN mts.goals_scored > mts.goals_conceded THEN 1 ELSE 0 END) AS won,
        SUM(CASE WHEN mts.goals_scored = mts.goals_conceded THEN 1 ELSE 0 END) AS drawn,
        SUM(CASE WHEN mts.goals_scored < mts.goals_conceded THEN 1 ELSE 0 END) AS lost,
        SUM(mts.goals_scored)                                                  AS gf,
        SUM(mts.goals_conceded)                                                AS ga,
        SUM(mts.goals_scored) - SUM(mts.goals_conceded)                        AS gd,
        SUM(mts.points) + COALESCE(pa.total_adjustment, 0)                     AS points,
        COALESCE(pa.total_adjustment, 0)                                       AS points_adjustment
    FROM match_team_stats mts
    JOIN matches m ON mts.match_id = m.match_id
    JOIN seasons s ON m.season_id  = s.season_id
    JOIN teams   t ON mts.team_id  = t.team_id
    LEFT JOIN (
        SELECT team_id, season_id, SUM(adjustment) AS total_adjustment
        FROM points_adjustments
        GROUP BY team_id, season_id
    ) pa ON pa.team_id = mts.team_id AND pa.season_id = m.season_id
    GROUP BY s.season, t.team_name, pa.total_adjustment
    ORDER BY s.season, points DESC, gd DESC, gf DESC;
"#;

const MATCH_ROW_SELECT: &str = r#"
    SELECT
        m.match_id, s.season, m.match_date, m.kickoff_time,
        ht.team_name, awt.team_name, r.referee_name,
        m.ft_home_goals, m.ft_away_goals, m.ft_result,
        m.ht_home_goals, m.ht_away_goals, m.ht_result,
        COALESCE(hst.shots, 0), COALESCE(ast.shots, 0),
        COALESCE(hst.shots_on_target, 0), COALESCE(ast.shots_on_target, 0)
    FROM matches m
    JOIN teams ht    ON m.home_team_id = ht.team_id
    JOIN teams awt   ON m.away_team_id = awt.team_id
    JOIN referees r  ON m.referee_id   = r.referee_id
    JOIN seasons s   ON m.season_id    = s.season_id
    LEFT JOIN match_team_stats hst ON hst.match_id = m.match_id AND hst.is_home = 1
    LEFT JOIN match_team_stats ast ON ast.match_id = m.match_id AND ast.is_home = 0
"#;

const TEAM_MATCH_ROW_SELECT: &str = r#"
    SELECT
        mts.match_team_stat_id, mts.match_id, t.team_name, opp.team_name,
        mts.is_home, m.match_date, s.season,
        mts.goals_scored, mts.goals_conceded, mts.shots, mts.shots_on_target,
        mts.fouls, mts.corners, mts.yellow_cards, mts.red_cards, mts.points
    FROM match_team_stats mts
    JOIN teams t   ON mts.team_id     = t.team_id
    JOIN teams opp ON mts.opponent_id = opp.team_id
    JOIN matches m ON mts.match_id    = m.match_id
    JOIN seasons s ON m.season_id     = s.season_id
"#;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    pub teams: usize,
    pub referees: usize,
    pub seasons: usize,
    pub matches: usize,
    pub match_team_stats: usize,
    pub points_adjustments: usize,
    pub fingerprint: String,
}

#[derive(Clone)]
pub struct LedgerStore {
    pool: ConnectionPool,
}

impl LedgerStore {
    pub fn open(config: &LedgerConfig) -> Result<Self> {
        Self::open_path(&config.db_path, config.pool_size)
    }

    pub fn open_path(path: &Path, pool_size: u32) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let manager = SqliteConnectionManager::file(path).with_init(|conn| {
            conn.execute_batch(
                "PRAGMA journal_mode = WAL;
                 PRAGMA foreign_keys = ON;
                 PRAGMA busy_timeout = 5000;",
            )
        });
        let pool = Pool::builder()
            .max_size(pool_size.max(1))
            .test_on_check_out(true)
            .build(manager)?;
        info!("Opened ledger store at {} (pool size {})", path.display(), pool_size.max(1));
        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: ConnectionPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>> {
        Ok(self.pool.get()?)
    }

    /// Rebuilds the schema and loads `ledger` in one transaction. A failure at
    /// any step (including post-load validation) leaves the previous contents
    /// untouched.
    pub fn migrate(&self, ledger: &LedgerSet) -> Result<MigrationReport> {
        ledger.check_integrity()?;
        let fingerprint = ledger.fingerprint()?;

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        info!("Creating ledger schema");
        tx.execute_batch(SCHEMA_DDL)?;

        info!("Loading {} matches", ledger.matches.len());
        insert_ledger(&tx, ledger)?;

        let report = validate_loaded(&tx, ledger, fingerprint)?;
        tx.commit()?;
        info!("Migration committed (fingerprint {})", report.fingerprint);
        Ok(report)
    }

    pub fn seasons(&self) -> Result<Vec<Season>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT season_id, season, league_id, start_date, end_date
             FROM seasons ORDER BY start_date, season",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Season {
                season_id: row.get(0)?,
                label: row.get(1)?,
                league_id: row.get(2)?,
                start_date: date_col(row, 3)?,
                end_date: date_col(row, 4)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn teams(&self) -> Result<Vec<Team>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT team_id, team_name FROM teams ORDER BY team_name")?;
        let rows = stmt.query_map([], |row| {
            Ok(Team {
                team_id: row.get(0)?,
                name: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Every match in `season`, oldest first.
    pub fn season_matches(&self, season: &str) -> Result<Vec<MatchRow>> {
        let conn = self.conn()?;
        ensure_season(&conn, season)?;
        let sql = format!(
            "{MATCH_ROW_SELECT} WHERE s.season = ?1 ORDER BY m.match_date, m.kickoff_time, m.match_id"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![season], match_row)?;
        let out = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        info!("Loaded {} matches from {}", out.len(), season);
        Ok(out)
    }

    pub fn all_matches(&self) -> Result<Vec<MatchRow>> {
        let conn = self.conn()?;
        let sql = format!("{MATCH_ROW_SELECT} ORDER BY m.match_date, m.kickoff_time, m.match_id");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], match_row)?;
        let out = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        if out.is_empty() {
            return Err(LedgerError::DataUnavailable("ledger contains no matches".to_string()));
        }
        info!("Loaded {} total matches across all seasons", out.len());
        Ok(out)
    }

    /// The unpivoted per-team-per-match fact rows, oldest first.
    pub fn team_match_stats(&self, season: Option<&str>) -> Result<Vec<TeamMatchRow>> {
        let conn = self.conn()?;
        let out = match season {
            Some(season) => {
                ensure_season(&conn, season)?;
                let sql = format!(
                    "{TEAM_MATCH_ROW_SELECT} WHERE s.season = ?1 ORDER BY m.match_date, mts.match_team_stat_id"
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(params![season], team_match_row)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
            None => {
                let sql =
                    format!("{TEAM_MATCH_ROW_SELECT} ORDER BY m.match_date, mts.match_team_stat_id");
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map([], team_match_row)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
        };
        debug!("Loaded {} team-match stat rows", out.len());
        Ok(out)
    }

    pub fn points_adjustments(&self, season: &str) -> Result<Vec<AdjustmentSeed>> {
        let conn = self.conn()?;
        ensure_season(&conn, season)?;
        let mut stmt = conn.prepare(
            "SELECT t.team_name, s.season, pa.adjustment, pa.reason
             FROM points_adjustments pa
             JOIN teams t   ON pa.team_id   = t.team_id
             JOIN seasons s ON pa.season_id = s.season_id
             WHERE s.season = ?1
             ORDER BY pa.adjustment_id",
        )?;
        let rows = stmt.query_map(params![season], |row| {
            Ok(AdjustmentSeed {
                team_name: row.get(0)?,
                season: row.get(1)?,
                adjustment: row.get(2)?,
                reason: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Fails with `DataUnavailable` when `team` has never appeared in the ledger.
    pub fn ensure_team(&self, team: &str) -> Result<()> {
        let conn = self.conn()?;
        let found: Option<u32> = conn
            .query_row(
                "SELECT team_id FROM teams WHERE team_name = ?1",
                params![team],
                |row| row.get(0),
            )
            .optional()?;
        match found {
            Some(_) => Ok(()),
            None => Err(LedgerError::DataUnavailable(format!("no data found for team {team}"))),
        }
    }

    /// Records an announced adjustment. Re-recording the same (team, season,
    /// reason) is a no-op; returns whether a row was inserted.
    ///
    /// Rows recorded here live only until the next [`migrate`](Self::migrate),
    /// which rebuilds `points_adjustments` from the ledger's seed list. Add
    /// permanent deductions to the seeds instead.
    pub fn record_adjustment(&self, seed: &AdjustmentSeed) -> Result<bool> {
        let conn = self.conn()?;
        let team_id: Option<u32> = conn
            .query_row(
                "SELECT team_id FROM teams WHERE team_name = ?1",
                params![seed.team_name],
                |row| row.get(0),
            )
            .optional()?;
        let team_id =
            team_id.ok_or_else(|| LedgerError::unresolved(DimensionKind::Team, &seed.team_name))?;
        let season_id: Option<u32> = conn
            .query_row(
                "SELECT season_id FROM seasons WHERE season = ?1",
                params![seed.season],
                |row| row.get(0),
            )
            .optional()?;
        let season_id =
            season_id.ok_or_else(|| LedgerError::unresolved(DimensionKind::Season, &seed.season))?;

        let inserted = conn.execute(
            "INSERT INTO points_adjustments (team_id, season_id, adjustment, reason)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(team_id, season_id, reason) DO NOTHING",
            params![team_id, season_id, seed.adjustment, seed.reason],
        )?;
        if inserted > 0 {
            info!(
                "Recorded {:+} for {} in {}",
                seed.adjustment, seed.team_name, seed.season
            );
        }
        Ok(inserted > 0)
    }

    /// Season standings with points adjustments applied. This is the
    /// authoritative table for a whole season.
    pub fn standings_adjusted(&self, season: &str) -> Result<Vec<StandingRow>> {
        let conn = self.conn()?;
        ensure_season(&conn, season)?;
        let mut stmt = conn.prepare(
            "SELECT season, team_name, played, won, drawn, lost, gf, ga, gd, points, points_adjustment
             FROM league_table
             WHERE season = ?1
             ORDER BY points DESC, gd DESC, gf DESC, team_name ASC",
        )?;
        let rows = stmt.query_map(params![season], |row| {
            Ok(StandingRow {
                position: 0,
                season: row.get(0)?,
                team: row.get(1)?,
                played: row.get(2)?,
                won: row.get(3)?,
                drawn: row.get(4)?,
                lost: row.get(5)?,
                goals_for: row.get(6)?,
                goals_against: row.get(7)?,
                goal_difference: row.get(8)?,
                points: row.get(9)?,
                points_adjustment: row.get(10)?,
            })
        })?;
        let mut table = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        for (idx, row) in table.iter_mut().enumerate() {
            row.position = idx as u32 + 1;
        }
        info!("Loaded adjusted standings for {} ({} teams)", season, table.len());
        Ok(table)
    }

    /// Standings from results only, optionally cut off at `as_of`
    /// (inclusive). Adjustments are never applied here, not even partially.
    pub fn standings_raw(
        &self,
        season: &str,
        as_of: Option<NaiveDate>,
    ) -> Result<Vec<LeagueTableEntry>> {
        let mut matches = self.season_matches(season)?;
        if let Some(cutoff) = as_of {
            matches.retain(|m| m.date <= cutoff);
        }
        Ok(compute_league_table(&matches))
    }
}

fn ensure_season(conn: &Connection, season: &str) -> Result<()> {
    let found: Option<u32> = conn
        .query_row(
            "SELECT season_id FROM seasons WHERE season = ?1",
            params![season],
            |row| row.get(0),
        )
        .optional()?;
    match found {
        Some(_) => Ok(()),
        None => Err(LedgerError::DataUnavailable(format!("no data found for season {season}"))),
    }
}

fn insert_ledger(tx: &Transaction<'_>, ledger: &LedgerSet) -> Result<()> {
    tx.execute(
        "INSERT INTO leagues (league_id, league_code, league_name) VALUES (?1, ?2, ?3)",
        params![ledger.league.league_id, ledger.league.code, ledger.league.name],
    )?;

    {
        let mut stmt = tx.prepare("INSERT INTO teams (team_id, team_name) VALUES (?1, ?2)")?;
        for t in &ledger.teams {
            stmt.execute(params![t.team_id, t.name])?;
        }
    }
    {
        let mut stmt =
            tx.prepare("INSERT INTO referees (referee_id, referee_name) VALUES (?1, ?2)")?;
        for r in &ledger.referees {
            stmt.execute(params![r.referee_id, r.name])?;
        }
    }
    {
        let mut stmt = tx.prepare(
            "INSERT INTO seasons (season_id, season, league_id, start_date, end_date)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for s in &ledger.seasons {
            stmt.execute(params![
                s.season_id,
                s.label,
                s.league_id,
                s.start_date.format(DATE_FMT).to_string(),
                s.end_date.format(DATE_FMT).to_string(),
            ])?;
        }
    }
    {
        let mut stmt = tx.prepare(
            "INSERT INTO matches (
                match_id, season_id, match_date, kickoff_time,
                home_team_id, away_team_id, referee_id,
                ft_home_goals, ft_away_goals, ft_result,
                ht_home_goals, ht_away_goals, ht_result
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        )?;
        for m in &ledger.matches {
            stmt.execute(params![
                m.match_id,
                m.season_id,
                m.match_date.format(DATE_FMT).to_string(),
                m.kickoff_time.map(|t| t.format(TIME_FMT).to_string()),
                m.home_team_id,
                m.away_team_id,
                m.referee_id,
                m.ft_home_goals,
                m.ft_away_goals,
                m.ft_result.code().to_string(),
                m.ht_home_goals,
                m.ht_away_goals,
                m.ht_result.code().to_string(),
            ])?;
        }
    }
    {
        let mut stmt = tx.prepare(
            "INSERT INTO match_team_stats (
                match_team_stat_id, match_id, team_id, opponent_id, is_home,
                goals_scored, goals_conceded, shots, shots_on_target,
                fouls, corners, yellow_cards, red_cards, points
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        )?;
        for s in &ledger.match_team_stats {
            stmt.execute(params![
                s.stat_id,
                s.match_id,
                s.team_id,
                s.opponent_id,
                s.is_home,
                s.goals_scored,
                s.goals_conceded,
                s.shots,
                s.shots_on_target,
                s.fouls,
                s.corners,
                s.yellow_cards,
                s.red_cards,
                s.points,
            ])?;
        }
    }
    {
        let mut stmt = tx.prepare(
            "INSERT INTO points_adjustments (adjustment_id, team_id, season_id, adjustment, reason)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for a in &ledger.points_adjustments {
            stmt.execute(params![
                a.adjustment_id,
                a.team_id,
                a.season_id,
                a.adjustment,
                a.reason
            ])?;
        }
    }
    Ok(())
}

fn validate_loaded(
    tx: &Transaction<'_>,
    ledger: &LedgerSet,
    fingerprint: String,
) -> Result<MigrationReport> {
    let expected = [
        ("leagues", 1usize),
        ("teams", ledger.teams.len()),
        ("referees", ledger.referees.len()),
        ("seasons", ledger.seasons.len()),
        ("matches", ledger.matches.len()),
        ("match_team_stats", ledger.matches.len() * 2),
        ("points_adjustments", ledger.points_adjustments.len()),
    ];
    for (table, want) in expected {
        let got: i64 = tx.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
            row.get(0)
        })?;
        if got != want as i64 {
            return Err(LedgerError::Integrity(format!(
                "{table}: expected {want} rows, found {got}"
            )));
        }
        debug!("{table}: {got} rows");
    }

    let unmirrored: i64 = tx.query_row(
        "SELECT COUNT(*)
         FROM match_team_stats a
         JOIN match_team_stats b ON a.match_id = b.match_id AND a.team_id <> b.team_id
         WHERE a.goals_scored <> b.goals_conceded
            OR a.team_id <> b.opponent_id
            OR a.is_home = b.is_home
            OR (a.goals_scored = a.goals_conceded AND a.points + b.points <> 2)
            OR (a.goals_scored <> a.goals_conceded AND a.points + b.points <> 3)",
        [],
        |row| row.get(0),
    )?;
    if unmirrored != 0 {
        return Err(LedgerError::Integrity(format!(
            "{unmirrored} stat rows are not mirrored by their opponent's row"
        )));
    }

    Ok(MigrationReport {
        teams: ledger.teams.len(),
        referees: ledger.referees.len(),
        seasons: ledger.seasons.len(),
        matches: ledger.matches.len(),
        match_team_stats: ledger.match_team_stats.len(),
        points_adjustments: ledger.points_adjustments.len(),
        fingerprint,
    })
}

fn match_row(row: &Row<'_>) -> rusqlite::Result<MatchRow> {
    Ok(MatchRow {
        match_id: row.get(0)?,
        season: row.get(1)?,
        date: date_col(row, 2)?,
        kickoff_time: time_col(row, 3)?,
        home_team: row.get(4)?,
        away_team: row.get(5)?,
        referee: row.get(6)?,
        ft_home_goals: row.get(7)?,
        ft_away_goals: row.get(8)?,
        ft_result: outcome_col(row, 9)?,
        ht_home_goals: row.get(10)?,
        ht_away_goals: row.get(11)?,
        ht_result: outcome_col(row, 12)?,
        home_shots: row.get(13)?,
        away_shots: row.get(14)?,
        home_shots_on_target: row.get(15)?,
        away_shots_on_target: row.get(16)?,
    })
}

fn team_match_row(row: &Row<'_>) -> rusqlite::Result<TeamMatchRow> {
    Ok(TeamMatchRow {
        stat_id: row.get(0)?,
        match_id: row.get(1)?,
        team: row.get(2)?,
        opponent: row.get(3)?,
        is_home: row.get(4)?,
        date: date_col(row, 5)?,
        season: row.get(6)?,
        goals_scored: row.get(7)?,
        goals_conceded: row.get(8)?,
        shots: row.get(9)?,
        shots_on_target: row.get(10)?,
        fouls: row.get(11)?,
        corners: row.get(12)?,
        yellow_cards: row.get(13)?,
        red_cards: row.get(14)?,
        points: row.get(15)?,
    })
}

fn date_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    NaiveDate::parse_from_str(&raw, DATE_FMT)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err)))
}

fn time_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<NaiveTime>> {
    let Some(raw) = row.get::<_, Option<String>>(idx)? else {
        return Ok(None);
    };
    NaiveTime::parse_from_str(&raw, TIME_FMT)
        .map(Some)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err)))
}

fn outcome_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<MatchOutcome> {
    let raw: String = row.get(idx)?;
    MatchOutcome::from_code(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("unknown result code {raw:?}").into(),
        )
    })
}

use std::path::PathBuf;

use chrono::NaiveDate;
use tempfile::TempDir;

use pl_ledger::config::LedgerConfig;
use pl_ledger::error::LedgerError;
use pl_ledger::store::LedgerStore;
use pl_ledger::transform::{
    AdjustmentSeed, LedgerSet, build_ledger, default_adjustments, read_flat_csv,
};

fn fixture_path(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path
}

fn sample_ledger() -> LedgerSet {
    let records = read_flat_csv(&fixture_path("sample_matches.csv")).expect("fixture should parse");
    build_ledger(&records, &default_adjustments(), "E0", "Premier League").expect("ledger builds")
}

fn migrated_store() -> (TempDir, LedgerStore) {
    let dir = TempDir::new().expect("tempdir");
    let config = LedgerConfig::new(dir.path().join("ledger.sqlite"));
    let store = LedgerStore::open(&config).expect("store opens");
    store.migrate(&sample_ledger()).expect("migration succeeds");
    (dir, store)
}

#[test]
fn migration_reports_loaded_counts() {
    let dir = TempDir::new().unwrap();
    let store = LedgerStore::open_path(&dir.path().join("ledger.sqlite"), 2).unwrap();
    let ledger = sample_ledger();
    let report = store.migrate(&ledger).unwrap();

    assert_eq!(report.teams, 6);
    assert_eq!(report.referees, 3);
    assert_eq!(report.seasons, 2);
    assert_eq!(report.matches, 12);
    assert_eq!(report.match_team_stats, 24);
    assert_eq!(report.points_adjustments, 3);
    assert_eq!(report.fingerprint, ledger.fingerprint().unwrap());

    let seasons = store.seasons().unwrap();
    assert_eq!(seasons.len(), 2);
    assert_eq!(seasons[0].label, "2021_2022");
    assert_eq!(seasons[0].start_date, NaiveDate::from_ymd_opt(2021, 8, 13).unwrap());
    assert_eq!(seasons[0].end_date, NaiveDate::from_ymd_opt(2021, 8, 28).unwrap());
    assert_eq!(store.teams().unwrap().len(), 6);
}

#[test]
fn rerunning_migration_gives_identical_ledger() {
    let (_dir, store) = migrated_store();
    let before = store.all_matches().unwrap();
    let report = store.migrate(&sample_ledger()).unwrap();
    let after = store.all_matches().unwrap();
    assert_eq!(before, after);
    assert_eq!(report.match_team_stats, 24);
    assert_eq!(report.fingerprint, sample_ledger().fingerprint().unwrap());
}

#[test]
fn season_matches_round_trip_through_storage() {
    let (_dir, store) = migrated_store();
    let matches = store.season_matches("2021_2022").unwrap();
    assert_eq!(matches.len(), 6);

    let opener = &matches[0];
    assert_eq!(opener.home_team, "Brentford");
    assert_eq!(opener.away_team, "Arsenal");
    assert_eq!(opener.ft_home_goals, 2);
    assert_eq!(opener.home_shots, 8);
    assert_eq!(opener.away_shots_on_target, 4);
    assert_eq!(opener.referee, "M Oliver");
    assert_eq!(opener.date, NaiveDate::from_ymd_opt(2021, 8, 13).unwrap());

    let all = store.all_matches().unwrap();
    assert_eq!(all.len(), 12);
    let unscheduled = all.iter().find(|m| m.match_id == 12).unwrap();
    assert!(unscheduled.kickoff_time.is_none());
    assert_eq!(unscheduled.away_team, "Nott'm Forest");
}

#[test]
fn unknown_season_is_data_unavailable() {
    let (_dir, store) = migrated_store();
    assert!(matches!(
        store.season_matches("1999_2000"),
        Err(LedgerError::DataUnavailable(_))
    ));
    assert!(matches!(
        store.standings_adjusted("1999_2000"),
        Err(LedgerError::DataUnavailable(_))
    ));
    assert!(matches!(
        store.standings_raw("1999_2000", None),
        Err(LedgerError::DataUnavailable(_))
    ));
}

#[test]
fn empty_ledger_has_no_matches_to_fetch() {
    let dir = TempDir::new().unwrap();
    let store = LedgerStore::open_path(&dir.path().join("ledger.sqlite"), 1).unwrap();
    let empty = build_ledger(&[], &[], "E0", "Premier League").unwrap();
    store.migrate(&empty).unwrap();
    assert!(matches!(
        store.all_matches(),
        Err(LedgerError::DataUnavailable(_))
    ));
}

#[test]
fn stat_rows_are_unpivoted_per_team() {
    let (_dir, store) = migrated_store();
    let rows = store.team_match_stats(Some("2021_2022")).unwrap();
    assert_eq!(rows.len(), 12);
    let brentford_opener: Vec<_> = rows.iter().filter(|r| r.match_id == 1).collect();
    assert_eq!(brentford_opener.len(), 2);
    assert!(brentford_opener.iter().any(|r| r.team == "Brentford" && r.points == 3));
    assert!(brentford_opener.iter().any(|r| r.team == "Arsenal" && r.points == 0));
    assert_eq!(store.team_match_stats(None).unwrap().len(), 24);
}

#[test]
fn adjusted_standings_combine_separate_deductions() {
    let (_dir, store) = migrated_store();
    let table = store.standings_adjusted("2023_2024").unwrap();
    let order: Vec<&str> = table.iter().map(|r| r.team.as_str()).collect();
    assert_eq!(order, ["Arsenal", "Chelsea", "Nott'm Forest", "Everton"]);

    let everton = table.iter().find(|r| r.team == "Everton").unwrap();
    assert_eq!(everton.points_adjustment, -8);
    assert_eq!(everton.points, 7 - 8);
    assert_eq!(everton.played, 3);
    assert_eq!(everton.goal_difference, 4);

    let forest = table.iter().find(|r| r.team == "Nott'm Forest").unwrap();
    assert_eq!(forest.points_adjustment, -4);
    assert_eq!(forest.points, 0);

    let arsenal = &table[0];
    assert_eq!(arsenal.position, 1);
    assert_eq!(arsenal.points_adjustment, 0);

    let adjustments = store.points_adjustments("2023_2024").unwrap();
    assert_eq!(adjustments.len(), 3);
    let everton_total: i32 = adjustments
        .iter()
        .filter(|a| a.team_name == "Everton")
        .map(|a| a.adjustment)
        .sum();
    assert_eq!(everton_total, -8);
}

#[test]
fn raw_standings_ignore_adjustments() {
    let (_dir, store) = migrated_store();
    let raw = store.standings_raw("2023_2024", None).unwrap();
    let order: Vec<&str> = raw.iter().map(|e| e.stats.team.as_str()).collect();
    assert_eq!(order, ["Everton", "Nott'm Forest", "Arsenal", "Chelsea"]);
    assert_eq!(raw[0].stats.points, 7);

    let adjusted = store.standings_adjusted("2023_2024").unwrap();
    let raw_total: i64 = raw.iter().map(|e| i64::from(e.stats.points)).sum();
    let adjusted_total: i64 = adjusted.iter().map(|r| i64::from(r.points)).sum();
    assert_eq!(raw_total - adjusted_total, 12);
}

#[test]
fn raw_standings_as_of_date_cut_off() {
    let (_dir, store) = migrated_store();
    let cutoff = NaiveDate::from_ymd_opt(2023, 8, 19).unwrap();
    let table = store.standings_raw("2023_2024", Some(cutoff)).unwrap();
    let order: Vec<(&str, u32)> = table
        .iter()
        .map(|e| (e.stats.team.as_str(), e.stats.points))
        .collect();
    assert_eq!(
        order,
        [
            ("Everton", 4),
            ("Arsenal", 3),
            ("Chelsea", 3),
            ("Nott'm Forest", 1)
        ]
    );
    assert!(table.iter().all(|e| e.stats.matches_played == 2));
}

#[test]
fn standings_without_adjustments_agree() {
    let (_dir, store) = migrated_store();
    let raw = store.standings_raw("2021_2022", None).unwrap();
    let adjusted = store.standings_adjusted("2021_2022").unwrap();
    assert_eq!(raw.len(), adjusted.len());
    for (r, a) in raw.iter().zip(&adjusted) {
        assert_eq!(r.stats.team, a.team);
        assert_eq!(r.stats.points as i32, a.points);
        assert_eq!(r.stats.goals_scored, a.goals_for);
        assert_eq!(a.points_adjustment, 0);
    }
}

#[test]
fn recording_an_adjustment_is_idempotent() {
    let (_dir, store) = migrated_store();
    let seed = AdjustmentSeed {
        team_name: "Chelsea".to_string(),
        season: "2021_2022".to_string(),
        adjustment: -1,
        reason: "late kickoff sanction".to_string(),
    };
    assert!(store.record_adjustment(&seed).unwrap());
    assert!(!store.record_adjustment(&seed).unwrap());

    let table = store.standings_adjusted("2021_2022").unwrap();
    let chelsea = table.iter().find(|r| r.team == "Chelsea").unwrap();
    assert_eq!(chelsea.points, 4);
    assert_eq!(chelsea.points_adjustment, -1);
    assert_eq!(chelsea.position, 2);

    // Seeded at migration time already.
    assert!(!store.record_adjustment(&default_adjustments()[0]).unwrap());
}

#[test]
fn recording_for_unknown_team_fails() {
    let (_dir, store) = migrated_store();
    let seed = AdjustmentSeed {
        team_name: "Wigan".to_string(),
        season: "2021_2022".to_string(),
        adjustment: -9,
        reason: "administration".to_string(),
    };
    assert!(matches!(
        store.record_adjustment(&seed),
        Err(LedgerError::Referential { .. })
    ));
}

#[test]
fn failed_migration_keeps_previous_contents() {
    let (_dir, store) = migrated_store();
    let mut broken = sample_ledger();
    broken.match_team_stats.truncate(5);
    assert!(store.migrate(&broken).is_err());
    assert_eq!(store.all_matches().unwrap().len(), 12);
    assert_eq!(store.team_match_stats(None).unwrap().len(), 24);
}

#[test]
fn failure_inside_the_transaction_rolls_back() {
    let (_dir, store) = migrated_store();
    let mut clashing = sample_ledger();
    clashing.teams[1].name = clashing.teams[0].name.clone();
    clashing.check_integrity().unwrap();

    assert!(matches!(
        store.migrate(&clashing),
        Err(LedgerError::Storage(_))
    ));
    assert_eq!(store.all_matches().unwrap().len(), 12);
    assert_eq!(store.teams().unwrap().len(), 6);
    assert_eq!(store.points_adjustments("2023_2024").unwrap().len(), 3);
    assert_eq!(store.standings_adjusted("2023_2024").unwrap()[3].team, "Everton");
}

#[test]
fn remigrating_resets_recorded_adjustments_to_seeds() {
    let (_dir, store) = migrated_store();
    let seed = AdjustmentSeed {
        team_name: "Chelsea".to_string(),
        season: "2021_2022".to_string(),
        adjustment: -1,
        reason: "late kickoff sanction".to_string(),
    };
    assert!(store.record_adjustment(&seed).unwrap());
    assert_eq!(store.points_adjustments("2021_2022").unwrap().len(), 1);

    store.migrate(&sample_ledger()).unwrap();
    assert!(store.points_adjustments("2021_2022").unwrap().is_empty());
    assert_eq!(store.points_adjustments("2023_2024").unwrap().len(), 3);
}

#[test]
fn open_creates_missing_parent_directories() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("cache").join("ledger.sqlite");
    let store = LedgerStore::open_path(&path, 1).unwrap();
    store.migrate(&sample_ledger()).unwrap();
    assert!(path.exists());
}

#[test]
fn open_fails_when_parent_is_a_file() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"not a directory").unwrap();
    assert!(matches!(
        LedgerStore::open_path(&blocker.join("ledger.sqlite"), 1),
        Err(LedgerError::Io(_))
    ));
}

#[test]
fn cloned_handles_share_the_pool() {
    let (_dir, store) = migrated_store();
    std::thread::scope(|scope| {
        let handles: Vec<_> = ["2021_2022", "2023_2024"]
            .into_iter()
            .map(|season| {
                let store = store.clone();
                scope.spawn(move || store.season_matches(season).map(|m| m.len()).unwrap_or(0))
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 6);
        }
    });
}

use std::path::PathBuf;

use chrono::NaiveDate;
use tempfile::TempDir;

use pl_ledger::export::{export_league_table, export_outcome, export_standings};
use pl_ledger::query::QueryRequest;
use pl_ledger::router::answer;
use pl_ledger::store::LedgerStore;
use pl_ledger::transform::{build_ledger, default_adjustments, read_flat_csv};

fn migrated_store(dir: &TempDir) -> LedgerStore {
    let mut csv = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    csv.push("tests");
    csv.push("fixtures");
    csv.push("sample_matches.csv");
    let records = read_flat_csv(&csv).expect("fixture should parse");
    let ledger = build_ledger(&records, &default_adjustments(), "E0", "Premier League").unwrap();
    let store = LedgerStore::open_path(&dir.path().join("ledger.sqlite"), 1).unwrap();
    store.migrate(&ledger).unwrap();
    store
}

#[test]
fn exports_adjusted_standings_workbook() {
    let dir = TempDir::new().unwrap();
    let store = migrated_store(&dir);
    let standings = store.standings_adjusted("2023_2024").unwrap();

    let path = dir.path().join("standings.xlsx");
    let report = export_standings(&path, &standings).unwrap();
    assert_eq!(report.sheets, ["Standings"]);
    assert_eq!(report.rows, 4);
    assert!(std::fs::metadata(&path).unwrap().len() > 0);
}

#[test]
fn exports_results_only_table_as_of_a_date() {
    let dir = TempDir::new().unwrap();
    let store = migrated_store(&dir);
    let cutoff = NaiveDate::from_ymd_opt(2023, 8, 19).unwrap();
    let table = store.standings_raw("2023_2024", Some(cutoff)).unwrap();

    let path = dir.path().join("as_of.xlsx");
    let report = export_league_table(&path, &table).unwrap();
    assert_eq!(report.sheets, ["Standings"]);
    assert_eq!(report.rows, 4);
    assert!(path.exists());
}

#[test]
fn exports_team_stats_and_form_for_single_team() {
    let dir = TempDir::new().unwrap();
    let store = migrated_store(&dir);
    let request = QueryRequest::from_json(
        r#"{"query_type": "single_team", "teams": ["Everton"], "season": "2023_2024"}"#,
    )
    .unwrap();
    let outcome = answer(&store, &request).unwrap();

    let path = dir.path().join("everton.xlsx");
    let report = export_outcome(&path, &outcome).unwrap();
    assert_eq!(report.sheets, ["TeamStats", "Form"]);
    assert_eq!(report.rows, 1 + 3);
    assert!(path.exists());
}

#[test]
fn exports_head_to_head_sheet() {
    let dir = TempDir::new().unwrap();
    let store = migrated_store(&dir);
    let request = QueryRequest::from_json(
        r#"{"query_type": "head_to_head", "teams": ["Everton", "Nott'm Forest"], "season": "all"}"#,
    )
    .unwrap();
    let outcome = answer(&store, &request).unwrap();

    let report = export_outcome(&dir.path().join("h2h.xlsx"), &outcome).unwrap();
    assert_eq!(report.sheets, ["HeadToHead"]);
    assert_eq!(report.rows, 2);
}

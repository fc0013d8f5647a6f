use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use pl_ledger::config::LedgerConfig;
use pl_ledger::export::export_outcome;
use pl_ledger::query::QueryRequest;
use pl_ledger::router::answer;
use pl_ledger::store::LedgerStore;

fn main() -> Result<()> {
    env_logger::init();

    let descriptor_path = parse_path_arg("--query")
        .ok_or_else(|| anyhow!("--query <descriptor.json> is required"))?;
    let raw = std::fs::read_to_string(&descriptor_path)
        .with_context(|| format!("reading {}", descriptor_path.display()))?;
    let request = QueryRequest::from_json(&raw).context("validating query descriptor")?;

    let mut config = LedgerConfig::from_env().context("unable to resolve sqlite path")?;
    if let Some(db_path) = parse_path_arg("--db") {
        config = config.with_db_path(db_path);
    }
    let store = LedgerStore::open(&config).context("opening ledger store")?;

    let outcome = answer(&store, &request).context("answering query")?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);

    if let Some(xlsx_path) = parse_path_arg("--xlsx") {
        let report = export_outcome(&xlsx_path, &outcome)
            .with_context(|| format!("writing {}", xlsx_path.display()))?;
        eprintln!(
            "Wrote {} ({} rows, sheets: {})",
            xlsx_path.display(),
            report.rows,
            report.sheets.join(", ")
        );
    }

    Ok(())
}

fn parse_path_arg(name: &str) -> Option<PathBuf> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(path) = arg.strip_prefix(&format!("{name}=")) {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }
        if arg == name {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(PathBuf::from(next));
            }
        }
    }
    None
}

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use pl_ledger::config::LedgerConfig;
use pl_ledger::store::LedgerStore;
use pl_ledger::transform::{
    applicable_adjustments, build_ledger, default_adjustments, read_flat_csv, read_season_csv,
};

fn main() -> Result<()> {
    env_logger::init();

    let csv_path = parse_path_arg("--csv").ok_or_else(|| anyhow!("--csv <path> is required"))?;
    let season = parse_string_arg("--season");
    let strict = has_flag("--strict-adjustments");

    let mut config = LedgerConfig::from_env().context("unable to resolve sqlite path")?;
    if let Some(db_path) = parse_path_arg("--db") {
        config = config.with_db_path(db_path);
    }

    let records = match season.as_deref() {
        Some(season) => read_season_csv(&csv_path, season),
        None => read_flat_csv(&csv_path),
    }
    .with_context(|| format!("reading {}", csv_path.display()))?;

    let seeds = if strict {
        default_adjustments()
    } else {
        applicable_adjustments(&default_adjustments(), &records)
    };

    let ledger = build_ledger(&records, &seeds, &config.league_code, &config.league_name)
        .context("transforming match records")?;
    let store = LedgerStore::open(&config).context("opening ledger store")?;
    let report = store.migrate(&ledger).context("migrating ledger")?;

    println!("Ledger migration complete");
    println!("DB: {}", config.db_path.display());
    println!("Teams: {}", report.teams);
    println!("Referees: {}", report.referees);
    println!("Seasons: {}", report.seasons);
    println!("Matches: {}", report.matches);
    println!("Match team stats: {}", report.match_team_stats);
    println!("Points adjustments: {}", report.points_adjustments);
    println!("Fingerprint: {}", report.fingerprint);

    for season in store.seasons()? {
        println!(
            "season {}: {} to {}",
            season.label, season.start_date, season.end_date
        );
    }

    Ok(())
}

fn parse_path_arg(name: &str) -> Option<PathBuf> {
    parse_string_arg(name).map(PathBuf::from)
}

fn parse_string_arg(name: &str) -> Option<String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&format!("{name}=")) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == name {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(next.trim().to_string());
            }
        }
    }
    None
}

fn has_flag(name: &str) -> bool {
    std::env::args().skip(1).any(|arg| arg == name)
}

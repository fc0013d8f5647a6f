use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;

use pl_ledger::config::LedgerConfig;
use pl_ledger::export::{export_league_table, export_standings};
use pl_ledger::store::LedgerStore;

fn main() -> Result<()> {
    env_logger::init();

    let season = parse_arg("--season").ok_or_else(|| anyhow!("--season <label> is required"))?;
    let as_of = parse_arg("--as-of")
        .map(|raw| {
            NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
                .with_context(|| format!("--as-of expects YYYY-MM-DD, got {raw:?}"))
        })
        .transpose()?;

    let mut config = LedgerConfig::from_env().context("unable to resolve sqlite path")?;
    if let Some(db_path) = parse_arg("--db").map(PathBuf::from) {
        config = config.with_db_path(db_path);
    }
    let store = LedgerStore::open(&config).context("opening ledger store")?;

    let raw = store
        .standings_raw(&season, as_of)
        .with_context(|| format!("computing raw standings for {season}"))?;

    if let Some(cutoff) = as_of {
        // Adjustments only exist for whole seasons.
        println!("Standings {season} as of {cutoff} (results only)");
        println!("{:>3}  {:<24} {:>3} {:>4} {:>4}", "Pos", "Team", "P", "GD", "Pts");
        for entry in &raw {
            println!(
                "{:>3}  {:<24} {:>3} {:>4} {:>4}",
                entry.position,
                entry.stats.team,
                entry.stats.matches_played,
                entry.stats.goal_difference,
                entry.stats.points
            );
        }
        if let Some(xlsx_path) = parse_arg("--xlsx").map(PathBuf::from) {
            export_league_table(&xlsx_path, &raw)
                .with_context(|| format!("writing {}", xlsx_path.display()))?;
            eprintln!("Wrote {}", xlsx_path.display());
        }
        return Ok(());
    }

    let adjusted = store
        .standings_adjusted(&season)
        .with_context(|| format!("loading adjusted standings for {season}"))?;
    let raw_positions: HashMap<&str, (u32, u32)> = raw
        .iter()
        .map(|e| (e.stats.team.as_str(), (e.position, e.stats.points)))
        .collect();

    println!("Standings {season}");
    println!(
        "{:>3}  {:<24} {:>3} {:>4} {:>4} {:>4}   {:>7} {:>7}",
        "Pos", "Team", "P", "GD", "Pts", "Adj", "RawPos", "RawPts"
    );
    for row in &adjusted {
        let (raw_pos, raw_pts) = raw_positions
            .get(row.team.as_str())
            .copied()
            .unwrap_or_default();
        println!(
            "{:>3}  {:<24} {:>3} {:>4} {:>4} {:>4}   {:>7} {:>7}",
            row.position,
            row.team,
            row.played,
            row.goal_difference,
            row.points,
            row.points_adjustment,
            raw_pos,
            raw_pts
        );
    }

    for seed in store.points_adjustments(&season)? {
        println!("  {} {:+}: {}", seed.team_name, seed.adjustment, seed.reason);
    }

    if let Some(xlsx_path) = parse_arg("--xlsx").map(PathBuf::from) {
        export_standings(&xlsx_path, &adjusted)
            .with_context(|| format!("writing {}", xlsx_path.display()))?;
        eprintln!("Wrote {}", xlsx_path.display());
    }

    Ok(())
}

fn parse_arg(name: &str) -> Option<String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&format!("{name}=")) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == name
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(next.trim().to_string());
        }
    }
    None
}

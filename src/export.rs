use std::path::Path;

use log::info;
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::aggregation::{FormRecord, HeadToHeadRecord, LeagueTableEntry, TeamStats};
use crate::error::Result;
use crate::model::StandingRow;
use crate::router::{Analysis, QueryOutcome};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    pub sheets: Vec<&'static str>,
    pub rows: usize,
}

/// Writes whichever tables `outcome` carries to an `.xlsx` workbook.
pub fn export_outcome(path: &Path, outcome: &QueryOutcome) -> Result<ExportReport> {
    let mut sheets: Vec<(&'static str, Vec<Vec<String>>)> = Vec::new();

    match &outcome.analysis {
        Analysis::SingleTeam { team_stats, form } | Analysis::Trend { team_stats, form } => {
            sheets.push(("TeamStats", team_stats_rows(std::iter::once(team_stats))));
            sheets.push(("Form", form_rows(form)));
        }
        Analysis::Comparison { comparison } => {
            sheets.push(("TeamStats", team_stats_rows(comparison.values())));
        }
        Analysis::HeadToHead { head_to_head } => {
            sheets.push(("HeadToHead", head_to_head_rows(head_to_head)));
        }
        Analysis::LeagueTable { league_table } => {
            sheets.push(("Standings", league_table_rows(league_table)));
        }
        Analysis::TopPerformers { top_performers } => {
            let mut rows = vec![vec!["Rank".to_string(), "Value".to_string()]];
            rows[0].extend(team_stats_header());
            for p in top_performers {
                let mut row = vec![p.rank.to_string(), p.value.to_string()];
                row.extend(team_stats_cells(&p.stats));
                rows.push(row);
            }
            sheets.push(("TopPerformers", rows));
        }
    }

    write_workbook(path, sheets)
}

pub fn export_standings(path: &Path, standings: &[StandingRow]) -> Result<ExportReport> {
    let mut rows = vec![
        [
            "Pos", "Season", "Team", "P", "W", "D", "L", "GF", "GA", "GD", "Pts", "Adj",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>(),
    ];
    for s in standings {
        rows.push(vec![
            s.position.to_string(),
            s.season.clone(),
            s.team.clone(),
            s.played.to_string(),
            s.won.to_string(),
            s.drawn.to_string(),
            s.lost.to_string(),
            s.goals_for.to_string(),
            s.goals_against.to_string(),
            s.goal_difference.to_string(),
            s.points.to_string(),
            s.points_adjustment.to_string(),
        ]);
    }
    write_workbook(path, vec![("Standings", rows)])
}

/// Results-only standings, as computed from fixtures.
pub fn export_league_table(path: &Path, table: &[LeagueTableEntry]) -> Result<ExportReport> {
    write_workbook(path, vec![("Standings", league_table_rows(table))])
}

fn write_workbook(
    path: &Path,
    sheets: Vec<(&'static str, Vec<Vec<String>>)>,
) -> Result<ExportReport> {
    let mut workbook = Workbook::new();
    let mut report = ExportReport {
        sheets: Vec::with_capacity(sheets.len()),
        rows: 0,
    };
    for (name, rows) in &sheets {
        let sheet = workbook.add_worksheet();
        sheet.set_name(*name)?;
        write_rows(sheet, rows)?;
        report.sheets.push(*name);
        report.rows += rows.len().saturating_sub(1);
    }
    workbook.save(path)?;
    info!(
        "Exported {} rows across {} sheets to {}",
        report.rows,
        report.sheets.len(),
        path.display()
    );
    Ok(report)
}

fn team_stats_header() -> Vec<String> {
    [
        "Team", "MP", "W", "D", "L", "GF", "GA", "GD", "Pts", "Win Rate", "PPG", "GPG",
        "Clean Sheets", "Shots", "Shots on Target", "Home W-D-L", "Away W-D-L",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn team_stats_cells(s: &TeamStats) -> Vec<String> {
    vec![
        s.team.clone(),
        s.matches_played.to_string(),
        s.wins.to_string(),
        s.draws.to_string(),
        s.losses.to_string(),
        s.goals_scored.to_string(),
        s.goals_conceded.to_string(),
        s.goal_difference.to_string(),
        s.points.to_string(),
        format!("{:.3}", s.win_rate),
        format!("{:.2}", s.points_per_game),
        format!("{:.2}", s.goals_per_game),
        s.clean_sheets.to_string(),
        s.shots.to_string(),
        s.shots_on_target.to_string(),
        format!(
            "{}-{}-{}",
            s.home_record.wins, s.home_record.draws, s.home_record.losses
        ),
        format!(
            "{}-{}-{}",
            s.away_record.wins, s.away_record.draws, s.away_record.losses
        ),
    ]
}

fn team_stats_rows<'a>(stats: impl Iterator<Item = &'a TeamStats>) -> Vec<Vec<String>> {
    let mut rows = vec![team_stats_header()];
    rows.extend(stats.map(team_stats_cells));
    rows
}

fn league_table_rows(table: &[LeagueTableEntry]) -> Vec<Vec<String>> {
    let mut rows = vec![vec!["Pos".to_string()]];
    rows[0].extend(team_stats_header());
    for entry in table {
        let mut row = vec![entry.position.to_string()];
        row.extend(team_stats_cells(&entry.stats));
        rows.push(row);
    }
    rows
}

fn form_rows(form: &FormRecord) -> Vec<Vec<String>> {
    let mut rows = vec![
        ["Date", "Opponent", "Venue", "Result", "Score", "Running Pts"]
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>(),
    ];
    for e in &form.recent_results {
        rows.push(vec![
            e.date.format("%Y-%m-%d").to_string(),
            e.opponent.clone(),
            match e.venue {
                crate::aggregation::Venue::Home => "H".to_string(),
                crate::aggregation::Venue::Away => "A".to_string(),
            },
            e.result.letter().to_string(),
            e.score.clone(),
            e.running_points.to_string(),
        ]);
    }
    rows
}

fn head_to_head_rows(h2h: &HeadToHeadRecord) -> Vec<Vec<String>> {
    vec![
        vec![
            "Team".to_string(),
            "Wins".to_string(),
            "Draws".to_string(),
            "Goals".to_string(),
            "Matches".to_string(),
        ],
        vec![
            h2h.team_a.clone(),
            h2h.team_a_wins.to_string(),
            h2h.draws.to_string(),
            h2h.team_a_goals.to_string(),
            h2h.total_matches.to_string(),
        ],
        vec![
            h2h.team_b.clone(),
            h2h.team_b_wins.to_string(),
            h2h.draws.to_string(),
            h2h.team_b_goals.to_string(),
            h2h.total_matches.to_string(),
        ],
    ]
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet.write_string(row_idx as u32, col_idx as u16, value)?;
        }
    }
    Ok(())
}

use chrono::{NaiveDate, NaiveTime};

use pl_ledger::aggregation::{
    Venue, compare_teams, compute_head_to_head, compute_league_table, compute_team_form,
    compute_team_stats, compute_top_performers,
};
use pl_ledger::error::LedgerError;
use pl_ledger::model::{MatchOutcome, MatchRow, TeamResult};

fn fixture(id: u32, date: (i32, u32, u32), home: &str, away: &str, hg: u16, ag: u16) -> MatchRow {
    MatchRow {
        match_id: id,
        season: "2021_2022".to_string(),
        date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
        kickoff_time: None,
        home_team: home.to_string(),
        away_team: away.to_string(),
        referee: "M Oliver".to_string(),
        ft_home_goals: hg,
        ft_away_goals: ag,
        ft_result: MatchOutcome::from_goals(hg, ag),
        ht_home_goals: 0,
        ht_away_goals: 0,
        ht_result: MatchOutcome::Draw,
        home_shots: 10,
        away_shots: 5,
        home_shots_on_target: 4,
        away_shots_on_target: 2,
    }
}

fn opening_weeks() -> Vec<MatchRow> {
    vec![
        fixture(1, (2021, 8, 13), "Brentford", "Arsenal", 2, 0),
        fixture(2, (2021, 8, 14), "Chelsea", "Liverpool", 1, 1),
        fixture(3, (2021, 8, 21), "Arsenal", "Chelsea", 0, 2),
        fixture(4, (2021, 8, 21), "Liverpool", "Brentford", 2, 0),
        fixture(5, (2021, 8, 28), "Liverpool", "Arsenal", 3, 1),
        fixture(6, (2021, 8, 28), "Brentford", "Chelsea", 0, 0),
    ]
}

#[test]
fn single_home_win_scores_both_sides() {
    let matches = vec![fixture(1, (2021, 8, 13), "Brentford", "Arsenal", 2, 0)];

    let brentford = compute_team_stats(&matches, "Brentford");
    assert_eq!(brentford.matches_played, 1);
    assert_eq!(brentford.wins, 1);
    assert_eq!(brentford.points, 3);
    assert_eq!(brentford.goals_scored, 2);
    assert_eq!(brentford.goals_conceded, 0);
    assert_eq!(brentford.clean_sheets, 1);
    assert_eq!(brentford.win_rate, 1.0);
    assert_eq!(brentford.points_per_game, 3.0);
    assert_eq!(brentford.home_record.wins, 1);

    let arsenal = compute_team_stats(&matches, "Arsenal");
    assert_eq!(arsenal.losses, 1);
    assert_eq!(arsenal.points, 0);
    assert_eq!(arsenal.goal_difference, -2);
    assert_eq!(arsenal.clean_sheets, 0);
    assert_eq!(arsenal.away_record.losses, 1);
}

#[test]
fn team_stats_are_internally_consistent() {
    let matches = opening_weeks();
    for team in ["Arsenal", "Brentford", "Chelsea", "Liverpool"] {
        let s = compute_team_stats(&matches, team);
        assert_eq!(s.wins + s.draws + s.losses, s.matches_played, "{team}");
        assert_eq!(s.points, 3 * s.wins + s.draws, "{team}");
        assert_eq!(
            s.goal_difference,
            s.goals_scored as i32 - s.goals_conceded as i32,
            "{team}"
        );
        assert!(s.clean_sheets <= s.matches_played, "{team}");
        assert_eq!(
            s.home_record.played() + s.away_record.played(),
            s.matches_played
        );
    }
}

#[test]
fn rates_are_rounded() {
    let brentford = compute_team_stats(&opening_weeks(), "Brentford");
    assert_eq!(brentford.points, 4);
    assert_eq!(brentford.win_rate, 0.333);
    assert_eq!(brentford.points_per_game, 1.33);
    assert_eq!(brentford.goals_per_game, 0.67);
    assert_eq!(brentford.shots, 10 + 5 + 10);
}

#[test]
fn unknown_team_and_empty_input_give_zeroes() {
    let stats = compute_team_stats(&opening_weeks(), "Wigan");
    assert_eq!(stats.matches_played, 0);
    assert_eq!(stats.win_rate, 0.0);
    assert_eq!(stats.points_per_game, 0.0);

    assert!(compute_league_table(&[]).is_empty());
    let form = compute_team_form(&[], "Arsenal", 5);
    assert_eq!(form.form_string, "");
    assert_eq!(form.form_points, 0);
    assert!(compute_top_performers(&[], "points", 5).unwrap().is_empty());
}

#[test]
fn league_table_orders_by_points_then_goal_difference_then_goals() {
    let table = compute_league_table(&opening_weeks());
    let order: Vec<&str> = table.iter().map(|e| e.stats.team.as_str()).collect();
    assert_eq!(order, ["Liverpool", "Chelsea", "Brentford", "Arsenal"]);
    for (idx, entry) in table.iter().enumerate() {
        assert_eq!(entry.position, idx as u32 + 1);
    }
    for pair in table.windows(2) {
        let (a, b) = (&pair[0].stats, &pair[1].stats);
        let key_a = (a.points, a.goal_difference, a.goals_scored);
        let key_b = (b.points, b.goal_difference, b.goals_scored);
        assert!(key_a >= key_b);
    }
}

#[test]
fn goals_scored_breaks_goal_difference_ties() {
    let matches = vec![
        fixture(1, (2022, 1, 1), "Leeds", "Wolves", 3, 2),
        fixture(2, (2022, 1, 2), "Fulham", "Wolves", 1, 0),
    ];
    let table = compute_league_table(&matches);
    assert_eq!(table[0].stats.team, "Leeds");
    assert_eq!(table[1].stats.team, "Fulham");
    assert_eq!(table[0].stats.goal_difference, table[1].stats.goal_difference);
}

#[test]
fn league_points_total_matches_results() {
    let matches = opening_weeks();
    let table = compute_league_table(&matches);
    let total: u32 = table.iter().map(|e| e.stats.points).sum();
    let expected: u32 = matches
        .iter()
        .map(|m| match m.ft_result {
            MatchOutcome::Draw => 2,
            _ => 3,
        })
        .sum();
    assert_eq!(total, expected);
}

#[test]
fn form_is_newest_first_with_running_points() {
    let form = compute_team_form(&opening_weeks(), "Liverpool", 5);
    assert_eq!(form.form_string, "WWD");
    assert_eq!(form.form_points, 7);
    let running: Vec<u32> = form.recent_results.iter().map(|e| e.running_points).collect();
    assert_eq!(running, [3, 6, 7]);
    assert_eq!(form.recent_results[0].opponent, "Arsenal");
    assert_eq!(form.recent_results[0].score, "3-1");
    assert_eq!(form.recent_results[0].venue, Venue::Home);
    assert_eq!(form.recent_results[2].venue, Venue::Away);
    assert_eq!(form.recent_results[2].result, TeamResult::Draw);
}

#[test]
fn form_window_ignores_input_order() {
    let mut matches = opening_weeks();
    matches.reverse();
    let form = compute_team_form(&matches, "Arsenal", 2);
    assert_eq!(form.form_string, "LL");
    assert_eq!(form.recent_results[0].opponent, "Liverpool");
    assert_eq!(form.recent_results[1].opponent, "Chelsea");
}

#[test]
fn same_day_fixtures_order_by_kickoff() {
    let mut early = fixture(1, (2022, 3, 5), "Leeds", "Wolves", 0, 1);
    let mut late = fixture(2, (2022, 3, 5), "Wolves", "Fulham", 2, 2);
    early.kickoff_time = NaiveTime::from_hms_opt(12, 30, 0);
    late.kickoff_time = NaiveTime::from_hms_opt(17, 30, 0);
    let form = compute_team_form(&[late, early], "Wolves", 5);
    assert_eq!(form.form_string, "DW");
}

#[test]
fn top_performers_rank_by_metric() {
    let top = compute_top_performers(&opening_weeks(), "goals_scored", 2).unwrap();
    assert_eq!(top.len(), 2);
    assert_eq!(top[0].stats.team, "Liverpool");
    assert_eq!(top[0].value, 6.0);
    assert_eq!(top[0].rank, 1);
    assert_eq!(top[1].stats.team, "Chelsea");
    assert_eq!(top[1].rank, 2);

    let all = compute_top_performers(&opening_weeks(), "clean_sheets", 10).unwrap();
    assert_eq!(all.len(), 4);
}

#[test]
fn top_performer_ties_keep_name_order() {
    let top = compute_top_performers(&opening_weeks(), "matches_played", 4).unwrap();
    let names: Vec<&str> = top.iter().map(|p| p.stats.team.as_str()).collect();
    assert_eq!(names, ["Arsenal", "Brentford", "Chelsea", "Liverpool"]);
}

#[test]
fn unknown_metric_is_rejected() {
    let err = compute_top_performers(&opening_weeks(), "possession", 3).unwrap_err();
    assert!(matches!(err, LedgerError::InvalidMetric(ref m) if m == "possession"));
}

#[test]
fn comparison_keys_every_requested_team() {
    let comparison = compare_teams(&opening_weeks(), &["Chelsea", "Arsenal", "Wigan"]);
    assert_eq!(comparison.len(), 3);
    assert_eq!(comparison["Chelsea"].points, 5);
    assert_eq!(comparison["Arsenal"].points, 0);
    assert_eq!(comparison["Wigan"].matches_played, 0);
}

#[test]
fn head_to_head_counts_both_venues() {
    let matches = vec![
        fixture(1, (2021, 8, 13), "Brentford", "Arsenal", 2, 0),
        fixture(2, (2022, 2, 19), "Arsenal", "Brentford", 2, 1),
        fixture(3, (2022, 11, 1), "Arsenal", "Brentford", 1, 1),
    ];
    let h2h = compute_head_to_head(&matches, "Arsenal", "Brentford").unwrap();
    assert_eq!(h2h.total_matches, 3);
    assert_eq!(h2h.team_a_wins, 1);
    assert_eq!(h2h.team_b_wins, 1);
    assert_eq!(h2h.draws, 1);
    assert_eq!(h2h.team_a_goals, 3);
    assert_eq!(h2h.team_b_goals, 4);
    assert_eq!(h2h.team_a_wins + h2h.team_b_wins + h2h.draws, h2h.total_matches);
}

#[test]
fn head_to_head_without_meetings_is_all_zero() {
    let h2h = compute_head_to_head(&[], "Arsenal", "Brentford").unwrap();
    assert_eq!(h2h.total_matches, 0);
    assert_eq!(h2h.team_a, "Arsenal");
    assert_eq!(h2h.team_b, "Brentford");
    assert_eq!(h2h.team_a_goals + h2h.team_b_goals, 0);
}

#[test]
fn head_to_head_rejects_unrelated_fixtures() {
    let err = compute_head_to_head(&opening_weeks(), "Arsenal", "Brentford").unwrap_err();
    assert!(matches!(err, LedgerError::PreconditionViolated(_)));
}

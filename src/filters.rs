use chrono::NaiveDate;
use log::info;

use crate::model::MatchRow;

/// Matches involving any of `teams`. An empty list keeps everything.
pub fn filter_by_teams<S: AsRef<str>>(matches: Vec<MatchRow>, teams: &[S]) -> Vec<MatchRow> {
    if teams.is_empty() {
        return matches;
    }
    let filtered: Vec<MatchRow> = matches
        .into_iter()
        .filter(|m| teams.iter().any(|t| m.involves(t.as_ref())))
        .collect();
    info!("Filtered to {} matches for {} teams", filtered.len(), teams.len());
    filtered
}

/// Only fixtures between `team` and `opponent`, either venue.
pub fn filter_by_opponent(matches: Vec<MatchRow>, team: &str, opponent: &str) -> Vec<MatchRow> {
    let filtered: Vec<MatchRow> = matches
        .into_iter()
        .filter(|m| m.is_between(team, opponent))
        .collect();
    info!(
        "Found {} matches between {} and {}",
        filtered.len(),
        team,
        opponent
    );
    filtered
}

/// Inclusive on both ends; a missing bound is open.
pub fn filter_by_date_range(
    matches: Vec<MatchRow>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Vec<MatchRow> {
    matches
        .into_iter()
        .filter(|m| start.is_none_or(|s| m.date >= s))
        .filter(|m| end.is_none_or(|e| m.date <= e))
        .collect()
}

/// The newest `n` matches (for `team`, if given), newest first.
pub fn last_n_matches(matches: Vec<MatchRow>, team: Option<&str>, n: usize) -> Vec<MatchRow> {
    let mut out: Vec<MatchRow> = match team {
        Some(team) => matches.into_iter().filter(|m| m.involves(team)).collect(),
        None => matches,
    };
    out.sort_by(|a, b| a.recency_cmp(b));
    out.truncate(n);
    match team {
        Some(team) => info!("Retrieved last {n} matches for {team}"),
        None => info!("Retrieved last {n} matches"),
    }
    out
}

/// Newest first, the order form and recent-results views expect.
pub fn sort_newest_first(matches: &mut [MatchRow]) {
    matches.sort_by(|a, b| a.recency_cmp(b));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MatchOutcome;

    fn row(id: u32, day: u32, home: &str, away: &str) -> MatchRow {
        MatchRow {
            match_id: id,
            season: "2022_2023".to_string(),
            date: NaiveDate::from_ymd_opt(2022, 9, day).unwrap(),
            kickoff_time: None,
            home_team: home.to_string(),
            away_team: away.to_string(),
            referee: "S Hooper".to_string(),
            ft_home_goals: 1,
            ft_away_goals: 0,
            ft_result: MatchOutcome::Home,
            ht_home_goals: 0,
            ht_away_goals: 0,
            ht_result: MatchOutcome::Draw,
            home_shots: 0,
            away_shots: 0,
            home_shots_on_target: 0,
            away_shots_on_target: 0,
        }
    }

    fn sample() -> Vec<MatchRow> {
        vec![
            row(1, 3, "Leeds", "Wolves"),
            row(2, 10, "Fulham", "Leeds"),
            row(3, 17, "Wolves", "Fulham"),
            row(4, 24, "Leeds", "Fulham"),
        ]
    }

    #[test]
    fn date_range_bounds_are_inclusive_and_optional() {
        let start = NaiveDate::from_ymd_opt(2022, 9, 10);
        let end = NaiveDate::from_ymd_opt(2022, 9, 17);
        assert_eq!(filter_by_date_range(sample(), start, end).len(), 2);
        assert_eq!(filter_by_date_range(sample(), start, None).len(), 3);
        assert_eq!(filter_by_date_range(sample(), None, None).len(), 4);
    }

    #[test]
    fn last_n_is_newest_first() {
        let ids: Vec<u32> = last_n_matches(sample(), Some("Leeds"), 2)
            .iter()
            .map(|m| m.match_id)
            .collect();
        assert_eq!(ids, [4, 2]);
        assert_eq!(last_n_matches(sample(), None, 10).len(), 4);
    }

    #[test]
    fn empty_team_list_keeps_everything() {
        let none: [&str; 0] = [];
        assert_eq!(filter_by_teams(sample(), &none).len(), 4);
        assert_eq!(filter_by_teams(sample(), &["Wolves"]).len(), 2);
        assert_eq!(filter_by_opponent(sample(), "Fulham", "Leeds").len(), 2);
    }
}

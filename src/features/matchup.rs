//! Match feature builder
//!
//! Builds the symmetric per-matchup feature row: each side's aggregated
//! player stats and season totals under `A_`/`B_` prefixes, plus a
//! `diff_` column per underlying stat. The diff is always the literal
//! subtraction of the two sibling columns, never computed independently.

use crate::features::aggregate::{aggregate_team_players, SeasonTable, IMPACT_KEYS};
use crate::rating::engine::PlayerRating;

/// An ordered list of named feature values for one matchup
#[derive(Debug, Clone, Default)]
pub struct FeatureRow {
    names: Vec<String>,
    values: Vec<f64>,
}

impl FeatureRow {
    pub fn push(&mut self, name: String, value: f64) {
        self.names.push(name);
        self.values.push(value);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.values[i])
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Read-only handles to the tables a matchup feature row is built from
pub struct MatchupContext<'a> {
    pub ratings: &'a [PlayerRating],
    pub season: &'a SeasonTable,
    pub top_n: usize,
}

impl<'a> MatchupContext<'a> {
    pub fn new(ratings: &'a [PlayerRating], season: &'a SeasonTable, top_n: usize) -> Self {
        MatchupContext {
            ratings,
            season,
            top_n,
        }
    }

    /// Build the feature row for team A (home side) vs team B (away side).
    ///
    /// Deterministic, and symmetric under team swap up to sign: swapping
    /// the arguments swaps every `A_`/`B_` pair and negates every `diff_`
    /// column.
    pub fn build(&self, team_a: &str, team_b: &str) -> FeatureRow {
        let a_players = aggregate_team_players(self.ratings, team_a, self.top_n);
        let b_players = aggregate_team_players(self.ratings, team_b, self.top_n);
        let a_season = self.season.get(team_a);
        let b_season = self.season.get(team_b);
        let season_keys = self.season.feature_keys();

        let mut row = FeatureRow::default();
        for (key, value) in IMPACT_KEYS.iter().zip(a_players.values()) {
            row.push(format!("A_{}", key), value);
        }
        for (key, value) in IMPACT_KEYS.iter().zip(b_players.values()) {
            row.push(format!("B_{}", key), value);
        }
        for (key, value) in season_keys.iter().zip(a_season.iter()) {
            row.push(format!("A_{}", key), *value);
        }
        for (key, value) in season_keys.iter().zip(b_season.iter()) {
            row.push(format!("B_{}", key), *value);
        }

        // Diffs come from the stored sibling columns: single source of truth
        let diff_keys: Vec<String> = IMPACT_KEYS
            .iter()
            .map(|k| k.to_string())
            .chain(season_keys)
            .collect();
        for key in diff_keys {
            let a = row.get(&format!("A_{}", key)).unwrap_or(f64::NAN);
            let b = row.get(&format!("B_{}", key)).unwrap_or(f64::NAN);
            row.push(format!("diff_{}", key), a - b);
        }

        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rating::categories::NUM_CATEGORIES;
    use crate::rating::engine::CategoryScore;
    use crate::rating::Position;

    fn rating(name: &str, team: &str, impact: f64) -> PlayerRating {
        PlayerRating {
            name: name.to_string(),
            team: team.to_string(),
            position_label: "Outside Hitter".to_string(),
            position: Position::OutsideHitter,
            categories: [CategoryScore::default(); NUM_CATEGORIES],
            positional_rating: impact,
        }
    }

    fn fixture() -> (Vec<PlayerRating>, SeasonTable) {
        let ratings = vec![
            rating("A1", "Poland", 100.0),
            rating("A2", "Poland", 80.0),
            rating("B1", "Italy", 90.0),
            rating("B2", "Italy", 70.0),
        ];
        let season = SeasonTable::new(
            vec!["Wins".to_string()],
            vec![
                ("Poland".to_string(), vec![10.0]),
                ("Italy".to_string(), vec![8.0]),
            ],
        );
        (ratings, season)
    }

    #[test]
    fn diff_is_exactly_a_minus_b() {
        let (ratings, season) = fixture();
        let ctx = MatchupContext::new(&ratings, &season, 8);
        let row = ctx.build("Poland", "Italy");

        for name in row.names().to_vec() {
            if let Some(key) = name.strip_prefix("diff_") {
                let a = row.get(&format!("A_{}", key)).unwrap();
                let b = row.get(&format!("B_{}", key)).unwrap();
                let diff = row.get(&name).unwrap();
                if diff.is_nan() {
                    assert!((a - b).is_nan());
                } else {
                    assert!((diff - (a - b)).abs() < 1e-12);
                }
            }
        }
        assert!((row.get("diff_impact_mean").unwrap() - 10.0).abs() < 1e-9);
        assert!((row.get("diff_season_Wins").unwrap() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn swapping_teams_negates_diffs_and_swaps_sides() {
        let (ratings, season) = fixture();
        let ctx = MatchupContext::new(&ratings, &season, 8);
        let forward = ctx.build("Poland", "Italy");
        let reverse = ctx.build("Italy", "Poland");

        for (name, value) in forward.iter() {
            if let Some(key) = name.strip_prefix("diff_") {
                let mirrored = reverse.get(&format!("diff_{}", key)).unwrap();
                if value.is_nan() {
                    assert!(mirrored.is_nan());
                } else {
                    assert!((value + mirrored).abs() < 1e-12);
                }
            } else if let Some(key) = name.strip_prefix("A_") {
                let mirrored = reverse.get(&format!("B_{}", key)).unwrap();
                assert!(value.is_nan() && mirrored.is_nan() || value == mirrored);
            } else if let Some(key) = name.strip_prefix("B_") {
                let mirrored = reverse.get(&format!("A_{}", key)).unwrap();
                assert!(value.is_nan() && mirrored.is_nan() || value == mirrored);
            }
        }
    }

    #[test]
    fn unknown_team_builds_nan_side() {
        let (ratings, season) = fixture();
        let ctx = MatchupContext::new(&ratings, &season, 8);
        let row = ctx.build("Atlantis", "Italy");
        assert!(row.get("A_impact_mean").unwrap().is_nan());
        assert!(row.get("A_season_Wins").unwrap().is_nan());
        assert!(row.get("B_impact_mean").unwrap().is_finite());
    }

    #[test]
    fn column_order_is_deterministic() {
        let (ratings, season) = fixture();
        let ctx = MatchupContext::new(&ratings, &season, 8);
        let first = ctx.build("Poland", "Italy");
        let second = ctx.build("Poland", "Italy");
        assert_eq!(first.names(), second.names());
        assert_eq!(first.names()[0], "A_impact_mean");
    }
}

//! Match-level training dataset
//!
//! Builds the feature matrix, binary labels, grouping keys, and set-score
//! labels from the match table, and pins down the feature schema used to
//! align training-time and inference-time columns.

use crate::features::matchup::{FeatureRow, MatchupContext};
use crate::MatchRecord;
use serde::{Deserialize, Serialize};

/// Ordered feature-column list with an explicit reindex step.
///
/// Reindexing decouples the inference-time row from the training-time
/// schema: columns absent from the row fill with 0, and non-finite values
/// coerce to 0.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureSchema {
    pub columns: Vec<String>,
}

impl FeatureSchema {
    pub fn from_row(row: &FeatureRow) -> Self {
        FeatureSchema {
            columns: row.names().to_vec(),
        }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Values in schema column order, missing and non-finite cells as 0
    pub fn reindex(&self, row: &FeatureRow) -> Vec<f64> {
        self.columns
            .iter()
            .map(|col| coerce(row.get(col).unwrap_or(0.0)))
            .collect()
    }
}

/// NaN and infinities become 0, the fill step every feature vector goes
/// through before it reaches a model
pub fn coerce(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// The assembled training dataset for the outcome classifiers
#[derive(Debug, Clone)]
pub struct MatchDataset {
    pub schema: FeatureSchema,
    /// Row-major coerced feature matrix, one row per match
    pub features: Vec<Vec<f64>>,
    /// 1.0 when the recorded winner is the home team
    pub labels: Vec<f32>,
    /// Grouping key for grouped cross-validation: the home team
    pub groups: Vec<String>,
    /// Set-score label from the winner's perspective, e.g. "3-1"
    pub set_scores: Vec<String>,
    /// Recorded winner names (for the set-score model's one-hot columns)
    pub winners: Vec<String>,
}

impl MatchDataset {
    /// Build the dataset from the match table and the loaded pipeline
    /// tables. Pure function of its inputs.
    pub fn build(matches: &[MatchRecord], ctx: &MatchupContext) -> Self {
        let mut schema: Option<FeatureSchema> = None;
        let mut features = Vec::with_capacity(matches.len());
        let mut labels = Vec::with_capacity(matches.len());
        let mut groups = Vec::with_capacity(matches.len());
        let mut set_scores = Vec::with_capacity(matches.len());
        let mut winners = Vec::with_capacity(matches.len());

        for m in matches {
            let row = ctx.build(&m.home_team, &m.away_team);
            let schema = schema.get_or_insert_with(|| FeatureSchema::from_row(&row));
            features.push(schema.reindex(&row));
            labels.push(if m.home_won() { 1.0 } else { 0.0 });
            groups.push(m.home_team.clone());
            set_scores.push(m.set_score_label());
            winners.push(m.winner.clone());
        }

        log::info!(
            "Built match dataset: {} rows, {} features",
            features.len(),
            schema.as_ref().map(|s| s.len()).unwrap_or(0)
        );

        MatchDataset {
            schema: schema.unwrap_or(FeatureSchema { columns: Vec::new() }),
            features,
            labels,
            groups,
            set_scores,
            winners,
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn n_features(&self) -> usize {
        self.schema.len()
    }

    /// Sum of absolute feature values per row: the aggregate mismatch
    /// signal the set-score model consumes
    pub fn feature_diff_magnitudes(&self) -> Vec<f64> {
        self.features
            .iter()
            .map(|row| row.iter().map(|v| v.abs()).sum())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::aggregate::SeasonTable;
    use crate::{TeamStatPair, MAX_SETS};

    #[test]
    fn reindex_fills_missing_and_nan_with_zero() {
        let mut row = FeatureRow::default();
        row.push("a".to_string(), 1.5);
        row.push("b".to_string(), f64::NAN);
        let schema = FeatureSchema {
            columns: vec!["a".to_string(), "b".to_string(), "c".to_string()],
        };
        assert_eq!(schema.reindex(&row), vec![1.5, 0.0, 0.0]);
    }

    #[test]
    fn coerce_zeroes_non_finite() {
        assert_eq!(coerce(f64::NAN), 0.0);
        assert_eq!(coerce(f64::INFINITY), 0.0);
        assert_eq!(coerce(-2.5), -2.5);
    }

    fn match_record(home: &str, away: &str, winner: &str) -> MatchRecord {
        let mut sets = [None; MAX_SETS];
        sets[0] = Some((25, 20));
        sets[1] = Some((25, 22));
        sets[2] = Some((25, 18));
        MatchRecord {
            date: None,
            home_team: home.to_string(),
            away_team: away.to_string(),
            winner: winner.to_string(),
            loser: if winner == home { away } else { home }.to_string(),
            sets,
            team_stats: Vec::<TeamStatPair>::new(),
        }
    }

    #[test]
    fn labels_groups_and_winners_line_up() {
        let season = SeasonTable::new(Vec::new(), Vec::new());
        let ctx = MatchupContext::new(&[], &season, 8);
        let matches = vec![
            match_record("Poland", "Italy", "Poland"),
            match_record("Italy", "France", "France"),
        ];
        let dataset = MatchDataset::build(&matches, &ctx);
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.labels, vec![1.0, 0.0]);
        assert_eq!(dataset.groups, vec!["Poland", "Italy"]);
        assert_eq!(dataset.winners, vec!["Poland", "France"]);
        // Empty ratings produce NaN aggregates that coerce to 0
        assert!(dataset.features[0].iter().all(|v| v.is_finite()));
    }
}

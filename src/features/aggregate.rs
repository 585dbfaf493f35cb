//! Team feature aggregation
//!
//! Reduces a roster of player Impact ratings to summary statistics and
//! looks up season-long team totals. Absence is a first-class value here:
//! an unknown team yields NaN features that the numeric coercion step
//! downstream turns into zeros.

use crate::rating::engine::PlayerRating;

/// Keys of the roster Impact aggregations, in feature order
pub const IMPACT_KEYS: [&str; 6] = [
    "impact_mean",
    "impact_median",
    "impact_std",
    "impact_max",
    "impact_min",
    "impact_top8mean",
];

/// Statistical reductions of a roster's Impact ratings.
/// All fields are NaN for an empty roster.
#[derive(Debug, Clone, Copy)]
pub struct TeamAggregate {
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation (n-1); NaN for rosters of one
    pub std: f64,
    pub max: f64,
    pub min: f64,
    /// Mean of the top-N rated players (fewer than N is fine)
    pub top_n_mean: f64,
}

impl TeamAggregate {
    pub fn from_roster(impacts: &[f64], top_n: usize) -> Self {
        if impacts.is_empty() {
            return TeamAggregate {
                mean: f64::NAN,
                median: f64::NAN,
                std: f64::NAN,
                max: f64::NAN,
                min: f64::NAN,
                top_n_mean: f64::NAN,
            };
        }

        let mut sorted = impacts.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let n = sorted.len();
        let mean = sorted.iter().sum::<f64>() / n as f64;
        let median = if n % 2 == 1 {
            sorted[n / 2]
        } else {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        };
        let std = if n >= 2 {
            let var = sorted.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
            var.sqrt()
        } else {
            f64::NAN
        };
        let top: Vec<f64> = sorted.iter().rev().take(top_n).copied().collect();
        let top_n_mean = top.iter().sum::<f64>() / top.len() as f64;

        TeamAggregate {
            mean,
            median,
            std,
            max: sorted[n - 1],
            min: sorted[0],
            top_n_mean,
        }
    }

    /// Feature values in IMPACT_KEYS order
    pub fn values(&self) -> [f64; 6] {
        [
            self.mean,
            self.median,
            self.std,
            self.max,
            self.min,
            self.top_n_mean,
        ]
    }
}

/// Collect the Impact ratings of every player on a team (exact team-name
/// match) and aggregate them
pub fn aggregate_team_players(
    ratings: &[PlayerRating],
    team: &str,
    top_n: usize,
) -> TeamAggregate {
    let impacts: Vec<f64> = ratings
        .iter()
        .filter(|r| r.team == team)
        .map(|r| r.positional_rating)
        .collect();
    TeamAggregate::from_roster(&impacts, top_n)
}

/// Season-long team totals keyed by team name.
///
/// Values are pre-parsed: non-numeric source cells are NaN.
#[derive(Debug, Clone)]
pub struct SeasonTable {
    columns: Vec<String>,
    rows: Vec<(String, Vec<f64>)>,
}

impl SeasonTable {
    pub fn new(columns: Vec<String>, rows: Vec<(String, Vec<f64>)>) -> Self {
        SeasonTable { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Feature keys, prefixed `season_`, in table column order
    pub fn feature_keys(&self) -> Vec<String> {
        self.columns
            .iter()
            .map(|c| format!("season_{}", c))
            .collect()
    }

    /// Find a team row: exact case-insensitive match first, then
    /// case-insensitive substring containment as a fallback for minor
    /// name mismatches
    pub fn find(&self, team: &str) -> Option<&(String, Vec<f64>)> {
        let needle = team.to_lowercase();
        self.rows
            .iter()
            .find(|(name, _)| name.to_lowercase() == needle)
            .or_else(|| {
                self.rows
                    .iter()
                    .find(|(name, _)| name.to_lowercase().contains(&needle))
            })
    }

    /// Season feature values for a team, in column order; all NaN when the
    /// team is unknown
    pub fn get(&self, team: &str) -> Vec<f64> {
        match self.find(team) {
            Some((_, values)) => values.clone(),
            None => vec![f64::NAN; self.columns.len()],
        }
    }
}

//! Volleyball match outcome prediction
//!
//! Rates players from scraped per-skill statistics, aggregates ratings to
//! team level, and trains logistic models for win probability and set score.

pub mod data;
pub mod features;
pub mod model;
pub mod predict;
pub mod rating;
pub mod training;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum number of sets in a match (best of five)
pub const MAX_SETS: usize = 5;

/// One team-level stat pair scraped from a match page (home/away)
#[derive(Debug, Clone, PartialEq)]
pub struct TeamStatPair {
    pub stat: String,
    pub home: Option<f64>,
    pub away: Option<f64>,
}

/// A single match record from the collection layer
#[derive(Debug, Clone)]
pub struct MatchRecord {
    pub date: Option<NaiveDate>,
    pub home_team: String,
    pub away_team: String,
    pub winner: String,
    pub loser: String,
    /// Up to five set scores (home, away); None when the set was not played
    /// or the export left it blank
    pub sets: [Option<(u16, u16)>; MAX_SETS],
    /// Per-match team stat pairs, in CSV column order
    pub team_stats: Vec<TeamStatPair>,
}

impl MatchRecord {
    /// Did the recorded winner play at home?
    pub fn home_won(&self) -> bool {
        self.winner.trim() == self.home_team.trim()
    }

    /// Count sets won per side, skipping sets with a missing score
    pub fn sets_won(&self) -> (u8, u8) {
        let mut home = 0;
        let mut away = 0;
        for set in self.sets.iter().flatten() {
            if set.0 > set.1 {
                home += 1;
            } else if set.1 > set.0 {
                away += 1;
            }
        }
        (home, away)
    }

    /// Set score label from the winning side's perspective, e.g. "3-1"
    pub fn set_score_label(&self) -> String {
        let (home, away) = self.sets_won();
        if home > away {
            format!("{}-{}", home, away)
        } else {
            format!("{}-{}", away, home)
        }
    }
}

/// Predicted set score with its probability
#[derive(Debug, Clone)]
pub struct SetScorePrediction {
    pub score: String,
    pub probability: f64,
}

/// Model prediction output for a matchup
#[derive(Debug, Clone)]
pub struct MatchPrediction {
    pub winner: String,
    pub loser: String,
    /// Probability that `winner` wins (always >= 0.5)
    pub win_probability: f64,
    /// None when the set-score model artifact is absent
    pub set_score: Option<SetScorePrediction>,
}

/// Application-wide errors
#[derive(Debug, Error)]
pub enum VolleyError {
    #[error("Missing input file: {0}")]
    MissingInput(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Model not trained - run `volley train` first")]
    NoModel,

    #[error("Model artifact error: {0}")]
    Model(String),

    #[error("Only one outcome class present in match data: {0}")]
    SingleClass(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, VolleyError>;

/// Application configuration loaded from config.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub data: DataConfig,
    pub rating: RatingConfig,
    pub training: TrainingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Directory holding the per-category player stat exports
    pub dataset_dir: String,
    /// Team season standings table
    pub team_file: String,
    /// Match-level export with set scores and team stat pairs
    pub match_file: String,
    /// Output path for the merged player table
    pub merged_file: String,
    /// Output path for the player rankings table
    pub rankings_file: String,
    /// Directory for model artifacts
    pub model_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingConfig {
    /// Number of top-rated players in the top-N roster mean
    pub top_n: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub epochs: usize,
    pub learning_rate: f64,
    /// Number of grouped cross-validation folds
    pub folds: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data: DataConfig {
                dataset_dir: "data/dataset".to_string(),
                team_file: "data/team_stats.csv".to_string(),
                match_file: "data/match_set_stats.csv".to_string(),
                merged_file: "data/merged_stats.csv".to_string(),
                rankings_file: "data/player_rankings.csv".to_string(),
                model_dir: "model".to_string(),
            },
            rating: RatingConfig { top_n: 8 },
            training: TrainingConfig {
                epochs: 1000,
                learning_rate: 0.1,
                folds: 5,
            },
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            VolleyError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        toml::from_str(&content)
            .map_err(|e| VolleyError::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| VolleyError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn match_with_sets(sets: [Option<(u16, u16)>; MAX_SETS], winner: &str) -> MatchRecord {
        MatchRecord {
            date: None,
            home_team: "Poland".to_string(),
            away_team: "Italy".to_string(),
            winner: winner.to_string(),
            loser: if winner == "Poland" { "Italy" } else { "Poland" }.to_string(),
            sets,
            team_stats: Vec::new(),
        }
    }

    #[test]
    fn set_score_counts_only_complete_sets() {
        let m = match_with_sets(
            [Some((25, 20)), Some((23, 25)), Some((25, 18)), None, None],
            "Poland",
        );
        assert_eq!(m.sets_won(), (2, 1));
        assert_eq!(m.set_score_label(), "2-1");
    }

    #[test]
    fn set_score_label_is_winner_perspective() {
        let m = match_with_sets(
            [
                Some((20, 25)),
                Some((25, 23)),
                Some((19, 25)),
                Some((22, 25)),
                None,
            ],
            "Italy",
        );
        assert!(!m.home_won());
        assert_eq!(m.set_score_label(), "3-1");
    }

    #[test]
    fn no_complete_sets_yields_zero_zero() {
        let m = match_with_sets([None; MAX_SETS], "Poland");
        assert_eq!(m.set_score_label(), "0-0");
    }
}

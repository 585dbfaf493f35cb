//! Prediction and diagnostics
//!
//! Load trained models and generate matchup predictions; per-match stat
//! importance analysis.

pub mod inference;

pub use inference::Predictor;

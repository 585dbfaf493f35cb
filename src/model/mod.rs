//! Classifier models
//!
//! Single-layer logistic models: a binary win-probability model and a
//! multinomial set-score model, persisted as burn records with json
//! sidecars describing their feature schemas.

pub mod logistic;
pub mod set_score;

pub use logistic::{WinModel, WinModelMeta};
pub use set_score::{SetScoreMeta, SetScoreModel};

/// Win model weight file stem (the recorder appends `.mpk`)
pub const WIN_MODEL_FILE: &str = "win_model";
pub const WIN_META_FILE: &str = "win_model.json";
/// Set-score model weight file stem
pub const SET_MODEL_FILE: &str = "set_score_model";
pub const SET_META_FILE: &str = "set_score_model.json";

//! Player rating system
//!
//! Per-skill score formulas, positional weighting, and population
//! normalization to a 0-100 scale.

pub mod categories;
pub mod engine;
pub mod position;

pub use categories::{SkillCategory, SkillCounters};
pub use engine::{rate_players, write_rankings_csv, PlayerRating};
pub use position::Position;

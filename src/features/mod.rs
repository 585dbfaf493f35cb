//! Feature extraction
//!
//! Team-level aggregation of player ratings and symmetric matchup
//! feature rows.

pub mod aggregate;
pub mod matchup;

pub use aggregate::{SeasonTable, TeamAggregate};
pub use matchup::{FeatureRow, MatchupContext};

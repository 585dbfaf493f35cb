//! Data ingestion
//!
//! CSV loaders for the collection layer's exports, the player table
//! merger, and the match-level training dataset.

pub mod dataset;
pub mod merge;
pub mod tables;

pub use dataset::{FeatureSchema, MatchDataset};
pub use merge::PlayerRecord;
pub use tables::PipelineData;

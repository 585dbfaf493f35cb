//! Court positions and the positional weight table
//!
//! Input position strings are normalized before lookup; anything the
//! normalizer does not recognize falls back to the outside hitter profile.

use crate::rating::categories::NUM_CATEGORIES;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Court position group for positional rating normalization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    OutsideHitter,
    Opposite,
    MiddleBlocker,
    Setter,
    Libero,
}

impl Position {
    pub const ALL: [Position; 5] = [
        Position::OutsideHitter,
        Position::Opposite,
        Position::MiddleBlocker,
        Position::Setter,
        Position::Libero,
    ];

    /// Normalize a raw position string from the stats exports.
    ///
    /// Unrecognized strings map to OutsideHitter; that is the documented
    /// fallback rule, not an error.
    pub fn parse(raw: &str) -> Position {
        match raw.trim().to_lowercase().as_str() {
            "outside hitter" | "outside spiker" | "wing spiker" | "oh" => Position::OutsideHitter,
            "opposite spiker" | "opposite" | "opposite hitter" | "opp" => Position::Opposite,
            "middle blocker" | "middle" | "mb" => Position::MiddleBlocker,
            "setter" | "s" => Position::Setter,
            "libero" | "lib" | "l" => Position::Libero,
            _ => Position::OutsideHitter,
        }
    }

    /// Category rating weights in SkillCategory index order
    /// (att, blk, serv, set, def, recv). Each row sums to 1.0.
    pub fn weights(&self) -> [f64; NUM_CATEGORIES] {
        match self {
            Position::OutsideHitter => [0.30, 0.10, 0.10, 0.05, 0.15, 0.30],
            Position::Opposite => [0.45, 0.15, 0.15, 0.05, 0.10, 0.10],
            Position::MiddleBlocker => [0.20, 0.45, 0.10, 0.05, 0.10, 0.10],
            Position::Setter => [0.05, 0.10, 0.10, 0.55, 0.15, 0.05],
            Position::Libero => [0.00, 0.00, 0.00, 0.10, 0.50, 0.40],
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::OutsideHitter => write!(f, "Outside Hitter"),
            Position::Opposite => write!(f, "Opposite Spiker"),
            Position::MiddleBlocker => write!(f, "Middle Blocker"),
            Position::Setter => write!(f, "Setter"),
            Position::Libero => write!(f, "Libero"),
        }
    }
}

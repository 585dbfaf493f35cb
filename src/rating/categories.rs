//! Skill categories and per-category score formulas
//!
//! Each category maps raw counters to an efficiency score, a volume score
//! relative to the population maximum per-match rate, and a combined raw
//! score via category-specific exponents.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of skill categories
pub const NUM_CATEGORIES: usize = 6;

/// Raw counters for one skill category of one player.
///
/// The fields are category-dependent: `attempts` is the efficiency
/// denominator where the formula divides by attempts/receptions, and
/// `secondary` holds the extra denominator term (rebounds, still sets)
/// where the formula uses one.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SkillCounters {
    pub successes: f64,
    pub errors: f64,
    pub attempts: f64,
    pub secondary: f64,
    pub per_match: f64,
}

/// The six rated skill categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkillCategory {
    Attack,
    Block,
    Serve,
    Set,
    Defense,
    Receive,
}

/// CSV column names for one category's export
#[derive(Debug, Clone, Copy)]
pub struct CategoryColumns {
    pub successes: &'static str,
    pub errors: &'static str,
    pub attempts: Option<&'static str>,
    pub secondary: Option<&'static str>,
    pub per_match: &'static str,
}

impl SkillCategory {
    pub const ALL: [SkillCategory; NUM_CATEGORIES] = [
        SkillCategory::Attack,
        SkillCategory::Block,
        SkillCategory::Serve,
        SkillCategory::Set,
        SkillCategory::Defense,
        SkillCategory::Receive,
    ];

    /// Dense index for array-backed per-category storage
    pub fn index(&self) -> usize {
        match self {
            SkillCategory::Attack => 0,
            SkillCategory::Block => 1,
            SkillCategory::Serve => 2,
            SkillCategory::Set => 3,
            SkillCategory::Defense => 4,
            SkillCategory::Receive => 5,
        }
    }

    /// Short code used in output column names (rating_att, att_eff, ...)
    pub fn code(&self) -> &'static str {
        match self {
            SkillCategory::Attack => "att",
            SkillCategory::Block => "blk",
            SkillCategory::Serve => "serv",
            SkillCategory::Set => "set",
            SkillCategory::Defense => "def",
            SkillCategory::Receive => "recv",
        }
    }

    /// Stat-category name used for source file discovery
    /// (`<name>_stats.csv` in the dataset directory)
    pub fn file_stem(&self) -> &'static str {
        match self {
            SkillCategory::Attack => "attacking",
            SkillCategory::Block => "blocking",
            SkillCategory::Serve => "serving",
            SkillCategory::Set => "setting",
            SkillCategory::Defense => "defense",
            SkillCategory::Receive => "receiving",
        }
    }

    /// Column names in this category's CSV export
    pub fn columns(&self) -> CategoryColumns {
        match self {
            SkillCategory::Attack => CategoryColumns {
                successes: "Kills",
                errors: "Attacking Errors",
                attempts: Some("Attack Attempts"),
                secondary: None,
                per_match: "Attacks Per Match",
            },
            SkillCategory::Block => CategoryColumns {
                successes: "Blocks",
                errors: "Blocking Errors",
                attempts: None,
                secondary: Some("Rebounds"),
                per_match: "Blocks Per Match",
            },
            SkillCategory::Serve => CategoryColumns {
                successes: "Aces",
                errors: "Service Errors",
                attempts: Some("Service Attempts"),
                secondary: None,
                per_match: "Serves Per Match",
            },
            SkillCategory::Set => CategoryColumns {
                successes: "Running Sets",
                errors: "Setting Errors",
                attempts: None,
                secondary: Some("Still Sets"),
                per_match: "Sets Per Match",
            },
            SkillCategory::Defense => CategoryColumns {
                successes: "Great Saves",
                errors: "Defensive Errors",
                attempts: Some("Defensive Receptions"),
                secondary: None,
                per_match: "Digs Per Match",
            },
            SkillCategory::Receive => CategoryColumns {
                successes: "Successful Receives",
                errors: "Receiving Errors",
                attempts: Some("Service Receptions"),
                secondary: None,
                per_match: "Receives Per Match",
            },
        }
    }

    /// Fixed exponents (efficiency, volume) for the raw score
    pub fn exponents(&self) -> (f64, f64) {
        match self {
            SkillCategory::Attack => (0.5, 1.2),
            SkillCategory::Block => (0.4, 1.3),
            SkillCategory::Serve => (0.6, 1.1),
            SkillCategory::Set => (0.5, 1.2),
            SkillCategory::Defense => (0.4, 1.3),
            SkillCategory::Receive => (0.5, 1.2),
        }
    }

    /// Success rate per attempt for this category.
    ///
    /// A zero denominator yields 0, never NaN. Blocking and setting weigh
    /// errors less by dividing plain successes over the total attempt
    /// count; the other categories subtract errors in the numerator.
    pub fn efficiency(&self, c: &SkillCounters) -> f64 {
        let (num, denom) = match self {
            SkillCategory::Attack => (c.successes - c.errors, c.attempts),
            SkillCategory::Block => (c.successes, c.successes + c.errors + c.secondary),
            SkillCategory::Serve => (c.successes, c.attempts),
            SkillCategory::Set => (c.successes, c.successes + c.secondary + c.errors),
            SkillCategory::Defense => (c.successes - c.errors, c.attempts),
            SkillCategory::Receive => (c.successes - c.errors, c.attempts),
        };
        if denom > 0.0 {
            num / denom
        } else {
            0.0
        }
    }

    /// Per-match rate relative to the population maximum (0 when the
    /// population maximum is 0)
    pub fn volume(&self, c: &SkillCounters, population_max_per_match: f64) -> f64 {
        if population_max_per_match > 0.0 {
            c.per_match / population_max_per_match
        } else {
            0.0
        }
    }

    /// Combined raw score; negative inputs contribute nothing
    pub fn raw_score(&self, efficiency: f64, volume: f64) -> f64 {
        let (p1, p2) = self.exponents();
        efficiency.max(0.0).powf(p1) * volume.max(0.0).powf(p2)
    }
}

impl fmt::Display for SkillCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkillCategory::Attack => write!(f, "Attacking"),
            SkillCategory::Block => write!(f, "Blocking"),
            SkillCategory::Serve => write!(f, "Serving"),
            SkillCategory::Set => write!(f, "Setting"),
            SkillCategory::Defense => write!(f, "Defense"),
            SkillCategory::Receive => write!(f, "Receiving"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attack_efficiency_and_raw() {
        let c = SkillCounters {
            successes: 10.0,
            errors: 2.0,
            attempts: 20.0,
            secondary: 0.0,
            per_match: 5.0,
        };
        let cat = SkillCategory::Attack;
        let eff = cat.efficiency(&c);
        assert!((eff - 0.4).abs() < 1e-12);
        let vol = cat.volume(&c, 5.0);
        assert!((vol - 1.0).abs() < 1e-12);
        let raw = cat.raw_score(eff, vol);
        assert!((raw - 0.4f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn zero_denominator_is_zero_efficiency() {
        let c = SkillCounters::default();
        for cat in SkillCategory::ALL {
            assert_eq!(cat.efficiency(&c), 0.0);
        }
    }

    #[test]
    fn negative_efficiency_contributes_nothing() {
        let c = SkillCounters {
            successes: 1.0,
            errors: 5.0,
            attempts: 10.0,
            secondary: 0.0,
            per_match: 2.0,
        };
        let cat = SkillCategory::Defense;
        let eff = cat.efficiency(&c);
        assert!(eff < 0.0);
        assert_eq!(cat.raw_score(eff, cat.volume(&c, 4.0)), 0.0);
    }

    #[test]
    fn zero_population_max_is_zero_volume() {
        let c = SkillCounters {
            per_match: 3.0,
            ..Default::default()
        };
        assert_eq!(SkillCategory::Serve.volume(&c, 0.0), 0.0);
    }

    #[test]
    fn block_efficiency_uses_total_attempts() {
        let c = SkillCounters {
            successes: 6.0,
            errors: 2.0,
            attempts: 0.0,
            secondary: 4.0,
            per_match: 1.0,
        };
        assert!((SkillCategory::Block.efficiency(&c) - 0.5).abs() < 1e-12);
    }
}

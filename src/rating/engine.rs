//! Rating engine
//!
//! Normalizes per-category raw scores to a 0-100 scale against the
//! population maximum, then combines them into a position-weighted
//! composite normalized within each position group.

use crate::data::merge::PlayerRecord;
use crate::rating::categories::{SkillCategory, NUM_CATEGORIES};
use crate::rating::position::Position;
use crate::Result;
use std::collections::HashMap;

/// Per-category sub-scores for one player
#[derive(Debug, Clone, Copy, Default)]
pub struct CategoryScore {
    pub efficiency: f64,
    pub volume: f64,
    pub raw: f64,
    /// 0-100, rounded to 2 decimals; the population max raw scores 100.00
    pub rating: f64,
}

/// Full rating line for one player
#[derive(Debug, Clone)]
pub struct PlayerRating {
    pub name: String,
    pub team: String,
    /// Position string as exported by the collection layer
    pub position_label: String,
    /// Normalized position used for weighting and group normalization
    pub position: Position,
    pub categories: [CategoryScore; NUM_CATEGORIES],
    /// Position-weighted composite, normalized to 0-100 within the
    /// position group (the player's Impact)
    pub positional_rating: f64,
}

impl PlayerRating {
    pub fn category(&self, cat: SkillCategory) -> &CategoryScore {
        &self.categories[cat.index()]
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Rate every player in the merged table.
///
/// Pure function of the input snapshot; ratings are recomputed wholesale
/// on every run.
pub fn rate_players(records: &[PlayerRecord]) -> Vec<PlayerRating> {
    let mut ratings: Vec<PlayerRating> = records
        .iter()
        .map(|r| PlayerRating {
            name: r.name.clone(),
            team: r.team.clone(),
            position_label: r.position.clone(),
            position: Position::parse(&r.position),
            categories: [CategoryScore::default(); NUM_CATEGORIES],
            positional_rating: 0.0,
        })
        .collect();

    for cat in SkillCategory::ALL {
        let max_per_match = records
            .iter()
            .map(|r| r.skill(cat).per_match)
            .fold(0.0_f64, f64::max);

        let mut max_raw = 0.0_f64;
        for (record, rating) in records.iter().zip(ratings.iter_mut()) {
            let counters = record.skill(cat);
            let efficiency = cat.efficiency(counters);
            let volume = cat.volume(counters, max_per_match);
            let raw = cat.raw_score(efficiency, volume);
            max_raw = max_raw.max(raw);
            rating.categories[cat.index()] = CategoryScore {
                efficiency,
                volume,
                raw,
                rating: 0.0,
            };
        }

        // Scale so the population maximum is exactly 100; a degenerate
        // all-zero category rates everyone 0
        if max_raw > 0.0 {
            for rating in ratings.iter_mut() {
                let score = &mut rating.categories[cat.index()];
                score.rating = round2(100.0 * score.raw / max_raw);
            }
        }
    }

    apply_positional_ratings(&mut ratings);
    ratings
}

/// Weighted composite of category ratings, max-scaled within each
/// position group. An all-zero group keeps everyone at 0.
fn apply_positional_ratings(ratings: &mut [PlayerRating]) {
    let composites: Vec<f64> = ratings
        .iter()
        .map(|r| {
            let weights = r.position.weights();
            r.categories
                .iter()
                .zip(weights.iter())
                .map(|(score, w)| score.rating * w)
                .sum()
        })
        .collect();

    let mut group_max: HashMap<Position, f64> = HashMap::new();
    for (rating, composite) in ratings.iter().zip(composites.iter()) {
        let entry = group_max.entry(rating.position).or_insert(0.0);
        *entry = entry.max(*composite);
    }

    for (rating, composite) in ratings.iter_mut().zip(composites.iter()) {
        let max = group_max.get(&rating.position).copied().unwrap_or(0.0);
        rating.positional_rating = if max > 0.0 {
            round2(100.0 * composite / max)
        } else {
            0.0
        };
    }
}

/// Write the rankings table with component sub-scores for transparency
pub fn write_rankings_csv(path: &str, ratings: &[PlayerRating]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;

    let mut header = vec![
        "Player Name".to_string(),
        "Team".to_string(),
        "Position".to_string(),
        "positional_rating".to_string(),
    ];
    for cat in SkillCategory::ALL {
        let code = cat.code();
        header.push(format!("rating_{}", code));
        header.push(format!("{}_eff", code));
        header.push(format!("{}_vol", code));
        header.push(format!("{}_raw", code));
    }
    writer.write_record(&header)?;

    for rating in ratings {
        let mut row = vec![
            rating.name.clone(),
            rating.team.clone(),
            rating.position_label.clone(),
            format!("{:.2}", rating.positional_rating),
        ];
        for cat in SkillCategory::ALL {
            let score = rating.category(cat);
            row.push(format!("{:.2}", score.rating));
            row.push(format!("{}", score.efficiency));
            row.push(format!("{}", score.volume));
            row.push(format!("{}", score.raw));
        }
        writer.write_record(&row)?;
    }

    writer.flush()?;
    log::info!("Player rankings saved to {}", path);
    Ok(())
}

/// Log the best-rated player in each category
pub fn report_best(ratings: &[PlayerRating]) {
    for cat in SkillCategory::ALL {
        let best = ratings
            .iter()
            .max_by(|a, b| {
                a.category(cat)
                    .rating
                    .partial_cmp(&b.category(cat).rating)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        if let Some(best) = best {
            log::info!(
                "Best {} rating: {:.2} ({}, {})",
                cat.code(),
                best.category(cat).rating,
                best.name,
                best.team
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rating::categories::SkillCounters;

    fn player(name: &str, position: &str) -> PlayerRecord {
        PlayerRecord::new(name, "X", position)
    }

    #[test]
    fn sole_player_rates_exactly_100() {
        let mut p = player("P1", "Outside Hitter");
        p.set_skill(
            SkillCategory::Attack,
            SkillCounters {
                successes: 10.0,
                errors: 2.0,
                attempts: 20.0,
                secondary: 0.0,
                per_match: 5.0,
            },
        );
        let ratings = rate_players(&[p]);
        let score = ratings[0].category(SkillCategory::Attack);
        assert!((score.efficiency - 0.4).abs() < 1e-12);
        assert!((score.volume - 1.0).abs() < 1e-12);
        assert!((score.raw - 0.4f64.sqrt()).abs() < 1e-12);
        assert_eq!(score.rating, 100.0);
    }

    #[test]
    fn population_max_is_100_and_nothing_exceeds_it() {
        let mut a = player("A", "Opposite");
        a.set_skill(
            SkillCategory::Serve,
            SkillCounters {
                successes: 12.0,
                errors: 4.0,
                attempts: 60.0,
                secondary: 0.0,
                per_match: 2.0,
            },
        );
        let mut b = player("B", "Opposite");
        b.set_skill(
            SkillCategory::Serve,
            SkillCounters {
                successes: 5.0,
                errors: 9.0,
                attempts: 55.0,
                secondary: 0.0,
                per_match: 0.8,
            },
        );
        let ratings = rate_players(&[a, b]);
        let max = ratings
            .iter()
            .map(|r| r.category(SkillCategory::Serve).rating)
            .fold(0.0_f64, f64::max);
        assert_eq!(max, 100.0);
        for r in &ratings {
            assert!(r.category(SkillCategory::Serve).rating <= 100.0);
        }
    }

    #[test]
    fn all_zero_population_rates_zero() {
        let ratings = rate_players(&[player("A", "Setter"), player("B", "Setter")]);
        for r in &ratings {
            for cat in SkillCategory::ALL {
                assert_eq!(r.category(cat).rating, 0.0);
            }
            assert_eq!(r.positional_rating, 0.0);
        }
    }

    #[test]
    fn positional_rating_normalizes_within_group() {
        let mut strong_mb = player("MB1", "Middle Blocker");
        strong_mb.set_skill(
            SkillCategory::Block,
            SkillCounters {
                successes: 30.0,
                errors: 5.0,
                attempts: 0.0,
                secondary: 10.0,
                per_match: 3.0,
            },
        );
        let mut weak_mb = player("MB2", "Middle Blocker");
        weak_mb.set_skill(
            SkillCategory::Block,
            SkillCounters {
                successes: 10.0,
                errors: 8.0,
                attempts: 0.0,
                secondary: 12.0,
                per_match: 1.0,
            },
        );
        let mut setter = player("S1", "Setter");
        setter.set_skill(
            SkillCategory::Set,
            SkillCounters {
                successes: 50.0,
                errors: 5.0,
                attempts: 0.0,
                secondary: 20.0,
                per_match: 9.0,
            },
        );

        let ratings = rate_players(&[strong_mb, weak_mb, setter]);
        // Each group's best player caps at exactly 100
        assert_eq!(ratings[0].positional_rating, 100.0);
        assert_eq!(ratings[2].positional_rating, 100.0);
        assert!(ratings[1].positional_rating < 100.0);
        assert!(ratings[1].positional_rating > 0.0);
    }

    #[test]
    fn unrecognized_position_uses_outside_hitter_group() {
        let mut known = player("A", "Outside Hitter");
        known.set_skill(
            SkillCategory::Attack,
            SkillCounters {
                successes: 20.0,
                errors: 2.0,
                attempts: 40.0,
                secondary: 0.0,
                per_match: 4.0,
            },
        );
        let mut unknown = player("B", "Universal");
        unknown.set_skill(
            SkillCategory::Attack,
            SkillCounters {
                successes: 10.0,
                errors: 2.0,
                attempts: 40.0,
                secondary: 0.0,
                per_match: 2.0,
            },
        );
        let ratings = rate_players(&[known, unknown]);
        assert_eq!(ratings[1].position, Position::OutsideHitter);
        // Both normalize within the same (outside hitter) group
        assert_eq!(ratings[0].positional_rating, 100.0);
        assert!(ratings[1].positional_rating < 100.0);
    }
}

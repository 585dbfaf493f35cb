//! Table merger
//!
//! Outer-joins the per-category stat tables on (player name, team) into one
//! wide player table. A player present in any table appears in the result;
//! counters missing from a source table stay at zero.

use crate::data::tables::CategoryTable;
use crate::rating::categories::{SkillCategory, SkillCounters, NUM_CATEGORIES};
use crate::Result;
use std::collections::BTreeMap;

/// One player's merged stat line across all six categories.
///
/// The (name, team) pair is the join identity; position is carried as data
/// (first non-empty value across source tables wins).
#[derive(Debug, Clone)]
pub struct PlayerRecord {
    pub name: String,
    pub team: String,
    pub position: String,
    skills: [SkillCounters; NUM_CATEGORIES],
}

impl PlayerRecord {
    pub fn new(name: &str, team: &str, position: &str) -> Self {
        PlayerRecord {
            name: name.to_string(),
            team: team.to_string(),
            position: position.to_string(),
            skills: [SkillCounters::default(); NUM_CATEGORIES],
        }
    }

    pub fn skill(&self, cat: SkillCategory) -> &SkillCounters {
        &self.skills[cat.index()]
    }

    pub fn set_skill(&mut self, cat: SkillCategory, counters: SkillCounters) {
        self.skills[cat.index()] = counters;
    }
}

/// Outer-join category tables on (name, team).
///
/// Duplicate identities within one table overwrite earlier rows for that
/// category rather than duplicating the player. Output order is
/// deterministic (team, then name).
pub fn merge_tables(tables: &[CategoryTable]) -> Vec<PlayerRecord> {
    let mut merged: BTreeMap<(String, String), PlayerRecord> = BTreeMap::new();

    for table in tables {
        for row in &table.rows {
            let key = (row.team.clone(), row.name.clone());
            let record = merged
                .entry(key)
                .or_insert_with(|| PlayerRecord::new(&row.name, &row.team, &row.position));
            if record.position.is_empty() && !row.position.is_empty() {
                record.position = row.position.clone();
            }
            record.set_skill(table.category, row.counters);
        }
    }

    merged.into_values().collect()
}

/// Write the merged player table. Per-category column names are distinct
/// by construction, so no prefixing collisions can occur.
pub fn write_merged_csv(path: &str, records: &[PlayerRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;

    let mut header = vec![
        "Player Name".to_string(),
        "Team".to_string(),
        "Position".to_string(),
    ];
    for cat in SkillCategory::ALL {
        let cols = cat.columns();
        header.push(cols.successes.to_string());
        header.push(cols.errors.to_string());
        if let Some(attempts) = cols.attempts {
            header.push(attempts.to_string());
        }
        if let Some(secondary) = cols.secondary {
            header.push(secondary.to_string());
        }
        header.push(cols.per_match.to_string());
    }
    writer.write_record(&header)?;

    for record in records {
        let mut row = vec![
            record.name.clone(),
            record.team.clone(),
            record.position.clone(),
        ];
        for cat in SkillCategory::ALL {
            let cols = cat.columns();
            let counters = record.skill(cat);
            row.push(format!("{}", counters.successes));
            row.push(format!("{}", counters.errors));
            if cols.attempts.is_some() {
                row.push(format!("{}", counters.attempts));
            }
            if cols.secondary.is_some() {
                row.push(format!("{}", counters.secondary));
            }
            row.push(format!("{}", counters.per_match));
        }
        writer.write_record(&row)?;
    }

    writer.flush()?;
    log::info!("Merged player stats saved to {}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::tables::CategoryRow;

    fn row(name: &str, team: &str, successes: f64) -> CategoryRow {
        CategoryRow {
            name: name.to_string(),
            team: team.to_string(),
            position: String::new(),
            counters: SkillCounters {
                successes,
                ..Default::default()
            },
        }
    }

    #[test]
    fn disjoint_rosters_sum_row_counts() {
        let attack = CategoryTable {
            category: SkillCategory::Attack,
            rows: vec![row("A", "X", 10.0), row("B", "X", 8.0)],
        };
        let block = CategoryTable {
            category: SkillCategory::Block,
            rows: vec![row("C", "Y", 5.0), row("D", "Y", 3.0)],
        };
        let merged = merge_tables(&[attack, block]);
        assert_eq!(merged.len(), 4);

        // Missing cells are zero, not absent
        let a = merged.iter().find(|r| r.name == "A").unwrap();
        assert_eq!(a.skill(SkillCategory::Block).successes, 0.0);
        let c = merged.iter().find(|r| r.name == "C").unwrap();
        assert_eq!(c.skill(SkillCategory::Attack).successes, 0.0);
    }

    #[test]
    fn shared_identity_merges_into_one_row() {
        let attack = CategoryTable {
            category: SkillCategory::Attack,
            rows: vec![row("A", "X", 10.0)],
        };
        let serve = CategoryTable {
            category: SkillCategory::Serve,
            rows: vec![row("A", "X", 4.0)],
        };
        let merged = merge_tables(&[attack, serve]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].skill(SkillCategory::Attack).successes, 10.0);
        assert_eq!(merged[0].skill(SkillCategory::Serve).successes, 4.0);
    }

    #[test]
    fn same_name_different_team_stays_separate() {
        let attack = CategoryTable {
            category: SkillCategory::Attack,
            rows: vec![row("A", "X", 10.0), row("A", "Y", 7.0)],
        };
        let merged = merge_tables(&[attack]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn first_non_empty_position_wins() {
        let mut with_pos = row("A", "X", 10.0);
        with_pos.position = "Setter".to_string();
        let attack = CategoryTable {
            category: SkillCategory::Attack,
            rows: vec![row("A", "X", 10.0)],
        };
        let set = CategoryTable {
            category: SkillCategory::Set,
            rows: vec![with_pos],
        };
        let merged = merge_tables(&[attack, set]);
        assert_eq!(merged[0].position, "Setter");
    }
}

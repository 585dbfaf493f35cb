//! Stat table loaders
//!
//! Header-indexed CSV readers for the three input families: per-category
//! player exports, the team season table, and the match-level export.
//! A missing source file is fatal; a malformed row is skipped with a
//! warning.

use crate::features::aggregate::SeasonTable;
use crate::rating::categories::{SkillCategory, SkillCounters};
use crate::rating::engine::{rate_players, PlayerRating};
use crate::data::merge::{merge_tables, PlayerRecord};
use crate::{Config, MatchRecord, Result, TeamStatPair, VolleyError, MAX_SETS};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::path::Path;

/// One row of a per-category stat export
#[derive(Debug, Clone)]
pub struct CategoryRow {
    pub name: String,
    pub team: String,
    pub position: String,
    pub counters: SkillCounters,
}

/// A loaded per-category stat table
#[derive(Debug, Clone)]
pub struct CategoryTable {
    pub category: SkillCategory,
    pub rows: Vec<CategoryRow>,
}

/// Column name -> index lookup with trimmed header names
struct HeaderIndex {
    map: HashMap<String, usize>,
}

impl HeaderIndex {
    fn new(headers: &csv::StringRecord) -> Self {
        let map = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim().to_string(), i))
            .collect();
        HeaderIndex { map }
    }

    fn get(&self, name: &str) -> Option<usize> {
        self.map.get(name).copied()
    }
}

fn field<'a>(record: &'a csv::StringRecord, idx: Option<usize>) -> &'a str {
    idx.and_then(|i| record.get(i)).unwrap_or("").trim()
}

/// Blank cells parse to None; anything non-numeric is a parse failure
fn parse_f64(raw: &str) -> std::result::Result<Option<f64>, ()> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed.parse::<f64>().map(Some).map_err(|_| ())
}

fn open_reader(path: &str) -> Result<csv::Reader<std::fs::File>> {
    if !Path::new(path).exists() {
        return Err(VolleyError::MissingInput(path.to_string()));
    }
    Ok(csv::Reader::from_path(path)?)
}

/// Load one per-category player stat export
pub fn load_category_table(path: &str, category: SkillCategory) -> Result<CategoryTable> {
    let mut reader = open_reader(path)?;
    let headers = HeaderIndex::new(reader.headers()?);

    let name_idx = headers.get("Player Name");
    let team_idx = headers.get("Team");
    let position_idx = headers.get("Position");
    let cols = category.columns();
    let successes_idx = headers.get(cols.successes);
    let errors_idx = headers.get(cols.errors);
    let attempts_idx = cols.attempts.and_then(|c| headers.get(c));
    let secondary_idx = cols.secondary.and_then(|c| headers.get(c));
    let per_match_idx = headers.get(cols.per_match);

    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record?;
        let name = field(&record, name_idx);
        let team = field(&record, team_idx);
        if name.is_empty() || team.is_empty() {
            log::warn!("{}: row {} has no player identity, skipping", path, line + 2);
            continue;
        }

        let numeric = |idx: Option<usize>| -> std::result::Result<f64, ()> {
            Ok(parse_f64(field(&record, idx))?.unwrap_or(0.0))
        };
        let counters = match (
            numeric(successes_idx),
            numeric(errors_idx),
            numeric(attempts_idx),
            numeric(secondary_idx),
            numeric(per_match_idx),
        ) {
            (Ok(successes), Ok(errors), Ok(attempts), Ok(secondary), Ok(per_match)) => {
                SkillCounters {
                    successes,
                    errors,
                    attempts,
                    secondary,
                    per_match,
                }
            }
            _ => {
                log::warn!(
                    "{}: row {} ({}) has non-numeric counters, skipping",
                    path,
                    line + 2,
                    name
                );
                continue;
            }
        };

        rows.push(CategoryRow {
            name: name.to_string(),
            team: team.to_string(),
            position: field(&record, position_idx).to_string(),
            counters,
        });
    }

    log::debug!("Loaded {} rows from {}", rows.len(), path);
    Ok(CategoryTable { category, rows })
}

/// Load all six category exports from the dataset directory
/// (`<category>_stats.csv` per file)
pub fn load_all_category_tables(dataset_dir: &str) -> Result<Vec<CategoryTable>> {
    SkillCategory::ALL
        .iter()
        .map(|&cat| {
            let path = format!("{}/{}_stats.csv", dataset_dir, cat.file_stem());
            load_category_table(&path, cat)
        })
        .collect()
}

/// Load the team season table. The `Team` column is the key; every other
/// column is kept with non-numeric cells parsed to NaN.
pub fn load_season_table(path: &str) -> Result<SeasonTable> {
    let mut reader = open_reader(path)?;
    let raw_headers = reader.headers()?.clone();
    let headers = HeaderIndex::new(&raw_headers);
    let team_idx = headers.get("Team").ok_or_else(|| {
        VolleyError::Parse(format!("{}: season table has no Team column", path))
    })?;

    let columns: Vec<String> = raw_headers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != team_idx)
        .map(|(_, h)| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record?;
        let team = field(&record, Some(team_idx));
        if team.is_empty() {
            log::warn!("{}: row {} has no team name, skipping", path, line + 2);
            continue;
        }
        let values: Vec<f64> = record
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != team_idx)
            .map(|(_, v)| match parse_f64(v) {
                Ok(Some(x)) => x,
                _ => f64::NAN,
            })
            .collect();
        rows.push((team.to_string(), values));
    }

    log::debug!("Loaded season stats for {} teams from {}", rows.len(), path);
    Ok(SeasonTable::new(columns, rows))
}

/// Load the match-level export with set scores and per-match team stat
/// pairs. Stat pair columns are discovered from the header: every
/// `<Stat> Home` with a matching `<Stat> Away`, excluding the set-score
/// columns.
pub fn load_matches(path: &str) -> Result<Vec<MatchRecord>> {
    let mut reader = open_reader(path)?;
    let raw_headers = reader.headers()?.clone();
    let headers = HeaderIndex::new(&raw_headers);

    let date_idx = headers.get("Date");
    let home_idx = headers.get("Home Team");
    let away_idx = headers.get("Away Team");
    let winner_idx = headers.get("Winner");
    let loser_idx = headers.get("Loser");

    let stat_names = stat_pair_names(&raw_headers);
    let stat_indices: Vec<(String, Option<usize>, Option<usize>)> = stat_names
        .iter()
        .map(|stat| {
            (
                stat.clone(),
                headers.get(&format!("{} Home", stat)),
                headers.get(&format!("{} Away", stat)),
            )
        })
        .collect();

    let mut matches = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record?;
        let home_team = field(&record, home_idx);
        let away_team = field(&record, away_idx);
        let winner = field(&record, winner_idx);
        if home_team.is_empty() || away_team.is_empty() || winner.is_empty() {
            log::warn!("{}: row {} has no outcome, skipping", path, line + 2);
            continue;
        }

        let date = NaiveDate::parse_from_str(field(&record, date_idx), "%Y-%m-%d").ok();

        let mut sets = [None; MAX_SETS];
        for (set_no, slot) in sets.iter_mut().enumerate() {
            let home = parse_f64(field(
                &record,
                headers.get(&format!("Set{} Home", set_no + 1)),
            ));
            let away = parse_f64(field(
                &record,
                headers.get(&format!("Set{} Away", set_no + 1)),
            ));
            if let (Ok(Some(h)), Ok(Some(a))) = (home, away) {
                *slot = Some((h as u16, a as u16));
            }
        }

        let team_stats = stat_indices
            .iter()
            .map(|(stat, home, away)| TeamStatPair {
                stat: stat.clone(),
                home: parse_f64(field(&record, *home)).unwrap_or(None),
                away: parse_f64(field(&record, *away)).unwrap_or(None),
            })
            .collect();

        matches.push(MatchRecord {
            date,
            home_team: home_team.to_string(),
            away_team: away_team.to_string(),
            winner: winner.to_string(),
            loser: field(&record, loser_idx).to_string(),
            sets,
            team_stats,
        });
    }

    log::info!("Loaded {} matches from {}", matches.len(), path);
    Ok(matches)
}

/// Stat names with both a `<Stat> Home` and `<Stat> Away` column,
/// in header order. Set-score columns are not team stats, but the
/// "Sets" stat pair is.
fn stat_pair_names(headers: &csv::StringRecord) -> Vec<String> {
    let trimmed: Vec<String> = headers.iter().map(|h| h.trim().to_string()).collect();
    trimmed
        .iter()
        .filter_map(|h| h.strip_suffix(" Home"))
        .filter(|stem| !is_set_score_stem(stem) && !stem.is_empty())
        .filter(|stem| trimmed.iter().any(|h| h == &format!("{} Away", stem)))
        .map(|stem| stem.to_string())
        .collect()
}

/// Matches the numbered set-score stems (`Set1`..`Set5`) only
fn is_set_score_stem(stem: &str) -> bool {
    stem.strip_prefix("Set")
        .map(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or(false)
}

/// The immutable tables a pipeline run works from, loaded once at process
/// start. Ratings are a pure function of the merged player table and are
/// recomputed here on every run.
pub struct PipelineData {
    pub players: Vec<PlayerRecord>,
    pub ratings: Vec<PlayerRating>,
    pub season: SeasonTable,
}

impl PipelineData {
    pub fn load(config: &Config) -> Result<Self> {
        let tables = load_all_category_tables(&config.data.dataset_dir)?;
        let players = merge_tables(&tables);
        let ratings = rate_players(&players);
        let season = load_season_table(&config.data.team_file)?;
        log::info!(
            "Pipeline data ready: {} players, {} season rows",
            players.len(),
            season.len()
        );
        Ok(PipelineData {
            players,
            ratings,
            season,
        })
    }
}

//! Model fitting
//!
//! Full-batch gradient-descent fitting for the win and set-score models,
//! the grouped cross-validation loop, and the training entry point that
//! writes the model artifacts.

use burn::optim::{GradientsParams, Optimizer, SgdConfig};
use burn::prelude::Backend;
use burn::tensor::backend::AutodiffBackend;
use burn::tensor::{ElementConversion, Tensor};
use std::collections::HashMap;
use std::path::Path;

use crate::data::dataset::MatchDataset;
use crate::features::matchup::MatchupContext;
use crate::model::set_score::winner_column;
use crate::model::{
    SetScoreMeta, SetScoreModel, WinModel, WinModelMeta, SET_META_FILE, SET_MODEL_FILE,
    WIN_META_FILE, WIN_MODEL_FILE,
};
use crate::training::cross_validation::{balanced_class_weights, GroupKFold};
use crate::training::metrics::{accuracy, roc_auc, CrossValReport, FoldReport};
use crate::{Config, MatchRecord, Result, TrainingConfig, VolleyError};

/// Per-column z-score parameters, fitted on training rows only
#[derive(Debug, Clone)]
pub struct Standardization {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
}

impl Standardization {
    /// Fit column means and stds. Constant columns get std 1.0 so they
    /// pass through unscaled instead of dividing by zero.
    pub fn fit(rows: &[Vec<f64>]) -> Self {
        let n_cols = rows.first().map(|r| r.len()).unwrap_or(0);
        let n = rows.len() as f64;
        let mut mean = vec![0.0; n_cols];
        for row in rows {
            for (m, v) in mean.iter_mut().zip(row.iter()) {
                *m += v;
            }
        }
        for m in &mut mean {
            *m /= n;
        }

        let mut std = vec![0.0; n_cols];
        for row in rows {
            for ((s, v), m) in std.iter_mut().zip(row.iter()).zip(mean.iter()) {
                *s += (v - m).powi(2);
            }
        }
        for s in &mut std {
            *s = (*s / n).sqrt();
            if *s == 0.0 || !s.is_finite() {
                *s = 1.0;
            }
        }

        Standardization { mean, std }
    }

    pub fn apply_row(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.mean.iter().zip(self.std.iter()))
            .map(|(v, (m, s))| (v - m) / s)
            .collect()
    }

    pub fn apply(&self, rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
        rows.iter().map(|r| self.apply_row(r)).collect()
    }
}

/// Row-major f64 matrix to a 2-D f32 tensor
pub fn to_tensor<B: Backend>(rows: &[Vec<f64>], device: &B::Device) -> Tensor<B, 2> {
    let n = rows.len();
    let d = rows.first().map(|r| r.len()).unwrap_or(0);
    let flat: Vec<f32> = rows
        .iter()
        .flat_map(|r| r.iter().map(|v| *v as f32))
        .collect();
    Tensor::<B, 1>::from_floats(flat.as_slice(), device).reshape([n, d])
}

/// Clamped binary cross-entropy between predicted probabilities and
/// 0/1 targets
fn binary_cross_entropy<B: Backend>(probs: Tensor<B, 2>, targets: Tensor<B, 2>) -> Tensor<B, 1> {
    let eps = 1e-7;
    let clamped = probs.clamp(eps, 1.0 - eps);
    let loss = targets.clone().neg() * clamped.clone().log()
        - (targets.neg() + 1.0) * (clamped.neg() + 1.0).log();
    loss.mean()
}

/// Fit the logistic win model with full-batch gradient descent
pub fn fit_win_model<B: AutodiffBackend>(
    device: &B::Device,
    features: &[Vec<f64>],
    labels: &[f32],
    config: &TrainingConfig,
) -> WinModel<B> {
    let n = features.len();
    let n_features = features.first().map(|r| r.len()).unwrap_or(0);
    let x = to_tensor::<B>(features, device);
    let y = Tensor::<B, 1>::from_floats(labels, device).reshape([n, 1]);

    let mut model = WinModel::new(device, n_features);
    let mut optimizer = SgdConfig::new().init();

    for epoch in 0..config.epochs {
        let probs = model.forward(x.clone());
        let loss = binary_cross_entropy(probs, y.clone());

        if (epoch + 1) % 200 == 0 || epoch + 1 == config.epochs {
            let loss_val: f32 = loss.clone().into_scalar().elem();
            log::debug!("Epoch {}/{}: loss {:.4}", epoch + 1, config.epochs, loss_val);
        }

        let grads = GradientsParams::from_grads(loss.backward(), &model);
        model = optimizer.step(config.learning_rate, model, grads);
    }

    model
}

/// Win probabilities for a standardized feature matrix
pub fn predict_win_probs<B: Backend>(
    model: &WinModel<B>,
    features: &[Vec<f64>],
    device: &B::Device,
) -> Vec<f32> {
    if features.is_empty() {
        return Vec::new();
    }
    model
        .forward(to_tensor::<B>(features, device))
        .into_data()
        .as_slice::<f32>()
        .map(|s| s.to_vec())
        .unwrap_or_default()
}

/// Fit the multinomial set-score model with class-weighted cross-entropy
pub fn fit_set_score_model<B: AutodiffBackend>(
    device: &B::Device,
    features: &[Vec<f64>],
    class_indices: &[usize],
    class_weights: &[f32],
    config: &TrainingConfig,
) -> SetScoreModel<B> {
    let n = features.len();
    let n_features = features.first().map(|r| r.len()).unwrap_or(0);
    let n_classes = class_weights.len();

    let x = to_tensor::<B>(features, device);
    let mut onehot = vec![0.0f32; n * n_classes];
    let mut sample_weights = vec![0.0f32; n];
    for (i, &class) in class_indices.iter().enumerate() {
        onehot[i * n_classes + class] = 1.0;
        sample_weights[i] = class_weights[class];
    }
    let y = Tensor::<B, 1>::from_floats(onehot.as_slice(), device).reshape([n, n_classes]);
    let w = Tensor::<B, 1>::from_floats(sample_weights.as_slice(), device).reshape([n, 1]);

    let mut model = SetScoreModel::new(device, n_features, n_classes);
    let mut optimizer = SgdConfig::new().init();

    for epoch in 0..config.epochs {
        let probs = model.forward(x.clone());
        let clamped = probs.clamp(1e-7, 1.0 - 1e-7);
        let per_sample = (y.clone() * clamped.log()).sum_dim(1).neg();
        let loss = (per_sample * w.clone()).mean();

        if (epoch + 1) % 200 == 0 || epoch + 1 == config.epochs {
            let loss_val: f32 = loss.clone().into_scalar().elem();
            log::debug!(
                "Set-score epoch {}/{}: loss {:.4}",
                epoch + 1,
                config.epochs,
                loss_val
            );
        }

        let grads = GradientsParams::from_grads(loss.backward(), &model);
        model = optimizer.step(config.learning_rate, model, grads);
    }

    model
}

/// Grouped cross-validation of the win model. Standardization is fitted
/// per fold on the training rows only.
pub fn cross_validate<B: AutodiffBackend>(
    device: &B::Device,
    dataset: &MatchDataset,
    config: &TrainingConfig,
) -> CrossValReport {
    let mut report = CrossValReport::default();

    for (fold, (train_idx, test_idx)) in GroupKFold::new(config.folds)
        .split(&dataset.groups)
        .into_iter()
        .enumerate()
    {
        if train_idx.is_empty() || test_idx.is_empty() {
            log::warn!("Fold {} has an empty side, skipping", fold + 1);
            continue;
        }

        let train_rows: Vec<Vec<f64>> =
            train_idx.iter().map(|&i| dataset.features[i].clone()).collect();
        let train_labels: Vec<f32> = train_idx.iter().map(|&i| dataset.labels[i]).collect();
        let test_rows: Vec<Vec<f64>> =
            test_idx.iter().map(|&i| dataset.features[i].clone()).collect();
        let test_labels: Vec<f32> = test_idx.iter().map(|&i| dataset.labels[i]).collect();

        let scaler = Standardization::fit(&train_rows);
        let model = fit_win_model::<B>(device, &scaler.apply(&train_rows), &train_labels, config);
        let probs = predict_win_probs(&model, &scaler.apply(&test_rows), device);

        let fold_report = FoldReport {
            fold,
            accuracy: accuracy(&probs, &test_labels),
            roc_auc: roc_auc(&probs, &test_labels),
        };
        log::info!("{}", fold_report);
        report.push(fold_report);
    }

    report
}

fn log_feature_importance(columns: &[String], coefficients: &[f32]) {
    let mut ranked: Vec<(usize, f32)> = coefficients.iter().copied().enumerate().collect();
    ranked.sort_by(|a, b| {
        b.1.abs()
            .partial_cmp(&a.1.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    log::info!("Strongest win-model coefficients:");
    for (idx, coef) in ranked.into_iter().take(15) {
        if let Some(name) = columns.get(idx) {
            log::info!("  {:>9.4}  {}", coef, name);
        }
    }
}

/// Assemble the set-score feature matrix and its column list: the base
/// matchup features, one-hot winner columns, the win model's probability,
/// and the aggregate feature mismatch per row.
fn set_score_features(
    dataset: &MatchDataset,
    win_probs: &[f32],
) -> (Vec<String>, Vec<Vec<f64>>) {
    let mut winner_teams: Vec<String> = dataset.winners.clone();
    winner_teams.sort();
    winner_teams.dedup();

    let mut columns = dataset.schema.columns.clone();
    columns.extend(winner_teams.iter().map(|t| winner_column(t)));
    columns.push("win_prob".to_string());
    columns.push("feature_diff".to_string());

    let magnitudes = dataset.feature_diff_magnitudes();
    let rows = dataset
        .features
        .iter()
        .enumerate()
        .map(|(i, base)| {
            let mut row = base.clone();
            for team in &winner_teams {
                row.push(if *team == dataset.winners[i] { 1.0 } else { 0.0 });
            }
            row.push(win_probs[i] as f64);
            row.push(magnitudes[i]);
            row
        })
        .collect();

    (columns, rows)
}

/// Train both models on the full match table and write the artifacts to
/// the model directory.
pub fn train_models<B: AutodiffBackend>(
    device: &B::Device,
    config: &Config,
    ctx: &MatchupContext,
    matches: &[MatchRecord],
) -> Result<()>
where
    B::FloatElem: serde::Serialize + serde::de::DeserializeOwned,
    B::IntElem: serde::Serialize + serde::de::DeserializeOwned,
{
    let dataset = MatchDataset::build(matches, ctx);
    if dataset.is_empty() {
        return Err(VolleyError::Parse(
            "match table produced no training rows".to_string(),
        ));
    }

    let wins = dataset.labels.iter().filter(|&&l| l >= 0.5).count();
    log::info!(
        "Outcome distribution: {} home wins, {} away wins",
        wins,
        dataset.len() - wins
    );
    if wins == 0 || wins == dataset.len() {
        let label = if wins == 0 { "away win" } else { "home win" };
        return Err(VolleyError::SingleClass(label.to_string()));
    }

    let report = cross_validate::<B>(device, &dataset, &config.training);
    log::info!("Cross-validation: {}", report);

    // Final fit on everything, with the full-data standardization that
    // inference will reuse
    let scaler = Standardization::fit(&dataset.features);
    let standardized = scaler.apply(&dataset.features);
    let model = fit_win_model::<B>(device, &standardized, &dataset.labels, &config.training);
    log_feature_importance(&dataset.schema.columns, &model.coefficients());

    std::fs::create_dir_all(&config.data.model_dir)?;
    let model_dir = Path::new(&config.data.model_dir);
    model.save(&model_dir.join(WIN_MODEL_FILE).to_string_lossy())?;
    WinModelMeta {
        columns: dataset.schema.columns.clone(),
        mean: scaler.mean.clone(),
        std: scaler.std.clone(),
    }
    .save(&model_dir.join(WIN_META_FILE).to_string_lossy())?;
    log::info!("Win model saved to {}", config.data.model_dir);

    train_set_score_model::<B>(device, config, &dataset, &model, &standardized)
}

fn train_set_score_model<B: AutodiffBackend>(
    device: &B::Device,
    config: &Config,
    dataset: &MatchDataset,
    win_model: &WinModel<B>,
    standardized_base: &[Vec<f64>],
) -> Result<()>
where
    B::FloatElem: serde::Serialize + serde::de::DeserializeOwned,
    B::IntElem: serde::Serialize + serde::de::DeserializeOwned,
{
    let (classes, class_weights) = balanced_class_weights(&dataset.set_scores);
    if classes.len() < 2 {
        log::warn!(
            "Only one set-score class ({:?}) in the match data, skipping set-score model",
            classes
        );
        return Ok(());
    }

    let win_probs = predict_win_probs(win_model, standardized_base, device);
    let (columns, rows) = set_score_features(dataset, &win_probs);

    let class_index: HashMap<&str, usize> = classes
        .iter()
        .enumerate()
        .map(|(i, c)| (c.as_str(), i))
        .collect();
    let class_indices: Vec<usize> = dataset
        .set_scores
        .iter()
        .map(|s| class_index[s.as_str()])
        .collect();

    let scaler = Standardization::fit(&rows);
    let model = fit_set_score_model::<B>(
        device,
        &scaler.apply(&rows),
        &class_indices,
        &class_weights,
        &config.training,
    );

    let model_dir = Path::new(&config.data.model_dir);
    model.save(&model_dir.join(SET_MODEL_FILE).to_string_lossy())?;
    SetScoreMeta {
        columns,
        mean: scaler.mean.clone(),
        std: scaler.std.clone(),
        classes,
    }
    .save(&model_dir.join(SET_META_FILE).to_string_lossy())?;
    log::info!("Set-score model saved to {}", config.data.model_dir);
    Ok(())
}

/// Diagnostics label: trimmed, case-folded winner vs home comparison, so
/// a case-variant winner cell still matches its team
fn winner_is_home(m: &MatchRecord) -> bool {
    m.winner.trim().to_lowercase() == m.home_team.trim().to_lowercase()
}

/// Diagnostic fit on the per-match team stat differentials alone: how
/// predictive are the box-score stats of the recorded winner?
pub fn analyze_match_stats<B: AutodiffBackend>(
    device: &B::Device,
    config: &Config,
    matches: &[MatchRecord],
) -> Result<()> {
    let mut stat_names: Vec<String> = Vec::new();
    for m in matches {
        for pair in &m.team_stats {
            if !stat_names.contains(&pair.stat) {
                stat_names.push(pair.stat.clone());
            }
        }
    }
    if stat_names.is_empty() {
        return Err(VolleyError::Parse(
            "match table carries no team stat pairs".to_string(),
        ));
    }
    let columns: Vec<String> = stat_names.iter().map(|s| format!("diff_{}", s)).collect();

    let mut rows = Vec::with_capacity(matches.len());
    let mut labels = Vec::with_capacity(matches.len());
    for m in matches {
        let row: Vec<f64> = stat_names
            .iter()
            .map(|stat| {
                m.team_stats
                    .iter()
                    .find(|p| &p.stat == stat)
                    .and_then(|p| match (p.home, p.away) {
                        (Some(h), Some(a)) => Some(h - a),
                        _ => None,
                    })
                    .unwrap_or(0.0)
            })
            .collect();
        rows.push(row);
        labels.push(if winner_is_home(m) { 1.0 } else { 0.0 });
    }

    let wins = labels.iter().filter(|&&l| l >= 0.5).count();
    log::info!(
        "Analyzing {} matches, {} stat differentials: {} home wins, {} away wins",
        rows.len(),
        columns.len(),
        wins,
        rows.len() - wins
    );
    if wins == 0 || wins == labels.len() {
        let label = if wins == 0 { "away win" } else { "home win" };
        return Err(VolleyError::SingleClass(label.to_string()));
    }

    let scaler = Standardization::fit(&rows);
    let standardized = scaler.apply(&rows);
    let model = fit_win_model::<B>(device, &standardized, &labels, &config.training);
    let probs = predict_win_probs(&model, &standardized, device);

    log::info!(
        "In-sample fit: accuracy {:.3}, ROC-AUC {:.3}",
        accuracy(&probs, &labels),
        roc_auc(&probs, &labels)
    );
    log_feature_importance(&columns, &model.coefficients());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};

    type B = Autodiff<NdArray<f32>>;

    #[test]
    fn diagnostics_label_matches_case_variant_winner() {
        let m = MatchRecord {
            date: None,
            home_team: "Poland".to_string(),
            away_team: "Italy".to_string(),
            winner: "  POLAND ".to_string(),
            loser: "Italy".to_string(),
            sets: [None; crate::MAX_SETS],
            team_stats: Vec::new(),
        };
        assert!(winner_is_home(&m));
        // The training-path label stays trimmed-exact
        assert!(!m.home_won());
    }

    #[test]
    fn standardization_centers_and_scales() {
        let rows = vec![vec![1.0, 10.0], vec![3.0, 10.0]];
        let scaler = Standardization::fit(&rows);
        assert_eq!(scaler.mean, vec![2.0, 10.0]);
        // Constant column keeps std 1.0
        assert_eq!(scaler.std[1], 1.0);
        let out = scaler.apply(&rows);
        assert!((out[0][0] + 1.0).abs() < 1e-9);
        assert!((out[1][0] - 1.0).abs() < 1e-9);
        assert_eq!(out[0][1], 0.0);
    }

    #[test]
    fn win_model_learns_a_separable_problem() {
        let device = Default::default();
        let features: Vec<Vec<f64>> = vec![
            vec![2.0],
            vec![1.5],
            vec![1.0],
            vec![-1.0],
            vec![-1.5],
            vec![-2.0],
        ];
        let labels = vec![1.0, 1.0, 1.0, 0.0, 0.0, 0.0];
        let config = TrainingConfig {
            epochs: 500,
            learning_rate: 0.5,
            folds: 2,
        };
        let model = fit_win_model::<B>(&device, &features, &labels, &config);
        let probs = predict_win_probs(&model, &features, &device);
        assert!((accuracy(&probs, &labels) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn set_score_model_separates_two_classes() {
        let device = Default::default();
        let features: Vec<Vec<f64>> = vec![vec![2.0], vec![1.5], vec![-1.5], vec![-2.0]];
        let class_indices = vec![0, 0, 1, 1];
        let class_weights = vec![1.0, 1.0];
        let config = TrainingConfig {
            epochs: 500,
            learning_rate: 0.5,
            folds: 2,
        };
        let model =
            fit_set_score_model::<B>(&device, &features, &class_indices, &class_weights, &config);
        let probs = model
            .forward(to_tensor::<B>(&features, &device))
            .into_data();
        let slice = probs.as_slice::<f32>().unwrap();
        assert!(slice[0] > slice[1]);
        assert!(slice[7] > slice[6]);
    }
}

//! Evaluation metrics
//!
//! Classification accuracy and rank-based ROC-AUC, plus the per-fold
//! report the cross-validation loop prints.

use std::fmt;

/// Fraction of predictions on the right side of 0.5
pub fn accuracy(probs: &[f32], labels: &[f32]) -> f64 {
    if probs.is_empty() {
        return f64::NAN;
    }
    let correct = probs
        .iter()
        .zip(labels.iter())
        .filter(|(p, t)| (**p >= 0.5) == (**t >= 0.5))
        .count();
    correct as f64 / probs.len() as f64
}

/// Area under the ROC curve via the rank-sum (Mann-Whitney) identity,
/// with tied scores receiving their average rank. NaN when either class
/// is absent.
pub fn roc_auc(probs: &[f32], labels: &[f32]) -> f64 {
    let n = probs.len();
    let n_pos = labels.iter().filter(|&&t| t >= 0.5).count();
    let n_neg = n - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return f64::NAN;
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        probs[a]
            .partial_cmp(&probs[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    // Average ranks over runs of tied scores
    let mut ranks = vec![0.0f64; n];
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j + 1 < n && probs[order[j + 1]] == probs[order[i]] {
            j += 1;
        }
        let avg_rank = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = avg_rank;
        }
        i = j + 1;
    }

    let rank_sum_pos: f64 = labels
        .iter()
        .zip(ranks.iter())
        .filter(|(t, _)| **t >= 0.5)
        .map(|(_, r)| r)
        .sum();

    let n_pos = n_pos as f64;
    let n_neg = n_neg as f64;
    (rank_sum_pos - n_pos * (n_pos + 1.0) / 2.0) / (n_pos * n_neg)
}

/// Held-out metrics for one cross-validation fold
#[derive(Debug, Clone)]
pub struct FoldReport {
    pub fold: usize,
    pub accuracy: f64,
    pub roc_auc: f64,
}

impl fmt::Display for FoldReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Fold {}: accuracy {:.3}, ROC-AUC {:.3}",
            self.fold + 1,
            self.accuracy,
            self.roc_auc
        )
    }
}

/// Collected fold reports with mean summaries
#[derive(Debug, Clone, Default)]
pub struct CrossValReport {
    pub folds: Vec<FoldReport>,
}

impl CrossValReport {
    pub fn push(&mut self, report: FoldReport) {
        self.folds.push(report);
    }

    pub fn mean_accuracy(&self) -> f64 {
        mean(self.folds.iter().map(|f| f.accuracy))
    }

    /// Mean over folds where AUC was defined
    pub fn mean_roc_auc(&self) -> f64 {
        mean(self.folds.iter().map(|f| f.roc_auc).filter(|v| !v.is_nan()))
    }
}

impl fmt::Display for CrossValReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} folds: mean accuracy {:.3}, mean ROC-AUC {:.3}",
            self.folds.len(),
            self.mean_accuracy(),
            self.mean_roc_auc()
        )
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let collected: Vec<f64> = values.collect();
    if collected.is_empty() {
        f64::NAN
    } else {
        collected.iter().sum::<f64>() / collected.len() as f64
    }
}

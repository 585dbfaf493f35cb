//! Match prediction from saved model artifacts
//!
//! Loads the win model (required) and the set-score model (optional),
//! rebuilds the training-time feature layout from their JSON sidecars,
//! and predicts a winner with an optional set score for any matchup.

use burn::prelude::Backend;
use std::path::Path;

use crate::data::dataset::FeatureSchema;
use crate::features::matchup::{FeatureRow, MatchupContext};
use crate::model::set_score::winner_column;
use crate::model::{
    SetScoreMeta, SetScoreModel, WinModel, WinModelMeta, SET_META_FILE, SET_MODEL_FILE,
    WIN_META_FILE, WIN_MODEL_FILE,
};
use crate::training::trainer::{predict_win_probs, to_tensor, Standardization};
use crate::{Config, MatchPrediction, Result, SetScorePrediction, VolleyError};

pub struct Predictor<B: Backend> {
    win_model: WinModel<B>,
    win_meta: WinModelMeta,
    set_model: Option<SetScoreModel<B>>,
    set_meta: Option<SetScoreMeta>,
    device: B::Device,
}

impl<B: Backend> Predictor<B>
where
    B::FloatElem: serde::Serialize + serde::de::DeserializeOwned,
    B::IntElem: serde::Serialize + serde::de::DeserializeOwned,
{
    /// Load both models from the model directory. A missing win model is
    /// an error; a missing set-score model just disables set-score output.
    pub fn load(config: &Config, device: B::Device) -> Result<Self> {
        let model_dir = Path::new(&config.data.model_dir);

        if !model_dir.join(format!("{}.mpk", WIN_MODEL_FILE)).exists() {
            return Err(VolleyError::NoModel);
        }
        let win_meta = WinModelMeta::load(&model_dir.join(WIN_META_FILE).to_string_lossy())?;
        let win_model = WinModel::load(
            &device,
            &model_dir.join(WIN_MODEL_FILE).to_string_lossy(),
            win_meta.columns.len(),
        )?;

        let (set_model, set_meta) =
            if model_dir.join(format!("{}.mpk", SET_MODEL_FILE)).exists() {
                let meta = SetScoreMeta::load(&model_dir.join(SET_META_FILE).to_string_lossy())?;
                let model = SetScoreModel::load(
                    &device,
                    &model_dir.join(SET_MODEL_FILE).to_string_lossy(),
                    meta.columns.len(),
                    meta.classes.len(),
                )?;
                (Some(model), Some(meta))
            } else {
                log::info!("No set-score model artifact, predicting winner only");
                (None, None)
            };

        Ok(Predictor {
            win_model,
            win_meta,
            set_model,
            set_meta,
            device,
        })
    }

    /// Predict the outcome of team A hosting team B
    pub fn predict(
        &self,
        ctx: &MatchupContext,
        team_a: &str,
        team_b: &str,
    ) -> Result<MatchPrediction> {
        let row = ctx.build(team_a, team_b);
        let schema = FeatureSchema {
            columns: self.win_meta.columns.clone(),
        };
        let base = schema.reindex(&row);
        let scaler = Standardization {
            mean: self.win_meta.mean.clone(),
            std: self.win_meta.std.clone(),
        };

        let prob_a = predict_win_probs(&self.win_model, &[scaler.apply_row(&base)], &self.device)
            .first()
            .copied()
            .unwrap_or(0.5) as f64;

        let (winner, loser, win_probability) = if prob_a >= 0.5 {
            (team_a, team_b, prob_a)
        } else {
            (team_b, team_a, 1.0 - prob_a)
        };

        let set_score = self.predict_set_score(&base, winner, win_probability);

        Ok(MatchPrediction {
            winner: winner.to_string(),
            loser: loser.to_string(),
            win_probability,
            set_score,
        })
    }

    /// Most likely set-score class, None when no set-score model is loaded
    fn predict_set_score(
        &self,
        base: &[f64],
        winner: &str,
        win_probability: f64,
    ) -> Option<SetScorePrediction> {
        let (model, meta) = match (&self.set_model, &self.set_meta) {
            (Some(model), Some(meta)) => (model, meta),
            _ => return None,
        };

        let mut row = FeatureRow::default();
        for (name, value) in self.win_meta.columns.iter().zip(base.iter()) {
            row.push(name.clone(), *value);
        }
        row.push(winner_column(winner), 1.0);
        row.push("win_prob".to_string(), win_probability);
        row.push(
            "feature_diff".to_string(),
            base.iter().map(|v| v.abs()).sum(),
        );

        let schema = FeatureSchema {
            columns: meta.columns.clone(),
        };
        let scaler = Standardization {
            mean: meta.mean.clone(),
            std: meta.std.clone(),
        };
        let input = scaler.apply_row(&schema.reindex(&row));

        let probs = model
            .forward(to_tensor::<B>(&[input], &self.device))
            .into_data();
        let slice = probs.as_slice::<f32>().ok()?;
        let (best, probability) = slice
            .iter()
            .copied()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))?;

        Some(SetScorePrediction {
            score: meta.classes.get(best)?.clone(),
            probability: probability as f64,
        })
    }
}

/// One-line human-readable rendering of a prediction, probabilities to
/// two decimals
pub fn format_prediction(team_a: &str, team_b: &str, prediction: &MatchPrediction) -> String {
    let mut line = format!(
        "{} vs {}: {} wins (probability {:.2})",
        team_a, team_b, prediction.winner, prediction.win_probability
    );
    if let Some(set_score) = &prediction.set_score {
        line.push_str(&format!(
            ", predicted sets {} (probability {:.2})",
            set_score.score, set_score.probability
        ));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_winner_only_prediction() {
        let prediction = MatchPrediction {
            winner: "Poland".to_string(),
            loser: "Italy".to_string(),
            win_probability: 0.73,
            set_score: None,
        };
        let line = format_prediction("Poland", "Italy", &prediction);
        assert_eq!(line, "Poland vs Italy: Poland wins (probability 0.73)");
    }

    #[test]
    fn formats_set_score_when_present() {
        let prediction = MatchPrediction {
            winner: "Italy".to_string(),
            loser: "Poland".to_string(),
            win_probability: 0.6,
            set_score: Some(SetScorePrediction {
                score: "3-1".to_string(),
                probability: 0.41,
            }),
        };
        let line = format_prediction("Poland", "Italy", &prediction);
        assert!(line.contains("Italy wins (probability 0.60)"));
        assert!(line.contains("predicted sets 3-1 (probability 0.41)"));
    }
}

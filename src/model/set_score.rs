//! Multinomial set-score model
//!
//! Softmax regression over the set-score classes ("3-0", "3-1", "3-2",
//! and losing mirrors when present). Its feature vector extends the win
//! model's with one-hot winner columns, the predicted win probability,
//! and the aggregate feature mismatch magnitude.

use burn::module::Module;
use burn::nn::{Linear, LinearConfig};
use burn::prelude::Backend;
use burn::record::{FullPrecisionSettings, Recorder};
use burn::tensor::activation::softmax;
use burn::tensor::Tensor;
use serde::{Deserialize, Serialize};

use crate::{Result, VolleyError};

/// One-hot column name for a recorded winner
pub fn winner_column(team: &str) -> String {
    format!("winner_{}", team)
}

#[derive(Module, Debug)]
pub struct SetScoreModel<B: Backend> {
    linear: Linear<B>,
}

impl<B: Backend> SetScoreModel<B> {
    pub fn new(device: &B::Device, n_features: usize, n_classes: usize) -> Self {
        SetScoreModel {
            linear: LinearConfig::new(n_features, n_classes).init(device),
        }
    }

    /// Class probabilities per row, softmax over the class axis
    pub fn forward(&self, features: Tensor<B, 2>) -> Tensor<B, 2> {
        softmax(self.linear.forward(features), 1)
    }

    pub fn save(&self, path: &str) -> Result<()>
    where
        B::FloatElem: serde::Serialize + serde::de::DeserializeOwned,
        B::IntElem: serde::Serialize + serde::de::DeserializeOwned,
    {
        let recorder = burn::record::NamedMpkFileRecorder::<FullPrecisionSettings>::new();
        recorder
            .record(self.clone().into_record(), path.into())
            .map_err(|e| VolleyError::Model(e.to_string()))
    }

    pub fn load(
        device: &B::Device,
        path: &str,
        n_features: usize,
        n_classes: usize,
    ) -> Result<Self>
    where
        B::FloatElem: serde::Serialize + serde::de::DeserializeOwned,
        B::IntElem: serde::Serialize + serde::de::DeserializeOwned,
    {
        let recorder = burn::record::NamedMpkFileRecorder::<FullPrecisionSettings>::new();
        let record = recorder
            .load(path.into(), device)
            .map_err(|e| VolleyError::Model(e.to_string()))?;

        let model = Self::new(device, n_features, n_classes);
        Ok(model.load_record(record))
    }
}

/// Sidecar metadata saved next to the set-score model weights
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetScoreMeta {
    /// Feature columns in training order, one-hot winner columns included
    pub columns: Vec<String>,
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
    /// Set-score class labels in output order (sorted)
    pub classes: Vec<String>,
}

impl SetScoreMeta {
    pub fn save(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)
            .map_err(|e| VolleyError::Model(e.to_string()))
    }

    pub fn load(path: &str) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        serde_json::from_reader(file).map_err(|e| VolleyError::Model(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::ndarray::NdArray;

    type B = NdArray<f32>;

    #[test]
    fn class_probabilities_sum_to_one() {
        let device = Default::default();
        let model = SetScoreModel::<B>::new(&device, 3, 4);
        let x = Tensor::<B, 1>::from_floats([1.0, -0.5, 0.2, 0.0, 2.0, -1.0], &device)
            .reshape([2, 3]);
        let probs = model.forward(x);
        assert_eq!(probs.dims(), [2, 4]);
        let data = probs.into_data();
        let slice = data.as_slice::<f32>().unwrap();
        for row in slice.chunks(4) {
            let sum: f32 = row.iter().sum();
            assert!((sum - 1.0).abs() < 1e-5);
        }
    }
}

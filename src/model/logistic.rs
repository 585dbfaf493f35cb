//! Binary win-probability model
//!
//! A single linear layer with a sigmoid output: logistic regression over
//! the matchup feature vector. The model file carries only the weights;
//! the column schema and standardization parameters live in a JSON
//! sidecar so inference can reproduce the training-time feature layout.

use burn::module::Module;
use burn::nn::{Linear, LinearConfig};
use burn::prelude::Backend;
use burn::record::{FullPrecisionSettings, Recorder};
use burn::tensor::activation::sigmoid;
use burn::tensor::Tensor;
use serde::{Deserialize, Serialize};

use crate::{Result, VolleyError};

#[derive(Module, Debug)]
pub struct WinModel<B: Backend> {
    linear: Linear<B>,
}

impl<B: Backend> WinModel<B> {
    pub fn new(device: &B::Device, n_features: usize) -> Self {
        WinModel {
            linear: LinearConfig::new(n_features, 1).init(device),
        }
    }

    /// Win probability for each row of a standardized feature matrix
    pub fn forward(&self, features: Tensor<B, 2>) -> Tensor<B, 2> {
        sigmoid(self.linear.forward(features))
    }

    /// Per-feature coefficients, in schema column order
    pub fn coefficients(&self) -> Vec<f32> {
        self.linear
            .weight
            .val()
            .into_data()
            .as_slice::<f32>()
            .map(|s| s.to_vec())
            .unwrap_or_default()
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

    pub fn load(device: &B::Device, path: &str, n_features: usize) -> Result<Self>
    where
        B::FloatElem: serde::Serialize + serde::de::DeserializeOwned,
        B::IntElem: serde::Serialize + serde::de::DeserializeOwned,
    {
        let recorder = burn::record::NamedMpkFileRecorder::<FullPrecisionSettings>::new();
        let record = recorder
            .load(path.into(), device)
            .map_err(|e| VolleyError::Model(e.to_string()))?;

        let model = Self::new(device, n_features);
        Ok(model.load_record(record))
    }
}

/// Sidecar metadata saved next to the win model weights
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WinModelMeta {
    /// Feature columns in training order
    pub columns: Vec<String>,
    /// Per-column standardization mean
    pub mean: Vec<f64>,
    /// Per-column standardization std (1.0 where the column was constant)
    pub std: Vec<f64>,
}

impl WinModelMeta {
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
    fn forward_outputs_probabilities() {
        let device = Default::default();
        let model = WinModel::<B>::new(&device, 4);
        let x = Tensor::<B, 1>::from_floats([0.5, -1.0, 2.0, 0.0, 1.0, 1.0, -2.0, 0.3], &device)
            .reshape([2, 4]);
        let probs = model.forward(x);
        assert_eq!(probs.dims(), [2, 1]);
        let data = probs.into_data();
        for &p in data.as_slice::<f32>().unwrap() {
            assert!((0.0..=1.0).contains(&p));
        }
    }

    #[test]
    fn coefficient_count_matches_features() {
        let device = Default::default();
        let model = WinModel::<B>::new(&device, 7);
        assert_eq!(model.coefficients().len(), 7);
    }
}

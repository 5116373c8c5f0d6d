//! Sequence model trait and implementations.
//!
//! The `SequenceModel` trait abstracts over single-step-ahead prediction.
//! Implementations:
//! - `LinearModel`: autoregressive weights exported as JSON (`lstm_<id>.json`)
//! - `OnnxSequenceModel`: exported recurrent network (`lstm_<id>.onnx`, requires `onnx`)

use std::path::Path;

use ndarray::{Array1, ArrayView1};
use pulse_core::{Error, Result, SEQ_LEN};
use serde::Deserialize;

/// Trait for per-building sequence models.
pub trait SequenceModel: Send + Sync {
    /// Predict the next model-scale value from a full input window.
    fn predict_next(&self, window: ArrayView1<'_, f64>) -> Result<f64>;

    /// Number of values the model expects in its input window.
    fn window_len(&self) -> usize {
        SEQ_LEN
    }

    /// Short backend label for logs.
    fn backend(&self) -> &'static str;
}

/// Linear autoregressive model: `bias + Σ wᵢ·xᵢ`.
#[derive(Debug, Clone)]
pub struct LinearModel {
    weights: Array1<f64>,
    bias: f64,
}

#[derive(Deserialize)]
struct LinearModelFile {
    weights: Vec<f64>,
    #[serde(default)]
    bias: f64,
}

impl LinearModel {
    pub fn new(weights: Vec<f64>, bias: f64) -> Self {
        Self {
            weights: Array1::from_vec(weights),
            bias,
        }
    }

    /// Equal weights over the window, i.e. the window mean.
    pub fn window_mean(len: usize) -> Self {
        Self::new(vec![1.0 / len as f64; len], 0.0)
    }

    /// Load weights from a JSON artifact.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|_| Error::MissingArtifact(format!("model {}", path.display())))?;
        let file: LinearModelFile = serde_json::from_str(&raw).map_err(|e| {
            Error::MissingArtifact(format!("malformed model {}: {}", path.display(), e))
        })?;
        if file.weights.len() != SEQ_LEN {
            return Err(Error::MissingArtifact(format!(
                "malformed model {}: expected {} weights, found {}",
                path.display(),
                SEQ_LEN,
                file.weights.len()
            )));
        }
        if !file.bias.is_finite() || file.weights.iter().any(|w| !w.is_finite()) {
            return Err(Error::MissingArtifact(format!(
                "malformed model {}: non-finite weight",
                path.display()
            )));
        }
        Ok(Self::new(file.weights, file.bias))
    }
}

impl SequenceModel for LinearModel {
    fn predict_next(&self, window: ArrayView1<'_, f64>) -> Result<f64> {
        if window.len() != self.weights.len() {
            return Err(Error::Inference(format!(
                "window length {} does not match {} weights",
                window.len(),
                self.weights.len()
            )));
        }
        Ok(self.weights.dot(&window) + self.bias)
    }

    fn window_len(&self) -> usize {
        self.weights.len()
    }

    fn backend(&self) -> &'static str {
        "linear"
    }
}

/// Load a model artifact, choosing the backend from the file extension.
pub fn load_model(path: &Path) -> Result<Box<dyn SequenceModel>> {
    if !path.exists() {
        return Err(Error::MissingArtifact(format!("model {}", path.display())));
    }
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => Ok(Box::new(LinearModel::load(path)?)),
        #[cfg(feature = "onnx")]
        Some("onnx") => Ok(Box::new(crate::onnx_model::OnnxSequenceModel::load(path)?)),
        #[cfg(not(feature = "onnx"))]
        Some("onnx") => Err(Error::MissingArtifact(format!(
            "{} needs the `onnx` feature",
            path.display()
        ))),
        _ => Err(Error::MissingArtifact(format!(
            "unsupported model format {}",
            path.display()
        ))),
    }
}

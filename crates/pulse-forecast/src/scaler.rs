//! Fitted per-building normalization.
//!
//! Scaler artifacts are JSON exports of the fitted parameters:
//! `{"kind": "min_max", "data_min": 10.0, "data_max": 50.0}` or
//! `{"kind": "standard", "mean": 30.0, "scale": 4.2}`.

use std::path::Path;

use pulse_core::{Error, Result};
use serde::{Deserialize, Serialize};

fn default_feature_range() -> (f64, f64) {
    (0.0, 1.0)
}

/// Maps between raw kg CO2e and model-input scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Scaler {
    MinMax {
        data_min: f64,
        data_max: f64,
        #[serde(default = "default_feature_range")]
        feature_range: (f64, f64),
    },
    Standard {
        mean: f64,
        scale: f64,
    },
}

impl Scaler {
    pub fn min_max(data_min: f64, data_max: f64) -> Self {
        Scaler::MinMax {
            data_min,
            data_max,
            feature_range: default_feature_range(),
        }
    }

    /// Load a scaler artifact. Absent or unreadable files are missing artifacts.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|_| Error::MissingArtifact(format!("scaler {}", path.display())))?;
        let scaler: Scaler = serde_json::from_str(&raw).map_err(|e| {
            Error::MissingArtifact(format!("malformed scaler {}: {}", path.display(), e))
        })?;
        scaler.validate().map_err(|msg| {
            Error::MissingArtifact(format!("malformed scaler {}: {}", path.display(), msg))
        })?;
        Ok(scaler)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        let finite = match self {
            Scaler::MinMax {
                data_min,
                data_max,
                feature_range: (lo, hi),
            } => [*data_min, *data_max, *lo, *hi].iter().all(|v| v.is_finite()),
            Scaler::Standard { mean, scale } => mean.is_finite() && scale.is_finite(),
        };
        if !finite {
            return Err("non-finite parameter".into());
        }
        if let Scaler::MinMax {
            feature_range: (lo, hi),
            ..
        } = self
        {
            if hi <= lo {
                return Err("feature_range must be increasing".into());
            }
        }
        Ok(())
    }

    /// Raw value to model scale.
    pub fn transform(&self, raw: f64) -> f64 {
        match *self {
            Scaler::MinMax {
                data_min,
                data_max,
                feature_range: (lo, hi),
            } => (raw - data_min) * (hi - lo) / nonzero(data_max - data_min) + lo,
            Scaler::Standard { mean, scale } => (raw - mean) / nonzero(scale),
        }
    }

    /// Model-scale value back to raw kg CO2e.
    pub fn inverse_transform(&self, scaled: f64) -> f64 {
        match *self {
            Scaler::MinMax {
                data_min,
                data_max,
                feature_range: (lo, hi),
            } => (scaled - lo) * nonzero(data_max - data_min) / (hi - lo) + data_min,
            Scaler::Standard { mean, scale } => scaled * nonzero(scale) + mean,
        }
    }
}

// A constant feature was fitted with zero spread; treat its scale as 1.
fn nonzero(spread: f64) -> f64 {
    if spread == 0.0 {
        1.0
    } else {
        spread
    }
}

//! Forecast run types.

use std::path::PathBuf;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::store::ForecastStore;

/// Model and scaler files discovered for one building.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelArtifacts {
    pub building: String,
    pub model: PathBuf,
    pub scaler: PathBuf,
}

/// A building left out of a run, with the reason.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedBuilding {
    pub building: String,
    pub reason: String,
}

/// Outcome of one full forecasting run.
#[derive(Debug, Clone)]
pub struct ForecastRun {
    /// Alignment boundary every entry starts at.
    pub boundary: NaiveDateTime,
    pub store: ForecastStore,
    pub skipped: Vec<SkippedBuilding>,
}

impl ForecastRun {
    /// Buildings that made it into the store.
    pub fn produced(&self) -> usize {
        self.store.len()
    }

    /// True when no building could be forecast.
    pub fn is_degraded(&self) -> bool {
        self.store.is_empty()
    }
}

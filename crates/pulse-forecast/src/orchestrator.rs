//! Forecast orchestrator: discovers per-building artifacts, forecasts each
//! building, and replaces the persisted store.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use pulse_core::{DataPaths, Error, PulseConfig, Result};
use tracing::{error, info, warn};

use crate::forecaster::forecast_building;
use crate::history::{load_history, HistoricalSeries};
use crate::model::load_model;
use crate::scaler::Scaler;
use crate::store::{ForecastEntry, ForecastStore};
use crate::time::{format_timestamp, TimeAligner};
use crate::types::*;

const MODEL_PREFIX: &str = "lstm_";
const SCALER_PREFIX: &str = "scaler_";

/// Runs the full forecasting pipeline over every discovered building.
pub struct ForecastOrchestrator {
    paths: DataPaths,
    aligner: TimeAligner,
}

impl ForecastOrchestrator {
    pub fn new(config: &PulseConfig) -> Self {
        Self::with_paths(config.data_paths.clone(), TimeAligner::new(config.utc_offset))
    }

    /// Create with explicit paths (for testing and the CLI).
    pub fn with_paths(paths: DataPaths, aligner: TimeAligner) -> Self {
        Self { paths, aligner }
    }

    pub fn paths(&self) -> &DataPaths {
        &self.paths
    }

    pub fn aligner(&self) -> &TimeAligner {
        &self.aligner
    }

    /// Forecast from the current hour boundary.
    pub fn run(&self) -> Result<ForecastRun> {
        self.run_at(self.aligner.current_boundary())
    }

    /// Forecast every building from `boundary` and overwrite the store file.
    ///
    /// Per-building failures are logged and skipped. Only a missing history
    /// file or a failed write aborts the run.
    pub fn run_at(&self, boundary: NaiveDateTime) -> Result<ForecastRun> {
        info!(
            "Forecast run starting at boundary {}",
            format_timestamp(boundary)
        );

        let history = load_history(&self.paths.history_csv)?;
        let artifacts = discover_artifacts(&self.paths.models)?;

        let mut store = ForecastStore::new();
        let mut skipped = Vec::new();

        for artifact in &artifacts {
            match forecast_one(artifact, history.get(&artifact.building), boundary) {
                Ok(entry) => store.insert(artifact.building.clone(), entry),
                Err(e) => {
                    if e.is_per_building() {
                        warn!("Skipping {}: {}", artifact.building, e);
                    } else {
                        error!("Forecast failed for {}: {}", artifact.building, e);
                    }
                    skipped.push(SkippedBuilding {
                        building: artifact.building.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        store.validate()?;
        store.save(&self.paths.forecast_store)?;

        if store.is_empty() {
            warn!(
                "Forecast run produced no buildings ({} discovered)",
                artifacts.len()
            );
        } else {
            info!(
                "Forecast run complete: {} buildings, {} skipped",
                store.len(),
                skipped.len()
            );
        }

        Ok(ForecastRun {
            boundary,
            store,
            skipped,
        })
    }
}

fn forecast_one(
    artifact: &ModelArtifacts,
    series: Option<&HistoricalSeries>,
    boundary: NaiveDateTime,
) -> Result<ForecastEntry> {
    let scaler = Scaler::load(&artifact.scaler)?;
    let model = load_model(&artifact.model)?;
    let empty;
    let series = match series {
        Some(s) => s,
        None => {
            empty = HistoricalSeries::new(artifact.building.clone(), Vec::new());
            &empty
        }
    };
    forecast_building(series, &scaler, model.as_ref(), boundary)
}

/// Find every `lstm_<building>.{onnx,json}` model in `models_dir`, ordered by
/// building id.
///
/// When both formats exist the ONNX export wins if the `onnx` feature is
/// enabled. The scaler is expected next to it as `scaler_<building>.json`;
/// its absence is reported when the building is forecast.
pub fn discover_artifacts(models_dir: &Path) -> Result<Vec<ModelArtifacts>> {
    let entries = match std::fs::read_dir(models_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("Models directory {} does not exist", models_dir.display());
            return Ok(Vec::new());
        }
        Err(e) => return Err(Error::Io(e)),
    };

    let mut models: BTreeMap<String, PathBuf> = BTreeMap::new();
    for entry in entries {
        let path = entry?.path();
        let Some((building, ext)) = model_file_parts(&path) else {
            continue;
        };
        let preferred = match models.get(&building) {
            None => true,
            Some(current) => prefers(ext, current),
        };
        if preferred {
            models.insert(building, path);
        }
    }

    Ok(models
        .into_iter()
        .map(|(building, model)| ModelArtifacts {
            scaler: models_dir.join(format!("{}{}.json", SCALER_PREFIX, building)),
            building,
            model,
        })
        .collect())
}

fn model_file_parts(path: &Path) -> Option<(String, &str)> {
    let ext = path.extension()?.to_str()?;
    if ext != "onnx" && ext != "json" {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let building = stem.strip_prefix(MODEL_PREFIX)?;
    if building.is_empty() {
        return None;
    }
    Some((building.to_string(), ext))
}

fn prefers(candidate_ext: &str, current: &Path) -> bool {
    let current_is_onnx = current.extension().and_then(|e| e.to_str()) == Some("onnx");
    if cfg!(feature = "onnx") {
        candidate_ext == "onnx" && !current_is_onnx
    } else {
        candidate_ext == "json" && current_is_onnx
    }
}

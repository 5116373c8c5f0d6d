//! Carbon Pulse Forecast — hour alignment, per-building sequence models and
//! the recursive 24-hour forecast pipeline.
//!
//! Each building has a `SequenceModel` and a fitted `Scaler`. The
//! `ForecastOrchestrator` runs every building from the current hour boundary
//! and persists the resulting `ForecastStore`. JSON linear models always work;
//! exported ONNX networks need the `onnx` feature.

pub mod forecaster;
pub mod history;
pub mod model;
pub mod onnx_model;
pub mod orchestrator;
pub mod scaler;
pub mod store;
pub mod time;
pub mod types;
pub mod window;

pub use forecaster::forecast_building;
pub use history::{load_history, read_emission_rows, EmissionRow, HistoricalSeries, Observation};
pub use model::{load_model, LinearModel, SequenceModel};
pub use orchestrator::{discover_artifacts, ForecastOrchestrator};
pub use scaler::Scaler;
pub use store::{ForecastEntry, ForecastStore};
pub use time::TimeAligner;
pub use types::*;
pub use window::RollingWindow;

#[cfg(feature = "onnx")]
pub use onnx_model::OnnxSequenceModel;

//! Carbon Pulse Core — shared errors, configuration and data paths.

pub mod config;
pub mod error;

pub use config::{DataPaths, PulseConfig};
pub use error::{Error, Result};

/// Number of hourly observations in a model input window (7 days).
pub const SEQ_LEN: usize = 168;

/// Number of hourly steps in a forecast.
pub const FORECAST_HORIZON: usize = 24;

/// Timestamp format used in the forecast store and historical CSV.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Round to two decimal places, the precision of every stored and served value.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

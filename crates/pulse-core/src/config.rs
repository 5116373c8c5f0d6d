//! Configuration and data directory management.

use std::path::{Path, PathBuf};

use chrono::{FixedOffset, Offset, Utc};
use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};

/// Default development origins allowed through CORS.
pub const DEFAULT_CORS_ORIGINS: &[&str] = &[
    "http://localhost:8080",
    "http://127.0.0.1:8080",
    "http://localhost:8081",
    "http://127.0.0.1:8081",
];

/// Paths to all Carbon Pulse data files.
#[derive(Debug, Clone, Serialize)]
pub struct DataPaths {
    /// Root data directory (e.g., `data/`).
    pub root: PathBuf,
    /// Per-building model and scaler artifacts (`data/models/`).
    pub models: PathBuf,
    /// Persisted forecast store (`data/emissions.json`).
    pub forecast_store: PathBuf,
    /// Hourly historical emissions (`data/snuc_carbon_year_2025.csv`).
    pub history_csv: PathBuf,
    /// Campus GeoJSON annotated after each query (`data/campus.json`).
    pub map_file: PathBuf,
}

impl DataPaths {
    /// Create data paths from a root directory. Creates directories if needed.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        let paths = Self {
            models: root.join("models"),
            forecast_store: root.join("emissions.json"),
            history_csv: root.join("snuc_carbon_year_2025.csv"),
            map_file: root.join("campus.json"),
            root,
        };
        paths.ensure_dirs()?;
        Ok(paths)
    }

    fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.models)?;
        Ok(())
    }
}

/// Top-level Carbon Pulse configuration.
#[derive(Debug, Clone, Serialize)]
pub struct PulseConfig {
    /// HTTP server port.
    pub port: u16,
    /// Data directory paths.
    pub data_paths: DataPaths,
    /// Fixed offset the alignment boundary is computed in.
    #[serde(serialize_with = "serialize_offset")]
    pub utc_offset: FixedOffset,
    /// Origins allowed through CORS.
    pub cors_origins: Vec<String>,
    /// Run a forecast before serving.
    pub forecast_on_start: bool,
}

impl PulseConfig {
    /// Create configuration from environment and defaults.
    pub fn from_env(data_dir: impl AsRef<Path>) -> Result<Self> {
        Self::from_lookup(data_dir, |key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(data_dir: impl AsRef<Path>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = lookup("PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(8000);

        let mut data_paths = DataPaths::new(data_dir)?;
        if let Some(csv) = lookup("PULSE_HISTORY_CSV") {
            data_paths.history_csv = PathBuf::from(csv);
        }
        if let Some(map) = lookup("PULSE_MAP_FILE") {
            data_paths.map_file = PathBuf::from(map);
        }

        let utc_offset = match lookup("PULSE_UTC_OFFSET") {
            Some(raw) => parse_utc_offset(&raw)?,
            None => utc(),
        };

        let cors_origins = lookup("CORS_ORIGINS")
            .map(|raw| parse_origins(&raw))
            .filter(|origins| !origins.is_empty())
            .unwrap_or_else(|| DEFAULT_CORS_ORIGINS.iter().map(|s| s.to_string()).collect());

        let forecast_on_start = lookup("PULSE_FORECAST_ON_START")
            .map(|v| !matches!(v.trim().to_lowercase().as_str(), "0" | "false" | "no" | "off"))
            .unwrap_or(true);

        debug!(
            "Configuration: port={}, offset={}, data={}",
            port,
            utc_offset,
            data_paths.root.display()
        );

        Ok(Self {
            port,
            data_paths,
            utc_offset,
            cors_origins,
            forecast_on_start,
        })
    }
}

fn utc() -> FixedOffset {
    Utc.fix()
}

/// Parse a fixed UTC offset such as `+05:30`, `-0300` or `Z`.
pub fn parse_utc_offset(raw: &str) -> Result<FixedOffset> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("z") || trimmed.eq_ignore_ascii_case("utc") {
        return Ok(utc());
    }
    trimmed
        .parse::<FixedOffset>()
        .map_err(|e| Error::Config(format!("invalid PULSE_UTC_OFFSET \"{}\": {}", raw, e)))
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}

fn serialize_offset<S: serde::Serializer>(
    offset: &FixedOffset,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&offset.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = PulseConfig::from_lookup(dir.path(), lookup_from(&[])).unwrap();
        assert_eq!(config.port, 8000);
        assert_eq!(config.utc_offset.local_minus_utc(), 0);
        assert_eq!(config.cors_origins.len(), 4);
        assert!(config.forecast_on_start);
        assert!(config.data_paths.models.is_dir());
        assert_eq!(config.data_paths.forecast_store, dir.path().join("emissions.json"));
    }

    #[test]
    fn test_env_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let config = PulseConfig::from_lookup(
            dir.path(),
            lookup_from(&[
                ("PORT", "9100"),
                ("PULSE_UTC_OFFSET", "+05:30"),
                ("CORS_ORIGINS", "https://pulse.example.edu, http://localhost:3000 ,"),
                ("PULSE_FORECAST_ON_START", "false"),
                ("PULSE_HISTORY_CSV", "/srv/history.csv"),
            ]),
        )
        .unwrap();
        assert_eq!(config.port, 9100);
        assert_eq!(config.utc_offset.local_minus_utc(), 5 * 3600 + 30 * 60);
        assert_eq!(
            config.cors_origins,
            vec!["https://pulse.example.edu", "http://localhost:3000"]
        );
        assert!(!config.forecast_on_start);
        assert_eq!(config.data_paths.history_csv, PathBuf::from("/srv/history.csv"));
    }

    #[test]
    fn test_bad_offset_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let result =
            PulseConfig::from_lookup(dir.path(), lookup_from(&[("PULSE_UTC_OFFSET", "Mars/Base")]));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_parse_utc_offset_variants() {
        assert_eq!(parse_utc_offset("Z").unwrap().local_minus_utc(), 0);
        assert_eq!(parse_utc_offset("utc").unwrap().local_minus_utc(), 0);
        assert_eq!(parse_utc_offset("-03:00").unwrap().local_minus_utc(), -3 * 3600);
    }
}

//! Historical hourly emissions loaded from the campus CSV export.

use std::collections::HashMap;
use std::path::Path;

use chrono::NaiveDateTime;
use pulse_core::{Error, Result};
use serde::Deserialize;
use tracing::{info, warn};

use crate::time::parse_timestamp;

/// One CSV row as exported by the metering pipeline.
#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "Timestamp")]
    timestamp: String,
    #[serde(rename = "Building_ID")]
    building_id: String,
    #[serde(rename = "Total_CO2e_kg")]
    total_co2e_kg: f64,
}

/// A parsed emission reading.
#[derive(Debug, Clone, PartialEq)]
pub struct EmissionRow {
    pub timestamp: NaiveDateTime,
    pub building_id: String,
    pub value: f64,
}

/// A single hourly observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub timestamp: NaiveDateTime,
    pub value: f64,
}

/// Observations for one building, strictly increasing in time.
#[derive(Debug, Clone)]
pub struct HistoricalSeries {
    building: String,
    observations: Vec<Observation>,
}

impl HistoricalSeries {
    /// Build a series, sorting by timestamp and dropping repeated timestamps.
    pub fn new(building: impl Into<String>, mut observations: Vec<Observation>) -> Self {
        observations.sort_by_key(|o| o.timestamp);
        observations.dedup_by_key(|o| o.timestamp);
        Self {
            building: building.into(),
            observations,
        }
    }

    pub fn building(&self) -> &str {
        &self.building
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// The last `len` observations at or before `boundary`.
    pub fn window_ending_at(&self, boundary: NaiveDateTime, len: usize) -> Result<&[Observation]> {
        let end = self
            .observations
            .partition_point(|o| o.timestamp <= boundary);
        if end < len {
            return Err(Error::InsufficientHistory {
                building: self.building.clone(),
                needed: len,
                available: end,
            });
        }
        Ok(&self.observations[end - len..end])
    }
}

/// Read every well-formed row of the emissions CSV, in file order.
pub fn read_emission_rows(path: &Path) -> Result<Vec<EmissionRow>> {
    if !path.exists() {
        return Err(Error::NotFound(format!(
            "historical data file {}",
            path.display()
        )));
    }

    let mut reader = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();
    let mut skipped = 0usize;

    for record in reader.deserialize::<CsvRow>() {
        let row = match record {
            Ok(r) => r,
            Err(_) => {
                skipped += 1;
                continue;
            }
        };
        let timestamp = match parse_timestamp(&row.timestamp) {
            Ok(ts) => ts,
            Err(_) => {
                skipped += 1;
                continue;
            }
        };
        if !row.total_co2e_kg.is_finite() {
            skipped += 1;
            continue;
        }
        rows.push(EmissionRow {
            timestamp,
            building_id: row.building_id.trim().to_string(),
            value: row.total_co2e_kg,
        });
    }

    if skipped > 0 {
        warn!("Skipped {} malformed rows in {}", skipped, path.display());
    }
    info!("Loaded {} historical rows from {}", rows.len(), path.display());

    Ok(rows)
}

/// Group rows into one series per building.
pub fn group_by_building(rows: &[EmissionRow]) -> HashMap<String, HistoricalSeries> {
    let mut grouped: HashMap<String, Vec<Observation>> = HashMap::new();
    for row in rows {
        grouped
            .entry(row.building_id.clone())
            .or_default()
            .push(Observation {
                timestamp: row.timestamp,
                value: row.value,
            });
    }
    grouped
        .into_iter()
        .map(|(building, obs)| {
            let series = HistoricalSeries::new(building.clone(), obs);
            (building, series)
        })
        .collect()
}

/// Load the CSV and group it per building.
pub fn load_history(path: &Path) -> Result<HashMap<String, HistoricalSeries>> {
    let rows = read_emission_rows(path)?;
    Ok(group_by_building(&rows))
}

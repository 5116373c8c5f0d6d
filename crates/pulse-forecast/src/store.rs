//! Forecast store: per-building 24-hour forecasts and their JSON file form.
//!
//! On disk the store is a JSON object `building_id → { "YYYY-MM-DD HH:MM:SS": value }`.
//! Building order and timestamp order are preserved across save/load.

use std::fmt;
use std::path::Path;

use chrono::{Duration, NaiveDateTime};
use pulse_core::{Error, Result, FORECAST_HORIZON};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::{info, warn};

use crate::time::{format_timestamp, parse_timestamp};

/// Hourly forecast for one building, ordered by timestamp.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ForecastEntry {
    points: Vec<(NaiveDateTime, f64)>,
}

impl ForecastEntry {
    /// Build an entry; points are sorted by timestamp.
    pub fn new(mut points: Vec<(NaiveDateTime, f64)>) -> Self {
        points.sort_by_key(|(ts, _)| *ts);
        Self { points }
    }

    pub fn points(&self) -> &[(NaiveDateTime, f64)] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|(_, v)| *v)
    }

    pub fn total(&self) -> f64 {
        self.values().sum()
    }

    /// Exactly 24 points, each one hour after the previous.
    pub fn is_complete(&self) -> bool {
        self.points.len() == FORECAST_HORIZON
            && self
                .points
                .windows(2)
                .all(|pair| pair[1].0 - pair[0].0 == Duration::hours(1))
    }
}

impl Serialize for ForecastEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.points.len()))?;
        for (ts, value) in &self.points {
            map.serialize_entry(&format_timestamp(*ts), value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ForecastEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct EntryVisitor;

        impl<'de> Visitor<'de> for EntryVisitor {
            type Value = ForecastEntry;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of timestamp strings to emission values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<ForecastEntry, A::Error> {
                let mut points = Vec::with_capacity(access.size_hint().unwrap_or(FORECAST_HORIZON));
                while let Some((key, value)) = access.next_entry::<String, f64>()? {
                    let ts = parse_timestamp(&key).map_err(serde::de::Error::custom)?;
                    points.push((ts, value));
                }
                Ok(ForecastEntry::new(points))
            }
        }

        deserializer.deserialize_map(EntryVisitor)
    }
}

/// All building forecasts from one run, in discovery order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ForecastStore {
    buildings: Vec<(String, ForecastEntry)>,
}

impl ForecastStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a building's entry. New buildings go last.
    pub fn insert(&mut self, building: impl Into<String>, entry: ForecastEntry) {
        let building = building.into();
        match self.buildings.iter_mut().find(|(id, _)| *id == building) {
            Some(slot) => slot.1 = entry,
            None => self.buildings.push((building, entry)),
        }
    }

    pub fn get(&self, building: &str) -> Option<&ForecastEntry> {
        self.buildings
            .iter()
            .find(|(id, _)| id == building)
            .map(|(_, entry)| entry)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ForecastEntry)> + '_ {
        self.buildings.iter().map(|(id, entry)| (id.as_str(), entry))
    }

    pub fn building_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.buildings.iter().map(|(id, _)| id.as_str())
    }

    pub fn len(&self) -> usize {
        self.buildings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buildings.is_empty()
    }

    /// Every value of every building.
    pub fn all_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.buildings.iter().flat_map(|(_, entry)| entry.values())
    }

    /// Check that every entry spans 24 contiguous hours.
    pub fn validate(&self) -> Result<()> {
        for (building, entry) in &self.buildings {
            if !entry.is_complete() {
                return Err(Error::Internal(format!(
                    "forecast for {} has {} points or a gap",
                    building,
                    entry.len()
                )));
            }
        }
        Ok(())
    }

    /// Remove entries that do not span 24 contiguous hours. Returns the
    /// ids removed, in store order.
    pub fn retain_complete(&mut self) -> Vec<String> {
        let mut dropped = Vec::new();
        self.buildings.retain(|(building, entry)| {
            let keep = entry.is_complete();
            if !keep {
                dropped.push(building.clone());
            }
            keep
        });
        dropped
    }

    /// Load a persisted store. An absent file is `NotFound`.
    ///
    /// Incomplete entries are dropped with a warning, so a loaded store
    /// always passes [`ForecastStore::validate`].
    pub fn load(path: &Path) -> Result<Self> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::NotFound(format!("forecast store {}", path.display())));
            }
            Err(e) => return Err(e.into()),
        };
        let mut store: ForecastStore = serde_json::from_str(&raw)?;
        for building in store.retain_complete() {
            warn!(
                "Dropping forecast for {} from {}: not 24 contiguous hours",
                building,
                path.display()
            );
        }
        info!(
            "Loaded forecast store with {} buildings from {}",
            store.len(),
            path.display()
        );
        Ok(store)
    }

    /// Load a store, treating any failure as an empty store.
    pub fn load_or_empty(path: &Path) -> Self {
        match Self::load(path) {
            Ok(store) => store,
            Err(Error::NotFound(_)) => Self::new(),
            Err(e) => {
                warn!("Ignoring unreadable forecast store {}: {}", path.display(), e);
                Self::new()
            }
        }
    }

    /// Persist the store, replacing any previous file in one rename.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, path)?;
        info!("Saved forecast store ({} buildings) to {}", self.len(), path.display());
        Ok(())
    }
}

impl Serialize for ForecastStore {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.buildings.len()))?;
        for (building, entry) in &self.buildings {
            map.serialize_entry(building, entry)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ForecastStore {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct StoreVisitor;

        impl<'de> Visitor<'de> for StoreVisitor {
            type Value = ForecastStore;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of building ids to hourly forecasts")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<ForecastStore, A::Error> {
                let mut store = ForecastStore::new();
                while let Some((building, entry)) = access.next_entry::<String, ForecastEntry>()? {
                    store.insert(building, entry);
                }
                Ok(store)
            }
        }

        deserializer.deserialize_map(StoreVisitor)
    }
}

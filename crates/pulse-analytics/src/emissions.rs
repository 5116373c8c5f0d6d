//! Emissions query service: one value per building for an hour of day, with a
//! heat score normalized against the whole forecast store.

use chrono::Timelike;
use pulse_core::{round2, Error, Result};
use pulse_forecast::ForecastStore;
use serde::Serialize;
use tracing::debug;

/// One building's forecast at the queried hour.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildingEmission {
    pub building_id: String,
    pub total_emission: f64,
    /// 0–100 against the store-wide min/max.
    pub scaled_emission: f64,
}

/// Response for an hour-of-day query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub hour: u32,
    pub results: Vec<BuildingEmission>,
}

/// Smallest and largest value across every building and hour.
pub fn global_extremes(store: &ForecastStore) -> Option<(f64, f64)> {
    store.all_values().fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

/// Map `value` onto 0–100 between `min` and `max`; 0 when the range is empty.
pub fn heat_score(value: f64, min: f64, max: f64) -> f64 {
    if max == min {
        0.0
    } else {
        (value - min) / (max - min) * 100.0
    }
}

/// Look up every building's forecast for `target_hour` (0–23).
///
/// For each building the first point in timestamp order whose hour of day
/// matches is used. Buildings without a match are left out.
pub fn query(store: &ForecastStore, target_hour: i64) -> Result<QueryResult> {
    let hour = u32::try_from(target_hour)
        .ok()
        .filter(|h| *h <= 23)
        .ok_or_else(|| Error::InvalidArgument("Hour must be between 0 and 23".into()))?;

    if store.is_empty() {
        return Err(Error::NotFound("No forecast data available".into()));
    }

    let matches: Vec<(&str, f64)> = store
        .iter()
        .filter_map(|(building, entry)| {
            entry
                .points()
                .iter()
                .find(|(ts, _)| ts.hour() == hour)
                .map(|(_, value)| (building, *value))
        })
        .collect();

    if matches.is_empty() {
        return Err(Error::NotFound(format!("No data found for hour {}", hour)));
    }

    let (min, max) = global_extremes(store)
        .ok_or_else(|| Error::NotFound("No forecast data available".into()))?;
    debug!("Hour {} query: {} buildings, range {}..{}", hour, matches.len(), min, max);

    let results = matches
        .into_iter()
        .map(|(building, value)| BuildingEmission {
            building_id: building.to_string(),
            total_emission: round2(value),
            scaled_emission: round2(heat_score(value, min, max)),
        })
        .collect();

    Ok(QueryResult { hour, results })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, NaiveDateTime};
    use pulse_forecast::ForecastEntry;

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 14)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn entry(values: impl Fn(usize) -> f64) -> ForecastEntry {
        ForecastEntry::new(
            (0..24)
                .map(|h| (start() + Duration::hours(h as i64), values(h)))
                .collect(),
        )
    }

    #[test]
    fn test_two_building_extremes() {
        let mut store = ForecastStore::new();
        store.insert("A", entry(|_| 100.0));
        store.insert("B", entry(|_| 0.0));

        let result = query(&store, 0).unwrap();
        assert_eq!(result.hour, 0);
        assert_eq!(
            result.results,
            vec![
                BuildingEmission {
                    building_id: "A".into(),
                    total_emission: 100.0,
                    scaled_emission: 100.0,
                },
                BuildingEmission {
                    building_id: "B".into(),
                    total_emission: 0.0,
                    scaled_emission: 0.0,
                },
            ]
        );
    }

    #[test]
    fn test_out_of_range_hours_are_rejected() {
        let store = ForecastStore::new();
        for hour in [24, -1, 1000] {
            assert!(matches!(query(&store, hour), Err(Error::InvalidArgument(_))));
        }
    }

    #[test]
    fn test_empty_store_is_not_found() {
        assert!(matches!(
            query(&ForecastStore::new(), 5),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_heat_uses_whole_store_extremes() {
        // At hour 3 both buildings sit mid-range; the extremes live at other hours.
        let mut store = ForecastStore::new();
        store.insert("Library", entry(|h| if h == 10 { 200.0 } else { 50.0 }));
        store.insert("Canteen", entry(|h| if h == 20 { 0.0 } else { 100.0 }));

        let result = query(&store, 3).unwrap();
        assert_eq!(result.results[0].scaled_emission, 25.0);
        assert_eq!(result.results[1].scaled_emission, 50.0);
    }

    #[test]
    fn test_flat_store_scores_zero() {
        let mut store = ForecastStore::new();
        store.insert("Clinic", entry(|_| 7.5));
        store.insert("Library", entry(|_| 7.5));
        let result = query(&store, 12).unwrap();
        assert!(result.results.iter().all(|r| r.scaled_emission == 0.0));
    }

    #[test]
    fn test_first_match_in_timestamp_order_wins() {
        // 30 hours: hours 0..5 appear twice; the earlier day is used.
        let points = (0..30)
            .map(|h| (start() + Duration::hours(h), h as f64))
            .collect();
        let mut store = ForecastStore::new();
        store.insert("Library", ForecastEntry::new(points));
        let result = query(&store, 2).unwrap();
        assert_eq!(result.results[0].total_emission, 2.0);
    }

    #[test]
    fn test_building_without_hour_is_omitted() {
        let mut store = ForecastStore::new();
        store.insert("Library", entry(|_| 1.0));
        store.insert(
            "Canteen",
            ForecastEntry::new(vec![(start() + Duration::hours(1), 2.0)]),
        );
        let result = query(&store, 5).unwrap();
        assert_eq!(result.results.len(), 1);
        assert_eq!(result.results[0].building_id, "Library");
    }

    #[test]
    fn test_values_are_rounded() {
        let mut store = ForecastStore::new();
        store.insert("A", entry(|h| if h == 0 { 1.0 / 3.0 } else { 1.0 }));
        store.insert("B", entry(|_| 0.0));
        let result = query(&store, 0).unwrap();
        assert_eq!(result.results[0].total_emission, 0.33);
        assert_eq!(result.results[0].scaled_emission, 33.33);
    }

    #[test]
    fn test_serialized_shape() {
        let mut store = ForecastStore::new();
        store.insert("A", entry(|_| 1.0));
        let json = serde_json::to_value(query(&store, 0).unwrap()).unwrap();
        assert_eq!(json["hour"], 0);
        assert_eq!(json["results"][0]["building_id"], "A");
        assert!(json["results"][0]["total_emission"].is_number());
        assert!(json["results"][0]["scaled_emission"].is_number());
    }
}

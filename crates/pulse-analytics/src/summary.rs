//! Descriptive statistics over a forecast store, fed to insight generation.

use chrono::Timelike;
use pulse_core::{round2, Error, Result};
use pulse_forecast::ForecastStore;
use serde::{Deserialize, Serialize};

/// Number of buildings listed in `top_buildings`.
pub const TOP_BUILDINGS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingTotal {
    pub name: String,
    pub total: f64,
}

/// Store-wide summary. All emission figures are kg CO2e rounded to 2 decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightSummary {
    pub total_emissions: f64,
    /// Mean over every (building, hour) value.
    pub average_emission: f64,
    /// Hour of day with the highest emissions summed across buildings.
    pub peak_hour: u32,
    pub peak_emission: f64,
    pub top_buildings: Vec<BuildingTotal>,
    pub building_count: usize,
}

/// Summarize a store. Ties for the peak go to the lowest hour; ties among
/// the top buildings keep store order.
pub fn summarize(store: &ForecastStore) -> Result<InsightSummary> {
    let mut hourly: [Option<f64>; 24] = [None; 24];
    let mut building_totals: Vec<(&str, f64)> = Vec::with_capacity(store.len());
    let mut total = 0.0;
    let mut count = 0usize;

    for (building, entry) in store.iter() {
        let mut building_total = 0.0;
        for (ts, value) in entry.points() {
            let slot = &mut hourly[ts.hour() as usize];
            *slot = Some(slot.unwrap_or(0.0) + value);
            building_total += value;
            total += value;
            count += 1;
        }
        building_totals.push((building, building_total));
    }

    let (peak_hour, peak_emission) = hourly
        .iter()
        .enumerate()
        .filter_map(|(hour, sum)| sum.map(|s| (hour as u32, s)))
        .fold(None, |best: Option<(u32, f64)>, (hour, sum)| match best {
            Some((_, best_sum)) if best_sum >= sum => best,
            _ => Some((hour, sum)),
        })
        .ok_or_else(|| Error::NotFound("No forecast data available".into()))?;

    // Stable sort keeps store order among equal totals.
    building_totals.sort_by(|a, b| b.1.total_cmp(&a.1));

    Ok(InsightSummary {
        total_emissions: round2(total),
        average_emission: round2(total / count as f64),
        peak_hour,
        peak_emission: round2(peak_emission),
        top_buildings: building_totals
            .iter()
            .take(TOP_BUILDINGS)
            .map(|(name, total)| BuildingTotal {
                name: name.to_string(),
                total: round2(*total),
            })
            .collect(),
        building_count: store.len(),
    })
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
    fn test_totals_and_average() {
        let mut store = ForecastStore::new();
        store.insert("Library", entry(|_| 2.0));
        store.insert("Canteen", entry(|_| 1.0));

        let summary = summarize(&store).unwrap();
        assert_eq!(summary.total_emissions, 72.0);
        assert_eq!(summary.average_emission, 1.5);
        assert_eq!(summary.building_count, 2);
    }

    #[test]
    fn test_peak_hour_sums_across_buildings() {
        let mut store = ForecastStore::new();
        store.insert("Library", entry(|h| if h == 9 { 10.0 } else { 1.0 }));
        store.insert("Canteen", entry(|h| if h == 13 { 8.0 } else { 1.0 }));

        let summary = summarize(&store).unwrap();
        assert_eq!(summary.peak_hour, 9);
        assert_eq!(summary.peak_emission, 11.0);
    }

    #[test]
    fn test_peak_tie_goes_to_lowest_hour() {
        let mut store = ForecastStore::new();
        store.insert("Library", entry(|h| if h == 4 || h == 17 { 5.0 } else { 1.0 }));
        assert_eq!(summarize(&store).unwrap().peak_hour, 4);
    }

    #[test]
    fn test_top_three_descending_with_store_order_ties() {
        let mut store = ForecastStore::new();
        store.insert("Clinic", entry(|_| 1.0));
        store.insert("Boys_Mess", entry(|_| 3.0));
        store.insert("Girls_Mess", entry(|_| 3.0));
        store.insert("Library", entry(|_| 5.0));

        let names: Vec<String> = summarize(&store)
            .unwrap()
            .top_buildings
            .into_iter()
            .map(|b| b.name)
            .collect();
        assert_eq!(names, vec!["Library", "Boys_Mess", "Girls_Mess"]);
    }

    #[test]
    fn test_fewer_than_three_buildings() {
        let mut store = ForecastStore::new();
        store.insert("Library", entry(|_| 1.0));
        let summary = summarize(&store).unwrap();
        assert_eq!(summary.top_buildings.len(), 1);
        assert_eq!(summary.top_buildings[0].total, 24.0);
    }

    #[test]
    fn test_empty_store_is_not_found() {
        assert!(matches!(
            summarize(&ForecastStore::new()),
            Err(Error::NotFound(_))
        ));
    }
}

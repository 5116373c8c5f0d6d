//! Daily campus-wide aggregates over the historical CSV.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Duration, NaiveDate, Timelike};
use pulse_core::{round2, Error, Result};
use pulse_forecast::EmissionRow;
use serde::Serialize;

pub const MAX_DAYS: i64 = 365;

/// One day of the aggregate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyEmission {
    /// Short label such as `Mar 14`.
    pub date: String,
    /// Mean of the day's hourly campus totals.
    pub carbon: f64,
    /// Distinct buildings reporting that day.
    pub buildings: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoricalData {
    pub days: i64,
    pub data: Vec<DailyEmission>,
}

/// Reject day counts outside 1–365.
pub fn validate_days(days: i64) -> Result<()> {
    if (1..=MAX_DAYS).contains(&days) {
        Ok(())
    } else {
        Err(Error::InvalidArgument(format!(
            "Days must be between 1 and {}",
            MAX_DAYS
        )))
    }
}

#[derive(Default)]
struct DayAccumulator<'a> {
    hourly: BTreeMap<u32, f64>,
    buildings: BTreeSet<&'a str>,
}

/// Aggregate the last `days` days (1–365) ending at the newest row.
///
/// Readings are summed per hour across buildings, then the hourly sums are
/// averaged per calendar day. Days come back oldest first.
pub fn daily_aggregate(rows: &[EmissionRow], days: i64) -> Result<HistoricalData> {
    validate_days(days)?;

    let Some(latest) = rows.iter().map(|r| r.timestamp).max() else {
        return Ok(HistoricalData {
            days,
            data: Vec::new(),
        });
    };
    let cutoff = latest - Duration::days(days - 1);

    let mut per_day: BTreeMap<NaiveDate, DayAccumulator> = BTreeMap::new();
    for row in rows.iter().filter(|r| r.timestamp >= cutoff) {
        let day = per_day.entry(row.timestamp.date()).or_default();
        *day.hourly.entry(row.timestamp.hour()).or_insert(0.0) += row.value;
        day.buildings.insert(row.building_id.as_str());
    }

    let data = per_day
        .into_iter()
        .map(|(date, day)| {
            let mean = day.hourly.values().sum::<f64>() / day.hourly.len() as f64;
            DailyEmission {
                date: date.format("%b %d").to_string(),
                carbon: round2(mean),
                buildings: day.buildings.len(),
            }
        })
        .collect();

    Ok(HistoricalData { days, data })
}

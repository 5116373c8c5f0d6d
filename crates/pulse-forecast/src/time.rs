//! Alignment boundary computation in a fixed time zone.
//!
//! The boundary is the latest top-of-hour at or before "now" in the configured
//! offset. Everything at or before it is history; the forecast starts at it.

use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, NaiveTime, Timelike, Utc};
use pulse_core::{Error, Result, FORECAST_HORIZON, SEQ_LEN, TIMESTAMP_FORMAT};

/// Accepted timestamp layouts, tried in order.
const TIMESTAMP_FORMATS: &[&str] = &[
    TIMESTAMP_FORMAT,
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Computes hour boundaries in a fixed offset.
#[derive(Debug, Clone, Copy)]
pub struct TimeAligner {
    offset: FixedOffset,
}

impl TimeAligner {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Latest hour boundary at or before `now`, as local wall-clock time.
    pub fn boundary_at(&self, now: DateTime<Utc>) -> NaiveDateTime {
        truncate_to_hour(now.with_timezone(&self.offset).naive_local())
    }

    /// Boundary for the current wall-clock time.
    pub fn current_boundary(&self) -> NaiveDateTime {
        self.boundary_at(Utc::now())
    }

    /// First hour of the historical input window ending at `boundary`.
    pub fn window_start(boundary: NaiveDateTime) -> NaiveDateTime {
        boundary - Duration::hours(SEQ_LEN as i64)
    }

    /// The 24 hourly timestamps a forecast starting at `boundary` covers.
    pub fn forecast_timestamps(boundary: NaiveDateTime) -> Vec<NaiveDateTime> {
        (0..FORECAST_HORIZON)
            .map(|h| boundary + Duration::hours(h as i64))
            .collect()
    }
}

/// Drop minutes, seconds and sub-seconds.
pub fn truncate_to_hour(ts: NaiveDateTime) -> NaiveDateTime {
    ts.date().and_time(NaiveTime::MIN) + Duration::hours(i64::from(ts.hour()))
}

/// Parse a store or CSV timestamp.
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime> {
    let trimmed = raw.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .ok_or_else(|| Error::InvalidArgument(format!("unrecognized timestamp \"{}\"", raw)))
}

/// Format a timestamp the way the forecast store keys it.
pub fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

//! Carbon Pulse Analytics — read-side computations over forecasts and history.
//!
//! - `emissions`: per-hour lookup with store-wide heat scores
//! - `summary`: totals, peak hour and top emitters for insight prompts
//! - `historical`: daily campus aggregates from the CSV export

pub mod emissions;
pub mod historical;
pub mod summary;

pub use emissions::{query, BuildingEmission, QueryResult};
pub use historical::{daily_aggregate, validate_days, DailyEmission, HistoricalData};
pub use summary::{summarize, BuildingTotal, InsightSummary};

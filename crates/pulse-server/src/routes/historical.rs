//! Historical daily aggregates.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use pulse_analytics::{daily_aggregate, validate_days, HistoricalData};
use pulse_forecast::read_emission_rows;

use super::parse_int_segment;
use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/get-historical-data/{days}", get(get_historical_data))
}

/// GET /get-historical-data/{days} — daily mean of hourly campus totals.
async fn get_historical_data(
    State(state): State<Arc<AppState>>,
    Path(days): Path<String>,
) -> Result<Json<HistoricalData>, AppError> {
    let days = parse_int_segment(&days, "Days")?;
    validate_days(days)?;

    let csv = state.config.data_paths.history_csv.clone();
    let data = tokio::task::spawn_blocking(move || {
        let rows = read_emission_rows(&csv)?;
        daily_aggregate(&rows, days)
    })
    .await
    .map_err(|e| AppError::internal(format!("Historical aggregation panicked: {}", e)))??;

    Ok(Json(data))
}

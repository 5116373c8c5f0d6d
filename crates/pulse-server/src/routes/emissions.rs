//! Hourly emissions lookup.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use pulse_analytics::QueryResult;
use tracing::warn;

use super::parse_int_segment;
use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/get-emissions/{target_hour}", get(get_emissions))
}

/// GET /get-emissions/{target_hour} — per-building forecast for an hour of day.
///
/// A successful query also refreshes the campus map file.
async fn get_emissions(
    State(state): State<Arc<AppState>>,
    Path(target_hour): Path<String>,
) -> Result<Json<QueryResult>, AppError> {
    let target_hour = parse_int_segment(&target_hour, "Hour")?;
    let store = state.forecasts();
    let result = pulse_analytics::query(&store, target_hour)?;

    let annotated = result.clone();
    let outcome = tokio::task::spawn_blocking(move || state.map.update(&annotated)).await;
    match outcome {
        Ok(Ok(_)) => {}
        Ok(Err(e)) => warn!("Failed to annotate map file: {}", e),
        Err(e) => warn!("Map annotation task failed: {}", e),
    }

    Ok(Json(result))
}

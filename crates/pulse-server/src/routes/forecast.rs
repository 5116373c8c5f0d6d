//! Forecast refresh trigger.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use pulse_forecast::time::format_timestamp;
use pulse_forecast::{ForecastOrchestrator, SkippedBuilding};
use serde::Serialize;
use tokio::sync::OwnedMutexGuard;
use tracing::info;

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/refresh-forecast", post(refresh_forecast))
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub success: bool,
    pub buildings: usize,
    pub boundary: String,
    pub skipped: Vec<SkippedBuilding>,
}

/// POST /refresh-forecast — rerun the forecast and swap the served store.
///
/// The run owns the refresh slot and finishes (persist, then swap) even if
/// the client goes away.
async fn refresh_forecast(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RefreshResponse>, AppError> {
    let guard = state
        .try_begin_refresh()
        .ok_or_else(|| AppError::conflict("A forecast refresh is already running"))?;

    let response = tokio::task::spawn_blocking(move || run_refresh(&state, guard))
        .await
        .map_err(|e| AppError::internal(format!("Forecast run panicked: {}", e)))??;

    Ok(Json(response))
}

/// Run, persist and serve a new forecast. The slot is released last.
fn run_refresh(
    state: &AppState,
    _guard: OwnedMutexGuard<()>,
) -> pulse_core::Result<RefreshResponse> {
    let run = ForecastOrchestrator::new(&state.config).run()?;

    let response = RefreshResponse {
        success: true,
        buildings: run.produced(),
        boundary: format_timestamp(run.boundary),
        skipped: run.skipped,
    };
    state.replace_forecasts(run.store);
    info!("Forecast snapshot replaced ({} buildings)", response.buildings);

    Ok(response)
}

//! AI-generated emission insights.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use pulse_insights::InsightsResponse;

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/get-insights", get(get_insights))
}

/// GET /get-insights — summary of the current forecast plus generated insights.
async fn get_insights(
    State(state): State<Arc<AppState>>,
) -> Result<Json<InsightsResponse>, AppError> {
    let store = state.forecasts();
    let insights = state.insights.generate(&store).await?;
    Ok(Json(InsightsResponse {
        success: true,
        insights,
    }))
}

use axum::{extract::State, routing::post, Json, Router};
use tracing::debug;
use voyage_core::search::{Train, TrainSearchRequest};

use crate::error::{ApiResponse, AppError};
use crate::extract::ApiJson;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/search", post(search_trains))
}

async fn search_trains(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<TrainSearchRequest>,
) -> Result<Json<ApiResponse<Vec<Train>>>, AppError> {
    let query = req.validate()?;
    let trains = state.trains.search(&query).await?;
    debug!("Train search {} -> {} on {}: {} result(s)", query.from, query.to, query.date, trains.len());
    Ok(ApiResponse::ok(trains))
}

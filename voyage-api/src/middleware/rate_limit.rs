use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};

use crate::error::AppError;
use crate::state::AppState;

const WINDOW_SECONDS: i64 = 60;

/// Fixed one-minute window per client IP. Store failures let the request through.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let key = format!("ip:{}", ip);
    let limit = state.business_rules.rate_limit_per_minute;

    match state.sessions.check_rate_limit(&key, limit, WINDOW_SECONDS).await {
        Ok(true) => Ok(next.run(req).await),
        Ok(false) => {
            tracing::warn!("Rate limit exceeded for {}", ip);
            Err(AppError::RateLimited)
        }
        Err(e) => {
            tracing::warn!("Rate limiter unavailable, failing open: {}", e);
            Ok(next.run(req).await)
        }
    }
}

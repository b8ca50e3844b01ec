use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use voyage_core::CoreError;

use crate::error::AppError;
use crate::state::AppState;

/// Verifies the bearer token, rejects revoked ones and injects the `Claims` into request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AppError::MissingToken)?;

    let claims = state.tokens.verify(token)?;

    if state.sessions.is_revoked(&claims.jti).await? {
        return Err(CoreError::Unauthorized(format!("token {} has been revoked", claims.jti)).into());
    }

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

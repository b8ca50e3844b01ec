use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use voyage_core::identity::{
    hash_password, normalize_email, validate_password, verify_password, Claims, NewUser, User,
};
use voyage_core::CoreError;

use crate::error::{ApiResponse, AppError};
use crate::extract::ApiJson;
use crate::middleware::auth_middleware;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

pub fn routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/me", get(me))
        .route("/logout", post(logout))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .merge(protected)
}

fn required(value: &str, field: &str) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(CoreError::ValidationError(format!("{} is required", field)).into());
    }
    Ok(value.to_string())
}

async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let email = normalize_email(&req.email)?;
    validate_password(&req.password)?;
    let first_name = required(&req.first_name, "firstName")?;
    let last_name = required(&req.last_name, "lastName")?;

    let user = state
        .users
        .create_user(NewUser {
            email,
            password_hash: hash_password(&req.password)?,
            first_name,
            last_name,
            phone: req.phone.map(|p| p.trim().to_string()).filter(|p| !p.is_empty()),
        })
        .await?;

    let issued = state.tokens.issue(&user)?;
    info!("Registered user {}", user.id);

    Ok((
        StatusCode::CREATED,
        ApiResponse::ok(AuthResponse {
            user,
            token: issued.token,
            expires_at: issued.expires_at,
        }),
    ))
}

async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, AppError> {
    let invalid = || AppError::from(CoreError::Unauthorized("invalid email or password".to_string()));

    // Any malformed email is simply an unknown account here
    let email = normalize_email(&req.email).map_err(|_| invalid())?;
    let mut user = state.users.find_by_email(&email).await?.ok_or_else(invalid)?;

    if !verify_password(&req.password, &user.password_hash) {
        info!("Failed login for user {}", user.id);
        return Err(invalid());
    }

    state.users.touch_last_login(user.id).await?;
    user.last_login_at = Some(Utc::now());

    let issued = state.tokens.issue(&user)?;
    Ok(ApiResponse::ok(AuthResponse {
        user,
        token: issued.token,
        expires_at: issued.expires_at,
    }))
}

async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ApiResponse<User>>, AppError> {
    let user = state
        .users
        .find_by_id(claims.user_id()?)
        .await?
        .ok_or_else(|| CoreError::Unauthorized("account no longer exists".to_string()))?;

    Ok(ApiResponse::ok(user))
}

#[derive(Debug, Serialize)]
struct LogoutResponse {
    message: &'static str,
}

async fn logout(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ApiResponse<LogoutResponse>>, AppError> {
    state
        .sessions
        .revoke_token(&claims.jti, claims.remaining_seconds(Utc::now()))
        .await?;
    info!("User {} logged out", claims.sub);

    Ok(ApiResponse::ok(LogoutResponse {
        message: "Logged out",
    }))
}

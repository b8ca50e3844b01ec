use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;
use voyage_core::identity::Claims;
use voyage_core::payment::ChargeRequest;
use voyage_core::CoreError;
use voyage_order::{Booking, BookingDetails};

use crate::error::{ApiResponse, AppError};
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::auth_middleware;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct CancelRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelResponse {
    pub booking: Booking,
    pub refund_amount: i64,
}

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", post(create_booking).get(list_bookings))
        .route("/{id}", get(get_booking))
        .route("/{id}/cancel", put(cancel_booking))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Splits `{type, bookingData, paymentToken?}` into the booking details and the optional token.
fn parse_create_body(mut body: Value) -> Result<(BookingDetails, Option<String>), AppError> {
    let payment_token = match body.as_object_mut() {
        Some(map) => map
            .remove("paymentToken")
            .and_then(|v| v.as_str().map(str::to_string)),
        None => {
            return Err(CoreError::ValidationError("request body must be a JSON object".to_string()).into())
        }
    };

    let details = serde_json::from_value::<BookingDetails>(body)
        .map_err(|e| CoreError::ValidationError(format!("invalid booking: {}", e)))?;

    Ok((details, payment_token))
}

/// Loads a booking the requester owns: 404 when absent, 403 when someone else's.
async fn owned_booking(state: &AppState, id: Uuid, requester: Uuid) -> Result<Booking, AppError> {
    let booking = state
        .bookings
        .get_booking(id)
        .await?
        .ok_or_else(|| CoreError::NotFound(format!("Booking {} not found", id)))?;

    if !booking.is_owned_by(requester) {
        return Err(CoreError::Forbidden("booking belongs to another user".to_string()).into());
    }
    Ok(booking)
}

async fn create_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(body): ApiJson<Value>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let (details, payment_token) = parse_create_body(body)?;

    let mut booking = state
        .booking_manager
        .create(user_id, details, Utc::now())
        .map_err(CoreError::from)?;

    // Without a payment token the booking is held as pay-later
    if let Some(token) = payment_token {
        let receipt = state
            .payments
            .charge(&ChargeRequest {
                reference_id: booking.id,
                customer_id: user_id,
                amount_cents: booking.price.total_cents,
                currency: booking.price.currency.clone(),
                payment_token: token,
                description: booking.details.describe(),
            })
            .await?;
        booking.payment_reference = Some(receipt.payment_reference);
    }

    if let Err(err) = state.bookings.insert_booking(&booking).await {
        state
            .refund_unsaved_charge(booking.payment_reference.as_deref(), booking.price.total_cents)
            .await;
        return Err(err.into());
    }
    info!("Booking {} ({}) created for user {}", booking.reference, booking.id, user_id);

    Ok((StatusCode::CREATED, ApiResponse::ok(booking)))
}

async fn list_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ApiResponse<Vec<Booking>>>, AppError> {
    let bookings = state.bookings.list_bookings(claims.user_id()?).await?;
    Ok(ApiResponse::ok(bookings))
}

async fn get_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<Booking>>, AppError> {
    let booking = owned_booking(&state, id, claims.user_id()?).await?;
    Ok(ApiResponse::ok(booking))
}

async fn cancel_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<Uuid>,
    body: Bytes,
) -> Result<Json<ApiResponse<CancelResponse>>, AppError> {
    // The body is optional; an empty one means no reason given
    let request: CancelRequest = if body.iter().all(u8::is_ascii_whitespace) {
        CancelRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| CoreError::ValidationError(format!("invalid cancel request: {}", e)))?
    };

    let requester = claims.user_id()?;
    let mut booking = owned_booking(&state, id, requester).await?;

    let refund_amount = state
        .booking_manager
        .cancel(&mut booking, requester, request.reason, Utc::now())
        .map_err(CoreError::from)?;

    // Only the request that wins the stored transition issues the refund
    state.bookings.record_cancellation(&booking).await?;
    state
        .payments
        .refund(booking.payment_reference.as_deref(), refund_amount)
        .await?;

    info!("Booking {} cancelled, refund {}", booking.id, refund_amount);

    Ok(ApiResponse::ok(CancelResponse {
        booking,
        refund_amount,
    }))
}

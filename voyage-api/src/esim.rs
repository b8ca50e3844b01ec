use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use voyage_catalog::{EsimPlan, PlanFilter};
use voyage_core::identity::Claims;
use voyage_core::payment::ChargeRequest;
use voyage_core::CoreError;
use voyage_order::EsimOrder;

use crate::error::{ApiResponse, AppError};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::auth_middleware;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRequest {
    pub plan_id: String,
    pub payment_token: String,
}

pub fn routes(state: AppState) -> Router<AppState> {
    let catalog = Router::new()
        .route("/plans", get(list_plans))
        .route("/plans/{id}", get(get_plan));

    let orders = Router::new()
        .route("/", get(list_orders))
        .route("/purchase", post(purchase))
        .route("/{id}", get(get_order))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    catalog.merge(orders)
}

async fn list_plans(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<PlanFilter>,
) -> Result<Json<ApiResponse<Vec<EsimPlan>>>, AppError> {
    let plans = state.esims.list_plans(&filter).await?;
    Ok(ApiResponse::ok(plans))
}

async fn get_plan(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<ApiResponse<EsimPlan>>, AppError> {
    let plan = state
        .esims
        .get_plan(&id)
        .await?
        .ok_or_else(|| CoreError::NotFound(format!("eSIM plan {} not found", id)))?;
    Ok(ApiResponse::ok(plan))
}

async fn purchase(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<PurchaseRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let plan = state
        .esims
        .get_plan(req.plan_id.trim())
        .await?
        .ok_or_else(|| CoreError::NotFound(format!("eSIM plan {} not found", req.plan_id)))?;

    let receipt = state
        .payments
        .charge(&ChargeRequest {
            reference_id: Uuid::new_v4(),
            customer_id: user_id,
            amount_cents: plan.price_cents,
            currency: plan.currency.clone(),
            payment_token: req.payment_token,
            description: format!("eSIM {}", plan.name),
        })
        .await?;

    let order = state
        .provisioner
        .provision(user_id, &plan, Some(receipt.payment_reference.clone()), Utc::now());
    if let Err(err) = state.esims.insert_order(&order).await {
        state
            .refund_unsaved_charge(Some(&receipt.payment_reference), plan.price_cents)
            .await;
        return Err(err.into());
    }

    info!("eSIM order {} ({}) provisioned for user {}", order.id, plan.id, user_id);

    Ok((StatusCode::CREATED, ApiResponse::ok(order)))
}

fn with_current_status(mut order: EsimOrder) -> EsimOrder {
    order.status = order.effective_status(Utc::now());
    order
}

async fn list_orders(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ApiResponse<Vec<EsimOrder>>>, AppError> {
    let orders = state.esims.list_orders(claims.user_id()?).await?;
    Ok(ApiResponse::ok(orders.into_iter().map(with_current_status).collect()))
}

async fn get_order(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<EsimOrder>>, AppError> {
    let order = state
        .esims
        .get_order(id)
        .await?
        .ok_or_else(|| CoreError::NotFound(format!("eSIM order {} not found", id)))?;

    if !order.is_owned_by(claims.user_id()?) {
        return Err(CoreError::Forbidden("eSIM order belongs to another user".to_string()).into());
    }

    Ok(ApiResponse::ok(with_current_status(order)))
}

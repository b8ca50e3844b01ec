use async_trait::async_trait;
use uuid::Uuid;
use sqlx::PgPool;
use chrono::{DateTime, Utc};
use voyage_catalog::{EsimPlan, PlanFilter};
use voyage_core::CoreResult;
use voyage_order::{EsimOrder, EsimStatus};

use crate::database::storage_error;
use crate::repository::EsimRepository;

pub struct StoreEsimRepository {
    pool: PgPool,
}

impl StoreEsimRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct PlanRow {
    id: String,
    name: String,
    region: String,
    countries: Vec<String>,
    data_mb: i64,
    validity_days: i32,
    price_cents: i64,
    currency: String,
    is_active: bool,
}

impl From<PlanRow> for EsimPlan {
    fn from(row: PlanRow) -> Self {
        EsimPlan {
            id: row.id,
            name: row.name,
            region: row.region,
            countries: row.countries,
            data_mb: row.data_mb,
            validity_days: row.validity_days,
            price_cents: row.price_cents,
            currency: row.currency,
            is_active: row.is_active,
        }
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    user_id: Uuid,
    plan_id: String,
    plan_name: String,
    status: String,
    iccid: String,
    activation_code: String,
    qr_code: String,
    data_mb: i64,
    price_cents: i64,
    currency: String,
    payment_reference: Option<String>,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for EsimOrder {
    type Error = voyage_core::CoreError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        Ok(EsimOrder {
            id: row.id,
            user_id: row.user_id,
            plan_id: row.plan_id,
            plan_name: row.plan_name,
            status: row.status.parse::<EsimStatus>()?,
            iccid: row.iccid,
            activation_code: row.activation_code,
            qr_code: row.qr_code,
            data_mb: row.data_mb,
            price_cents: row.price_cents,
            currency: row.currency,
            payment_reference: row.payment_reference,
            expires_at: row.expires_at,
            created_at: row.created_at,
        })
    }
}

const PLAN_COLUMNS: &str =
    "id, name, region, countries, data_mb, validity_days, price_cents, currency, is_active";
const ORDER_COLUMNS: &str = "id, user_id, plan_id, plan_name, status, iccid, activation_code, qr_code, \
     data_mb, price_cents, currency, payment_reference, expires_at, created_at";

#[async_trait]
impl EsimRepository for StoreEsimRepository {
    async fn list_plans(&self, filter: &PlanFilter) -> CoreResult<Vec<EsimPlan>> {
        let rows: Vec<PlanRow> = sqlx::query_as(&format!(
            "SELECT {} FROM esim_plans WHERE is_active ORDER BY price_cents, id",
            PLAN_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        // The catalog is small; filtering in process keeps the matching rules in one place.
        Ok(rows
            .into_iter()
            .map(EsimPlan::from)
            .filter(|plan| filter.matches(plan))
            .collect())
    }

    async fn get_plan(&self, id: &str) -> CoreResult<Option<EsimPlan>> {
        let row: Option<PlanRow> = sqlx::query_as(&format!(
            "SELECT {} FROM esim_plans WHERE id = $1 AND is_active",
            PLAN_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(row.map(EsimPlan::from))
    }

    async fn insert_order(&self, order: &EsimOrder) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO esim_orders (id, user_id, plan_id, plan_name, status, iccid, activation_code, qr_code,
                                     data_mb, price_cents, currency, payment_reference, expires_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(order.id)
        .bind(order.user_id)
        .bind(&order.plan_id)
        .bind(&order.plan_name)
        .bind(order.status.to_string())
        .bind(&order.iccid)
        .bind(&order.activation_code)
        .bind(&order.qr_code)
        .bind(order.data_mb)
        .bind(order.price_cents)
        .bind(&order.currency)
        .bind(&order.payment_reference)
        .bind(order.expires_at)
        .bind(order.created_at)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(())
    }

    async fn get_order(&self, id: Uuid) -> CoreResult<Option<EsimOrder>> {
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            "SELECT {} FROM esim_orders WHERE id = $1",
            ORDER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        row.map(EsimOrder::try_from).transpose()
    }

    async fn list_orders(&self, user_id: Uuid) -> CoreResult<Vec<EsimOrder>> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {} FROM esim_orders WHERE user_id = $1 ORDER BY created_at DESC",
            ORDER_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        rows.into_iter().map(EsimOrder::try_from).collect()
    }
}

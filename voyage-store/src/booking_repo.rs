use async_trait::async_trait;
use uuid::Uuid;
use sqlx::types::Json;
use sqlx::PgPool;
use chrono::{DateTime, Utc};
use voyage_catalog::PriceBreakdown;
use voyage_core::{CoreError, CoreResult};
use voyage_order::{Booking, BookingDetails, BookingStatus};

use crate::database::storage_error;
use crate::repository::BookingRepository;

pub struct StoreBookingRepository {
    pool: PgPool,
}

impl StoreBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    reference: String,
    user_id: Uuid,
    details: Json<BookingDetails>,
    status: String,
    price: Json<PriceBreakdown>,
    payment_reference: Option<String>,
    refund_cents: Option<i64>,
    cancellation_reason: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    cancelled_at: Option<DateTime<Utc>>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = CoreError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        Ok(Booking {
            id: row.id,
            reference: row.reference,
            user_id: row.user_id,
            details: row.details.0,
            status: row.status.parse::<BookingStatus>()?,
            price: row.price.0,
            payment_reference: row.payment_reference,
            refund_cents: row.refund_cents,
            cancellation_reason: row.cancellation_reason,
            created_at: row.created_at,
            updated_at: row.updated_at,
            cancelled_at: row.cancelled_at,
        })
    }
}

const BOOKING_COLUMNS: &str = "id, reference, user_id, details, status, price, payment_reference, \
     refund_cents, cancellation_reason, created_at, updated_at, cancelled_at";

#[async_trait]
impl BookingRepository for StoreBookingRepository {
    async fn insert_booking(&self, booking: &Booking) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO bookings (id, reference, user_id, booking_type, details, status, price, payment_reference, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(booking.id)
        .bind(&booking.reference)
        .bind(booking.user_id)
        .bind(booking.details.booking_type().as_str())
        .bind(Json(&booking.details))
        .bind(booking.status.to_string())
        .bind(Json(&booking.price))
        .bind(&booking.payment_reference)
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(())
    }

    async fn get_booking(&self, id: Uuid) -> CoreResult<Option<Booking>> {
        let row: Option<BookingRow> = sqlx::query_as(&format!(
            "SELECT {} FROM bookings WHERE id = $1",
            BOOKING_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        row.map(Booking::try_from).transpose()
    }

    async fn list_bookings(&self, user_id: Uuid) -> CoreResult<Vec<Booking>> {
        let rows: Vec<BookingRow> = sqlx::query_as(&format!(
            "SELECT {} FROM bookings WHERE user_id = $1 ORDER BY created_at DESC",
            BOOKING_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        rows.into_iter().map(Booking::try_from).collect()
    }

    async fn record_cancellation(&self, booking: &Booking) -> CoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET status = $1, refund_cents = $2, cancellation_reason = $3, cancelled_at = $4, updated_at = $5
            WHERE id = $6 AND status = $7
            "#,
        )
        .bind(booking.status.to_string())
        .bind(booking.refund_cents)
        .bind(&booking.cancellation_reason)
        .bind(booking.cancelled_at)
        .bind(booking.updated_at)
        .bind(booking.id)
        .bind(BookingStatus::Confirmed.to_string())
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        if result.rows_affected() == 0 {
            return Err(CoreError::Conflict(format!(
                "Booking {} is no longer confirmed",
                booking.id
            )));
        }
        Ok(())
    }
}

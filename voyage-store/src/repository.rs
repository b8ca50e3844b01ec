use async_trait::async_trait;
use uuid::Uuid;
use voyage_catalog::{EsimPlan, PlanFilter};
use voyage_core::identity::{NewUser, User};
use voyage_core::search::{Train, TrainSearchQuery};
use voyage_core::CoreResult;
use voyage_order::{Booking, EsimOrder};

/// Repository trait for user accounts
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `Conflict` when the email is already registered
    async fn create_user(&self, user: NewUser) -> CoreResult<User>;

    async fn find_by_email(&self, email: &str) -> CoreResult<Option<User>>;

    async fn find_by_id(&self, id: Uuid) -> CoreResult<Option<User>>;

    async fn touch_last_login(&self, id: Uuid) -> CoreResult<()>;
}

/// Repository trait for hotel and flight bookings
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn insert_booking(&self, booking: &Booking) -> CoreResult<()>;

    async fn get_booking(&self, id: Uuid) -> CoreResult<Option<Booking>>;

    /// Newest first
    async fn list_bookings(&self, user_id: Uuid) -> CoreResult<Vec<Booking>>;

    /// Stores a cancellation, but only over a booking that is still `CONFIRMED`.
    /// Fails with `Conflict` when another request cancelled it first.
    async fn record_cancellation(&self, booking: &Booking) -> CoreResult<()>;
}

/// Repository trait for the eSIM catalog and purchased eSIMs
#[async_trait]
pub trait EsimRepository: Send + Sync {
    async fn list_plans(&self, filter: &PlanFilter) -> CoreResult<Vec<EsimPlan>>;

    /// Inactive plans are reported as absent
    async fn get_plan(&self, id: &str) -> CoreResult<Option<EsimPlan>>;

    async fn insert_order(&self, order: &EsimOrder) -> CoreResult<()>;

    async fn get_order(&self, id: Uuid) -> CoreResult<Option<EsimOrder>>;

    /// Newest first
    async fn list_orders(&self, user_id: Uuid) -> CoreResult<Vec<EsimOrder>>;
}

/// Repository trait for train schedules
#[async_trait]
pub trait TrainRepository: Send + Sync {
    async fn search(&self, query: &TrainSearchQuery) -> CoreResult<Vec<Train>>;
}

/// Short-lived session state: revoked tokens and rate-limit counters
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn revoke_token(&self, jti: &str, ttl_seconds: u64) -> CoreResult<()>;

    async fn is_revoked(&self, jti: &str) -> CoreResult<bool>;

    /// Counts a hit against `key`; true while the window's count is within `limit`
    async fn check_rate_limit(&self, key: &str, limit: i64, window_seconds: i64) -> CoreResult<bool>;
}

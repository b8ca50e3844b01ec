//! Process-local stores, used when no database or redis URL is configured and in tests.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;
use voyage_catalog::esim::default_plans;
use voyage_catalog::{EsimPlan, PlanFilter};
use voyage_core::identity::{NewUser, User};
use voyage_core::{CoreError, CoreResult};
use voyage_order::{Booking, BookingStatus, EsimOrder};

use crate::repository::{BookingRepository, EsimRepository, SessionStore, UserRepository};

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create_user(&self, user: NewUser) -> CoreResult<User> {
        let mut users = self.users.write().await;
        if users
            .values()
            .any(|u| u.email.expose().eq_ignore_ascii_case(&user.email))
        {
            return Err(CoreError::Conflict("email already registered".to_string()));
        }

        let user = user.into_user();
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> CoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| u.email.expose().eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> CoreResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn touch_last_login(&self, id: Uuid) -> CoreResult<()> {
        if let Some(user) = self.users.write().await.get_mut(&id) {
            user.last_login_at = Some(Utc::now());
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryBookingRepository {
    bookings: RwLock<HashMap<Uuid, Booking>>,
}

impl InMemoryBookingRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookingRepository for InMemoryBookingRepository {
    async fn insert_booking(&self, booking: &Booking) -> CoreResult<()> {
        let mut bookings = self.bookings.write().await;
        if bookings.contains_key(&booking.id) {
            return Err(CoreError::Conflict(format!("booking {} already exists", booking.id)));
        }
        bookings.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn get_booking(&self, id: Uuid) -> CoreResult<Option<Booking>> {
        Ok(self.bookings.read().await.get(&id).cloned())
    }

    async fn list_bookings(&self, user_id: Uuid) -> CoreResult<Vec<Booking>> {
        let bookings = self.bookings.read().await;
        let mut owned: Vec<Booking> = bookings
            .values()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }

    async fn record_cancellation(&self, booking: &Booking) -> CoreResult<()> {
        let mut bookings = self.bookings.write().await;
        match bookings.get_mut(&booking.id) {
            Some(existing) if existing.status == BookingStatus::Confirmed => {
                *existing = booking.clone();
                Ok(())
            }
            Some(_) => Err(CoreError::Conflict(format!(
                "Booking {} is no longer confirmed",
                booking.id
            ))),
            None => Err(CoreError::NotFound(format!("booking {}", booking.id))),
        }
    }
}

pub struct InMemoryEsimRepository {
    plans: Vec<EsimPlan>,
    orders: RwLock<HashMap<Uuid, EsimOrder>>,
}

impl InMemoryEsimRepository {
    pub fn new(plans: Vec<EsimPlan>) -> Self {
        Self {
            plans,
            orders: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryEsimRepository {
    fn default() -> Self {
        Self::new(default_plans())
    }
}

#[async_trait]
impl EsimRepository for InMemoryEsimRepository {
    async fn list_plans(&self, filter: &PlanFilter) -> CoreResult<Vec<EsimPlan>> {
        let mut plans: Vec<EsimPlan> = self
            .plans
            .iter()
            .filter(|p| p.is_active && filter.matches(p))
            .cloned()
            .collect();
        plans.sort_by(|a, b| a.price_cents.cmp(&b.price_cents).then_with(|| a.id.cmp(&b.id)));
        Ok(plans)
    }

    async fn get_plan(&self, id: &str) -> CoreResult<Option<EsimPlan>> {
        Ok(self.plans.iter().find(|p| p.id == id && p.is_active).cloned())
    }

    async fn insert_order(&self, order: &EsimOrder) -> CoreResult<()> {
        self.orders.write().await.insert(order.id, order.clone());
        Ok(())
    }

    async fn get_order(&self, id: Uuid) -> CoreResult<Option<EsimOrder>> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn list_orders(&self, user_id: Uuid) -> CoreResult<Vec<EsimOrder>> {
        let orders = self.orders.read().await;
        let mut owned: Vec<EsimOrder> = orders
            .values()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }
}

/// Fixed-window counter
struct Window {
    started: Instant,
    count: i64,
}

#[derive(Default)]
pub struct InMemorySessionStore {
    revoked: RwLock<HashMap<String, Instant>>,
    windows: RwLock<HashMap<String, Window>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn revoke_token(&self, jti: &str, ttl_seconds: u64) -> CoreResult<()> {
        let mut revoked = self.revoked.write().await;
        let now = Instant::now();
        revoked.retain(|_, expires| *expires > now);
        revoked.insert(jti.to_string(), now + Duration::from_secs(ttl_seconds.max(1)));
        Ok(())
    }

    async fn is_revoked(&self, jti: &str) -> CoreResult<bool> {
        let revoked = self.revoked.read().await;
        Ok(revoked
            .get(jti)
            .is_some_and(|expires| *expires > Instant::now()))
    }

    async fn check_rate_limit(&self, key: &str, limit: i64, window_seconds: i64) -> CoreResult<bool> {
        Ok(self.count_hit(key, limit, window_seconds, Instant::now()).await)
    }
}

impl InMemorySessionStore {
    async fn count_hit(&self, key: &str, limit: i64, window_seconds: i64, now: Instant) -> bool {
        let window_len = Duration::from_secs(window_seconds.max(1) as u64);

        let mut windows = self.windows.write().await;
        windows.retain(|_, w| now.duration_since(w.started) < window_len);
        let window = windows.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });
        if now.duration_since(window.started) >= window_len {
            window.started = now;
            window.count = 0;
        }
        window.count += 1;

        window.count <= limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, NaiveDate};
    use voyage_catalog::{PricingEngine, PricingRules};
    use voyage_order::{BookingDetails, BookingManager, EsimProvisioner, HotelDetails, RefundPolicy};

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            password_hash: "hash".to_string(),
            first_name: "Asha".to_string(),
            last_name: "Rao".to_string(),
            phone: None,
        }
    }

    fn hotel() -> BookingDetails {
        BookingDetails::Hotel(HotelDetails {
            hotel_id: None,
            hotel_name: "Harbour View".to_string(),
            city: "Lisbon".to_string(),
            check_in: NaiveDate::from_ymd_opt(2030, 6, 1).unwrap(),
            check_out: NaiveDate::from_ymd_opt(2030, 6, 3).unwrap(),
            rooms: 1,
            guests: 2,
            nightly_rate_cents: 12_000,
            currency: "EUR".to_string(),
        })
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts_case_insensitively() {
        let repo = InMemoryUserRepository::new();
        let user = repo.create_user(new_user("asha@example.com")).await.unwrap();

        let dup = repo.create_user(new_user("ASHA@example.com")).await;
        assert!(matches!(dup, Err(CoreError::Conflict(_))));

        let found = repo.find_by_email("asha@example.com").await.unwrap().unwrap();
        assert_eq!(found.id, user.id);

        repo.touch_last_login(user.id).await.unwrap();
        let found = repo.find_by_id(user.id).await.unwrap().unwrap();
        assert!(found.last_login_at.is_some());
    }

    #[tokio::test]
    async fn test_bookings_listed_newest_first_per_user() {
        let repo = InMemoryBookingRepository::new();
        let manager = BookingManager::new(PricingEngine::new(PricingRules::default()), RefundPolicy::default());
        let owner = Uuid::new_v4();
        let now = Utc::now();

        let older = manager.create(owner, hotel(), now - ChronoDuration::hours(2)).unwrap();
        let newer = manager.create(owner, hotel(), now).unwrap();
        let other = manager.create(Uuid::new_v4(), hotel(), now).unwrap();
        for b in [&older, &newer, &other] {
            repo.insert_booking(b).await.unwrap();
        }

        let listed = repo.list_bookings(owner).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, newer.id);
        assert_eq!(listed[1].id, older.id);
    }

    #[tokio::test]
    async fn test_cancellation_of_missing_booking_is_not_found() {
        let repo = InMemoryBookingRepository::new();
        let manager = BookingManager::new(PricingEngine::new(PricingRules::default()), RefundPolicy::default());
        let booking = manager.create(Uuid::new_v4(), hotel(), Utc::now()).unwrap();

        assert!(matches!(
            repo.record_cancellation(&booking).await,
            Err(CoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_only_one_cancellation_wins_from_the_same_snapshot() {
        let repo = InMemoryBookingRepository::new();
        let manager = BookingManager::new(PricingEngine::new(PricingRules::default()), RefundPolicy::default());
        let owner = Uuid::new_v4();
        let now = Utc::now();
        let booking = manager.create(owner, hotel(), now).unwrap();
        repo.insert_booking(&booking).await.unwrap();

        // Two requests read the same confirmed booking before either writes
        let mut first = repo.get_booking(booking.id).await.unwrap().unwrap();
        let mut second = first.clone();
        manager.cancel(&mut first, owner, Some("first".to_string()), now).unwrap();
        manager.cancel(&mut second, owner, Some("second".to_string()), now).unwrap();

        repo.record_cancellation(&first).await.unwrap();
        assert!(matches!(
            repo.record_cancellation(&second).await,
            Err(CoreError::Conflict(_))
        ));

        let stored = repo.get_booking(booking.id).await.unwrap().unwrap();
        assert_eq!(stored.status, BookingStatus::Cancelled);
        assert_eq!(stored.cancellation_reason.as_deref(), Some("first"));
    }

    #[tokio::test]
    async fn test_inactive_plans_are_hidden() {
        let mut plans = default_plans();
        plans[0].is_active = false;
        let hidden_id = plans[0].id.clone();
        let repo = InMemoryEsimRepository::new(plans);

        assert!(repo.get_plan(&hidden_id).await.unwrap().is_none());
        let listed = repo.list_plans(&PlanFilter::default()).await.unwrap();
        assert!(listed.iter().all(|p| p.id != hidden_id));
        assert!(listed.windows(2).all(|w| w[0].price_cents <= w[1].price_cents));
    }

    #[tokio::test]
    async fn test_orders_round_trip() {
        let repo = InMemoryEsimRepository::default();
        let plan = repo.get_plan("eu-3gb-7d").await.unwrap().unwrap();
        let user = Uuid::new_v4();
        let order = EsimProvisioner::new("smdp.test").provision(user, &plan, None, Utc::now());

        repo.insert_order(&order).await.unwrap();
        assert_eq!(repo.get_order(order.id).await.unwrap().unwrap().iccid, order.iccid);
        assert_eq!(repo.list_orders(user).await.unwrap().len(), 1);
        assert!(repo.list_orders(Uuid::new_v4()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_revocation() {
        let store = InMemorySessionStore::new();
        assert!(!store.is_revoked("jti-1").await.unwrap());
        store.revoke_token("jti-1", 60).await.unwrap();
        assert!(store.is_revoked("jti-1").await.unwrap());
        assert!(!store.is_revoked("jti-2").await.unwrap());
    }

    #[tokio::test]
    async fn test_rate_limit_window() {
        let store = InMemorySessionStore::new();
        for _ in 0..3 {
            assert!(store.check_rate_limit("ip:1", 3, 60).await.unwrap());
        }
        assert!(!store.check_rate_limit("ip:1", 3, 60).await.unwrap());
        assert!(store.check_rate_limit("ip:2", 3, 60).await.unwrap());
    }

    #[tokio::test]
    async fn test_lapsed_windows_are_dropped() {
        let store = InMemorySessionStore::new();
        let start = Instant::now();

        for i in 0..50 {
            assert!(store.count_hit(&format!("ip:{}", i), 3, 60, start).await);
        }
        assert!(!store.count_hit("ip:0", 0, 60, start).await);
        assert_eq!(store.windows.read().await.len(), 50);

        // A minute later every old window has lapsed; only the new hit is tracked
        let later = start + Duration::from_secs(61);
        assert!(store.count_hit("ip:0", 3, 60, later).await);
        let windows = store.windows.read().await;
        assert_eq!(windows.len(), 1);
        assert_eq!(windows["ip:0"].count, 1);
    }
}

use crate::finance::RefundPolicy;
use crate::models::{Booking, BookingDetails, BookingStatus};
use chrono::{DateTime, Utc};
use rand::Rng;
use uuid::Uuid;
use voyage_catalog::PricingEngine;
use voyage_core::CoreError;

const REFERENCE_PREFIX: &str = "VY";
const REFERENCE_CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const REFERENCE_LEN: usize = 6;

/// Manages booking creation and the Confirmed → Cancelled transition
pub struct BookingManager {
    pricing: PricingEngine,
    refund_policy: RefundPolicy,
}

impl BookingManager {
    pub fn new(pricing: PricingEngine, refund_policy: RefundPolicy) -> Self {
        Self {
            pricing,
            refund_policy,
        }
    }

    pub fn refund_policy(&self) -> &RefundPolicy {
        &self.refund_policy
    }

    /// Validate and price a new booking. Nothing is persisted or charged here.
    pub fn create(
        &self,
        user_id: Uuid,
        details: BookingDetails,
        now: DateTime<Utc>,
    ) -> Result<Booking, BookingError> {
        details
            .validate()
            .map_err(|e| BookingError::InvalidDetails(e.to_string()))?;

        if details.service_start() <= now {
            return Err(BookingError::InvalidDetails(
                "service date must be in the future".to_string(),
            ));
        }

        let price = details
            .quote(&self.pricing)
            .map_err(|e| BookingError::InvalidDetails(e.to_string()))?;

        Ok(Booking {
            id: Uuid::new_v4(),
            reference: generate_reference(),
            user_id,
            details,
            status: BookingStatus::Confirmed,
            price,
            payment_reference: None,
            refund_cents: None,
            cancellation_reason: None,
            created_at: now,
            updated_at: now,
            cancelled_at: None,
        })
    }

    /// Cancel a booking on behalf of `requester`, returning the refund owed.
    /// A booking that was never charged is owed nothing.
    pub fn cancel(
        &self,
        booking: &mut Booking,
        requester: Uuid,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<i64, BookingError> {
        if !booking.is_owned_by(requester) {
            return Err(BookingError::NotOwner(booking.id.to_string()));
        }

        if booking.status == BookingStatus::Cancelled {
            return Err(BookingError::AlreadyCancelled(booking.id.to_string()));
        }

        let service_start = booking.details.service_start();
        if service_start <= now {
            return Err(BookingError::ServiceStarted(booking.id.to_string()));
        }

        let refund = match booking.payment_reference {
            Some(_) => self.refund_policy.refund_for(&booking.price, service_start, now),
            None => 0,
        };

        booking.status = BookingStatus::Cancelled;
        booking.refund_cents = Some(refund);
        booking.cancellation_reason = reason.filter(|r| !r.trim().is_empty());
        booking.cancelled_at = Some(now);
        booking.updated_at = now;

        Ok(refund)
    }
}

/// Short human-facing booking reference, e.g. VY7KQ2MX
fn generate_reference() -> String {
    let mut rng = rand::thread_rng();
    let code: String = (0..REFERENCE_LEN)
        .map(|_| REFERENCE_CHARSET[rng.gen_range(0..REFERENCE_CHARSET.len())] as char)
        .collect();
    format!("{}{}", REFERENCE_PREFIX, code)
}

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("Invalid booking: {0}")]
    InvalidDetails(String),

    #[error("Booking {0} belongs to another user")]
    NotOwner(String),

    #[error("Booking {0} is already cancelled")]
    AlreadyCancelled(String),

    #[error("Booking {0} has already started and cannot be cancelled")]
    ServiceStarted(String),
}

impl From<BookingError> for CoreError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::InvalidDetails(msg) => CoreError::ValidationError(msg),
            BookingError::NotOwner(_) => CoreError::Forbidden(err.to_string()),
            BookingError::AlreadyCancelled(_) | BookingError::ServiceStarted(_) => {
                CoreError::Conflict(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FlightDetails;
    use chrono::Duration;
    use voyage_catalog::PricingRules;

    fn manager() -> BookingManager {
        BookingManager::new(PricingEngine::new(PricingRules::default()), RefundPolicy::default())
    }

    fn flight(departure_at: DateTime<Utc>) -> BookingDetails {
        BookingDetails::Flight(FlightDetails {
            airline: "Oceanic".to_string(),
            flight_number: "OA815".to_string(),
            origin: "SYD".to_string(),
            destination: "LAX".to_string(),
            departure_at,
            return_at: None,
            passengers: 1,
            cabin_class: "ECONOMY".to_string(),
            fare_cents: 50_000,
            currency: "USD".to_string(),
        })
    }

    #[test]
    fn test_booking_lifecycle() {
        let manager = manager();
        let user = Uuid::new_v4();
        let now = Utc::now();

        let mut booking = manager.create(user, flight(now + Duration::days(30)), now).unwrap();
        assert_eq!(booking.status, BookingStatus::Confirmed);
        booking.payment_reference = Some("ch_test".to_string());
        assert!(booking.reference.starts_with("VY"));
        assert_eq!(booking.reference.len(), 8);
        assert_eq!(booking.price.total_cents, 50_000 + 6_000 + 499);

        let refund = manager.cancel(&mut booking, user, Some("change of plans".to_string()), now).unwrap();
        assert_eq!(refund, 56_000);
        assert_eq!(booking.status, BookingStatus::Cancelled);
        assert_eq!(booking.refund_cents, Some(56_000));
        assert!(booking.cancelled_at.is_some());
    }

    #[test]
    fn test_unpaid_booking_cancels_without_refund() {
        let manager = manager();
        let user = Uuid::new_v4();
        let now = Utc::now();

        let mut booking = manager.create(user, flight(now + Duration::days(30)), now).unwrap();
        assert!(booking.payment_reference.is_none());

        let refund = manager.cancel(&mut booking, user, None, now).unwrap();
        assert_eq!(refund, 0);
        assert_eq!(booking.refund_cents, Some(0));
        assert_eq!(booking.status, BookingStatus::Cancelled);
    }

    #[test]
    fn test_invalid_transitions() {
        let manager = manager();
        let user = Uuid::new_v4();
        let now = Utc::now();
        let mut booking = manager.create(user, flight(now + Duration::days(2)), now).unwrap();

        // Only the owner may cancel
        let err = manager.cancel(&mut booking, Uuid::new_v4(), None, now).unwrap_err();
        assert!(matches!(err, BookingError::NotOwner(_)));

        manager.cancel(&mut booking, user, None, now).unwrap();
        let err = manager.cancel(&mut booking, user, None, now).unwrap_err();
        assert!(matches!(err, BookingError::AlreadyCancelled(_)));
    }

    #[test]
    fn test_cannot_book_or_cancel_past_services() {
        let manager = manager();
        let user = Uuid::new_v4();
        let now = Utc::now();

        let err = manager.create(user, flight(now - Duration::hours(1)), now).unwrap_err();
        assert!(matches!(err, BookingError::InvalidDetails(_)));

        let mut booking = manager.create(user, flight(now + Duration::hours(3)), now).unwrap();
        let later = now + Duration::hours(4);
        let err = manager.cancel(&mut booking, user, None, later).unwrap_err();
        assert!(matches!(err, BookingError::ServiceStarted(_)));
        assert!(matches!(CoreError::from(err), CoreError::Conflict(_)));
    }
}

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use voyage_catalog::PriceBreakdown;

/// Cancellation refund tiers, measured in hours before the service starts.
/// The service fee is never refunded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundPolicy {
    pub full_refund_hours: i64,
    pub partial_refund_hours: i64,
    pub partial_refund_percent: u8,
}

impl Default for RefundPolicy {
    fn default() -> Self {
        Self {
            full_refund_hours: 72,
            partial_refund_hours: 24,
            partial_refund_percent: 50,
        }
    }
}

impl RefundPolicy {
    /// Refund owed when cancelling at `now` a service starting at `service_start`
    pub fn refund_for(
        &self,
        price: &PriceBreakdown,
        service_start: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> i64 {
        let hours_left = (service_start - now).num_hours();
        let refundable = price.refundable_cents();

        if hours_left >= self.full_refund_hours {
            refundable
        } else if hours_left >= self.partial_refund_hours {
            let percent = i128::from(self.partial_refund_percent.min(100));
            // Never more than `refundable`, so the narrowing cannot truncate
            (i128::from(refundable) * percent / 100) as i64
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn price() -> PriceBreakdown {
        PriceBreakdown {
            base_cents: 40_000,
            taxes_cents: 4_800,
            fees_cents: 499,
            total_cents: 45_299,
            currency: "USD".to_string(),
        }
    }

    #[test]
    fn test_refund_tiers() {
        let policy = RefundPolicy::default();
        let now = Utc::now();

        assert_eq!(policy.refund_for(&price(), now + Duration::days(10), now), 44_800);
        assert_eq!(policy.refund_for(&price(), now + Duration::hours(72), now), 44_800);
        assert_eq!(policy.refund_for(&price(), now + Duration::hours(48), now), 22_400);
        assert_eq!(policy.refund_for(&price(), now + Duration::hours(5), now), 0);
    }

    #[test]
    fn test_percent_is_capped() {
        let policy = RefundPolicy {
            full_refund_hours: 100,
            partial_refund_hours: 0,
            partial_refund_percent: 250,
        };
        let now = Utc::now();
        assert_eq!(policy.refund_for(&price(), now + Duration::hours(1), now), 44_800);
    }

    #[test]
    fn test_partial_refund_of_large_amounts() {
        let policy = RefundPolicy::default();
        let now = Utc::now();
        let price = PriceBreakdown {
            base_cents: i64::MAX / 2,
            taxes_cents: 0,
            fees_cents: 0,
            total_cents: i64::MAX / 2,
            currency: "USD".to_string(),
        };

        assert_eq!(
            policy.refund_for(&price, now + Duration::hours(48), now),
            i64::MAX / 4
        );
    }
}

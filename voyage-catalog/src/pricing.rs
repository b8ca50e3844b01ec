use serde::{Deserialize, Serialize};
use voyage_core::{CoreError, CoreResult};

/// Tax and fee configuration applied to every booking quote
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingRules {
    /// Fractional tax rate, e.g. 0.12 for 12%
    pub tax_rate: f64,

    /// Flat, non-refundable service fee per booking (in cents)
    pub service_fee_cents: i64,
}

impl Default for PricingRules {
    fn default() -> Self {
        Self {
            tax_rate: 0.12,
            service_fee_cents: 499,
        }
    }
}

/// Itemised price of a booking. All amounts are in minor units.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PriceBreakdown {
    pub base_cents: i64,
    pub taxes_cents: i64,
    pub fees_cents: i64,
    pub total_cents: i64,
    pub currency: String,
}

impl PriceBreakdown {
    /// Portion of the price that the refund policy may return.
    pub fn refundable_cents(&self) -> i64 {
        self.base_cents.saturating_add(self.taxes_cents)
    }
}

pub struct PricingEngine {
    rules: PricingRules,
}

impl PricingEngine {
    pub fn new(rules: PricingRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &PricingRules {
        &self.rules
    }

    /// nights × rooms × nightly rate
    pub fn quote_stay(
        &self,
        nights: i64,
        rooms: u32,
        nightly_rate_cents: i64,
        currency: &str,
    ) -> CoreResult<PriceBreakdown> {
        if nights <= 0 {
            return Err(CoreError::ValidationError("stay must be at least one night".to_string()));
        }
        let base = nights
            .checked_mul(rooms as i64)
            .and_then(|units| units.checked_mul(nightly_rate_cents))
            .ok_or_else(|| CoreError::ValidationError("stay price is out of range".to_string()))?;
        self.breakdown(base, currency)
    }

    /// passengers × fare
    pub fn quote_fare(&self, passengers: u32, fare_cents: i64, currency: &str) -> CoreResult<PriceBreakdown> {
        let base = (passengers as i64)
            .checked_mul(fare_cents)
            .ok_or_else(|| CoreError::ValidationError("fare is out of range".to_string()))?;
        self.breakdown(base, currency)
    }

    fn breakdown(&self, base_cents: i64, currency: &str) -> CoreResult<PriceBreakdown> {
        if base_cents <= 0 {
            return Err(CoreError::ValidationError("price must be positive".to_string()));
        }
        let out_of_range = || CoreError::ValidationError("price is out of range".to_string());

        let taxes_cents = self.taxes_for(base_cents).ok_or_else(out_of_range)?;
        let fees_cents = self.rules.service_fee_cents;
        let total_cents = base_cents
            .checked_add(taxes_cents)
            .and_then(|sum| sum.checked_add(fees_cents))
            .ok_or_else(out_of_range)?;

        Ok(PriceBreakdown {
            base_cents,
            taxes_cents,
            fees_cents,
            total_cents,
            currency: currency.to_string(),
        })
    }

    /// Taxes in whole cents, rounded half-up. None on overflow.
    fn taxes_for(&self, base_cents: i64) -> Option<i64> {
        let basis_points = (self.rules.tax_rate * 10_000.0).round() as i64;
        base_cents
            .checked_mul(basis_points)?
            .checked_add(5_000)
            .map(|scaled| scaled / 10_000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stay_quote() {
        let engine = PricingEngine::new(PricingRules::default());

        // 3 nights, 2 rooms at $120.00
        let quote = engine.quote_stay(3, 2, 12_000, "USD").unwrap();
        assert_eq!(quote.base_cents, 72_000);
        assert_eq!(quote.taxes_cents, 8_640);
        assert_eq!(quote.fees_cents, 499);
        assert_eq!(quote.total_cents, 81_139);
        assert_eq!(quote.refundable_cents(), 80_640);
    }

    #[test]
    fn test_tax_rounds_half_up() {
        let engine = PricingEngine::new(PricingRules { tax_rate: 0.05, service_fee_cents: 0 });

        // 5% of 1010 = 50.5 -> 51
        let quote = engine.quote_fare(1, 1_010, "EUR").unwrap();
        assert_eq!(quote.taxes_cents, 51);
        assert_eq!(quote.total_cents, 1_061);
    }

    #[test]
    fn test_rejects_empty_stay() {
        let engine = PricingEngine::new(PricingRules::default());
        assert!(engine.quote_stay(0, 1, 10_000, "USD").is_err());
        assert!(engine.quote_fare(2, 0, "USD").is_err());
    }

    #[test]
    fn test_huge_rates_are_rejected_not_wrapped() {
        let engine = PricingEngine::new(PricingRules::default());

        // Fits in i64 as a base price, but not once taxes are applied
        let err = engine.quote_stay(1, 1, 9_000_000_000_000_000, "USD").unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));

        let err = engine.quote_fare(9, i64::MAX / 8, "USD").unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));

        let engine = PricingEngine::new(PricingRules { tax_rate: 0.0, service_fee_cents: 499 });
        assert!(engine.quote_fare(1, i64::MAX - 100, "USD").is_err());
    }
}

use voyage_core::payment::{ChargeRequest, PaymentAdapter, PaymentReceipt, PaymentStatus, RefundReceipt};
use voyage_core::{CoreError, CoreResult};
use std::sync::Arc;

/// Token the mock adapter always declines
pub const DECLINED_TEST_TOKEN: &str = "tok_declined";
/// Token the mock adapter fails on, simulating a gateway outage
pub const GATEWAY_ERROR_TEST_TOKEN: &str = "tok_gateway_error";

pub struct PaymentOrchestrator {
    adapter: Arc<dyn PaymentAdapter>,
}

impl PaymentOrchestrator {
    pub fn new(adapter: Arc<dyn PaymentAdapter>) -> Self {
        Self { adapter }
    }

    /// Charge and insist on a settled payment
    pub async fn charge(&self, request: &ChargeRequest) -> CoreResult<PaymentReceipt> {
        if request.payment_token.trim().is_empty() {
            return Err(CoreError::ValidationError("paymentToken is required".to_string()));
        }

        let receipt = self.adapter.charge(request).await.map_err(|e| {
            tracing::error!("Payment gateway failure for {}: {}", request.reference_id, e);
            CoreError::InternalError(format!("Payment gateway failure: {}", e))
        })?;

        match receipt.status {
            PaymentStatus::Succeeded => Ok(receipt),
            PaymentStatus::Declined => Err(CoreError::PaymentDeclined(format!(
                "Charge {} was declined",
                receipt.payment_reference
            ))),
            // Bookings are only confirmed against settled funds
            PaymentStatus::Processing => Err(CoreError::PaymentDeclined(format!(
                "Charge {} is still processing",
                receipt.payment_reference
            ))),
        }
    }

    /// Refund a charge. Zero amounts and unpaid bookings are a no-op.
    pub async fn refund(
        &self,
        payment_reference: Option<&str>,
        amount_cents: i64,
    ) -> CoreResult<Option<RefundReceipt>> {
        let Some(reference) = payment_reference else {
            return Ok(None);
        };
        if amount_cents <= 0 {
            return Ok(None);
        }

        self.adapter
            .refund(reference, amount_cents)
            .await
            .map(Some)
            .map_err(|e| {
                tracing::error!("Refund of {} on {} failed: {}", amount_cents, reference, e);
                CoreError::InternalError(format!("Refund failed: {}", e))
            })
    }
}

/// In-process payment adapter for development and tests
pub struct MockPaymentAdapter;

#[async_trait::async_trait]
impl PaymentAdapter for MockPaymentAdapter {
    async fn charge(
        &self,
        request: &ChargeRequest,
    ) -> Result<PaymentReceipt, Box<dyn std::error::Error + Send + Sync>> {
        if request.payment_token == GATEWAY_ERROR_TEST_TOKEN {
            return Err("Simulated payment gateway failure".into());
        }

        let status = if request.payment_token == DECLINED_TEST_TOKEN {
            PaymentStatus::Declined
        } else {
            PaymentStatus::Succeeded
        };

        Ok(PaymentReceipt {
            payment_reference: format!("ch_{}", uuid::Uuid::new_v4().simple()),
            status,
            amount_cents: request.amount_cents,
            currency: request.currency.clone(),
            processed_at: chrono::Utc::now(),
        })
    }

    async fn refund(
        &self,
        payment_reference: &str,
        amount_cents: i64,
    ) -> Result<RefundReceipt, Box<dyn std::error::Error + Send + Sync>> {
        Ok(RefundReceipt {
            refund_reference: format!("re_{}", uuid::Uuid::new_v4().simple()),
            payment_reference: payment_reference.to_string(),
            amount_cents,
            processed_at: chrono::Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn charge_request(token: &str) -> ChargeRequest {
        ChargeRequest {
            reference_id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            amount_cents: 1_999,
            currency: "USD".to_string(),
            payment_token: token.to_string(),
            description: "Europe Traveller eSIM".to_string(),
        }
    }

    #[tokio::test]
    async fn test_successful_charge() {
        let orchestrator = PaymentOrchestrator::new(Arc::new(MockPaymentAdapter));
        let receipt = orchestrator.charge(&charge_request("tok_visa")).await.unwrap();
        assert_eq!(receipt.status, PaymentStatus::Succeeded);
        assert!(receipt.payment_reference.starts_with("ch_"));
    }

    #[tokio::test]
    async fn test_declined_and_failed_charges() {
        let orchestrator = PaymentOrchestrator::new(Arc::new(MockPaymentAdapter));

        let err = orchestrator.charge(&charge_request(DECLINED_TEST_TOKEN)).await.unwrap_err();
        assert!(matches!(err, CoreError::PaymentDeclined(_)));

        let err = orchestrator.charge(&charge_request(GATEWAY_ERROR_TEST_TOKEN)).await.unwrap_err();
        assert!(matches!(err, CoreError::InternalError(_)));

        let err = orchestrator.charge(&charge_request("  ")).await.unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_refund_skips_zero_amounts() {
        let orchestrator = PaymentOrchestrator::new(Arc::new(MockPaymentAdapter));
        assert!(orchestrator.refund(Some("ch_1"), 0).await.unwrap().is_none());
        assert!(orchestrator.refund(None, 500).await.unwrap().is_none());

        let receipt = orchestrator.refund(Some("ch_1"), 500).await.unwrap().unwrap();
        assert_eq!(receipt.amount_cents, 500);
        assert_eq!(receipt.payment_reference, "ch_1");
    }
}

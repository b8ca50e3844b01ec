use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Succeeded,
    Declined,
    Processing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeRequest {
    /// Booking or eSIM order being paid for
    pub reference_id: Uuid,
    pub customer_id: Uuid,
    pub amount_cents: i64,
    pub currency: String,
    pub payment_token: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub payment_reference: String, // Provider's ID (e.g., ch_123)
    pub status: PaymentStatus,
    pub amount_cents: i64,
    pub currency: String,
    pub processed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundReceipt {
    pub refund_reference: String,
    pub payment_reference: String,
    pub amount_cents: i64,
    pub processed_at: DateTime<Utc>,
}

#[async_trait]
pub trait PaymentAdapter: Send + Sync {
    /// Charge the customer's payment token
    async fn charge(
        &self,
        request: &ChargeRequest,
    ) -> Result<PaymentReceipt, Box<dyn std::error::Error + Send + Sync>>;

    /// Refund part or all of a previous charge
    async fn refund(
        &self,
        payment_reference: &str,
        amount_cents: i64,
    ) -> Result<RefundReceipt, Box<dyn std::error::Error + Send + Sync>>;
}

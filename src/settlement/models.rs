use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Transaction status enum representing the settlement lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Reservation taken, awaiting payment
    Pending,
    /// Payment verified, ledger commit outstanding
    Paid,
    /// Payment verified and ledger committed; terminal success
    Settled,
    /// Reservation released after a payment failure; terminal
    Failed,
    /// Operator-reversed after a commit could not land; terminal
    Reversed,
}

impl TransactionStatus {
    /// Convert status to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Paid => "paid",
            TransactionStatus::Settled => "settled",
            TransactionStatus::Failed => "failed",
            TransactionStatus::Reversed => "reversed",
        }
    }

    /// Parse status from string
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(TransactionStatus::Pending),
            "paid" => Ok(TransactionStatus::Paid),
            "settled" => Ok(TransactionStatus::Settled),
            "failed" => Ok(TransactionStatus::Failed),
            "reversed" => Ok(TransactionStatus::Reversed),
            _ => Err(format!("Invalid transaction status: {}", s)),
        }
    }
}

impl Default for TransactionStatus {
    fn default() -> Self {
        TransactionStatus::Pending
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The immutable unit of settlement: one reservation attempt and everything
/// that happened to it
///
/// All downstream side effects (ledger entries, the permanent capacity
/// decrement) are keyed to `id`, which is what makes replays of any step
/// safe.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: i32,
    pub unit_id: i32,
    pub reservation_id: Uuid,
    pub quantity: i32,
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub tax: Decimal,
    pub coins_redeemed: i64,
    pub final_amount: Decimal,
    pub provider_order_id: Option<String>,
    pub provider_payment_id: Option<String>,
    pub status: TransactionStatus,
    pub coins_earned: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request DTO for creating a settlement (reservation + pricing + intent)
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateSettlementRequest {
    pub unit_id: i32,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
    pub requester_id: i32,
    /// Coins the caller wants to redeem; clamped to the wallet balance
    /// unless strict redemption is enabled
    #[validate(range(min = 0, message = "Requested coins cannot be negative"))]
    #[serde(default)]
    pub coins_requested: i64,
    #[validate(length(min = 1, max = 128, message = "Idempotency key must be 1-128 characters"))]
    pub idempotency_key: String,
}

/// Response DTO for a settlement attempt
#[derive(Debug, Serialize, ToSchema)]
pub struct SettlementResponse {
    pub transaction_id: Uuid,
    pub status: TransactionStatus,
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub tax: Decimal,
    pub coins_redeemed: i64,
    pub final_amount: Decimal,
    pub coins_earned: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_order_id: Option<String>,
}

impl From<Transaction> for SettlementResponse {
    fn from(tx: Transaction) -> Self {
        Self {
            transaction_id: tx.id,
            status: tx.status,
            subtotal: tx.subtotal,
            shipping: tx.shipping,
            tax: tx.tax,
            coins_redeemed: tx.coins_redeemed,
            final_amount: tx.final_amount,
            coins_earned: tx.coins_earned,
            provider_order_id: tx.provider_order_id,
        }
    }
}

/// Request DTO for the inbound provider callback
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CallbackRequest {
    #[validate(length(min = 1, message = "provider_order_id is required"))]
    pub provider_order_id: String,
    #[validate(length(min = 1, message = "provider_payment_id is required"))]
    pub provider_payment_id: String,
    #[validate(length(min = 1, message = "signature is required"))]
    pub signature: String,
}

/// Response DTO for the callback endpoint
#[derive(Debug, Serialize, ToSchema)]
pub struct CallbackResponse {
    pub transaction_id: Uuid,
    pub status: TransactionStatus,
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Why a ledger entry changed a balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LedgerReason {
    /// Coins spent as a discount at settlement
    Redemption,
    /// Coins earned from a settled purchase (flat rate or percentage)
    Cashback,
    /// Coins won through the spin wheel
    Reward,
    /// Operator-driven compensation of an earlier entry
    Reversal,
}

impl LedgerReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerReason::Redemption => "redemption",
            LedgerReason::Cashback => "cashback",
            LedgerReason::Reward => "reward",
            LedgerReason::Reversal => "reversal",
        }
    }
}

impl std::fmt::Display for LedgerReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A user's coin wallet
///
/// `balance` is a projection of the ledger, kept consistent by writing both
/// in the same database transaction. `version` backs the optimistic
/// concurrency check; it only ever increases.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Wallet {
    pub user_id: i32,
    pub balance: i64,
    pub version: i32,
}

/// An immutable, signed record of one balance change
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub wallet_user_id: i32,
    pub delta: i64,
    pub reason: LedgerReason,
    pub related_transaction_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// A ledger entry about to be written
///
/// `(related_transaction_id, reason)` is unique in storage, which is what
/// makes replayed commits safe: an entry that already landed is skipped.
#[derive(Debug, Clone)]
pub struct NewLedgerEntry {
    pub delta: i64,
    pub reason: LedgerReason,
    pub related_transaction_id: Uuid,
}

/// Response DTO for the wallet read endpoint
#[derive(Debug, Serialize, ToSchema)]
pub struct WalletResponse {
    pub user_id: i32,
    pub balance: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_reason_display() {
        assert_eq!(LedgerReason::Redemption.to_string(), "redemption");
        assert_eq!(LedgerReason::Cashback.to_string(), "cashback");
        assert_eq!(LedgerReason::Reward.to_string(), "reward");
        assert_eq!(LedgerReason::Reversal.to_string(), "reversal");
    }
}

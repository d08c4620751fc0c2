use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::inventory::InventoryError;
use crate::wallet::WalletError;

/// Error types for settlement operations
#[derive(Debug, thiserror::Error)]
pub enum SettlementError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Transaction not found")]
    NotFound,

    #[error("Sellable unit {0} not found")]
    UnitNotFound(i32),

    #[error("Sellable unit {0} is inactive")]
    UnitInactive(i32),

    #[error("Capacity exceeded for unit {0}")]
    CapacityExceeded(i32),

    #[error("Insufficient coins: requested {requested}, available {available}")]
    InsufficientCoins { requested: i64, available: i64 },

    #[error("Payment intent creation failed: {0}")]
    PaymentCreateFailed(String),

    #[error("Callback verification failed")]
    VerificationFailed,

    #[error("Commit failed: {0}")]
    CommitFailed(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl From<sqlx::Error> for SettlementError {
    fn from(err: sqlx::Error) -> Self {
        SettlementError::DatabaseError(err.to_string())
    }
}

impl From<InventoryError> for SettlementError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::DatabaseError(msg) => SettlementError::DatabaseError(msg),
            InventoryError::UnitNotFound(id) => SettlementError::UnitNotFound(id),
            InventoryError::UnitInactive(id) => SettlementError::UnitInactive(id),
            InventoryError::CapacityExceeded(id) => SettlementError::CapacityExceeded(id),
        }
    }
}

impl From<WalletError> for SettlementError {
    fn from(err: WalletError) -> Self {
        match err {
            WalletError::DatabaseError(msg) => SettlementError::DatabaseError(msg),
            WalletError::NotFound(user_id) => {
                SettlementError::DatabaseError(format!("wallet missing for user {}", user_id))
            }
            WalletError::InsufficientCoins { delta, balance } => SettlementError::InsufficientCoins {
                requested: -delta,
                available: balance,
            },
            WalletError::Conflict(user_id) => SettlementError::CommitFailed(format!(
                "ledger write for user {} kept conflicting",
                user_id
            )),
        }
    }
}

impl IntoResponse for SettlementError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            SettlementError::DatabaseError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            SettlementError::NotFound => {
                (StatusCode::NOT_FOUND, "Transaction not found".to_string())
            }
            SettlementError::UnitNotFound(id) => (
                StatusCode::NOT_FOUND,
                format!("Sellable unit {} not found", id),
            ),
            SettlementError::UnitInactive(id) => (
                StatusCode::BAD_REQUEST,
                format!("Sellable unit {} is inactive", id),
            ),
            SettlementError::CapacityExceeded(id) => (
                StatusCode::CONFLICT,
                format!("Not enough capacity left on unit {}", id),
            ),
            SettlementError::InsufficientCoins {
                requested,
                available,
            } => (
                StatusCode::BAD_REQUEST,
                format!(
                    "Insufficient coins: requested {}, available {}",
                    requested, available
                ),
            ),
            SettlementError::PaymentCreateFailed(msg) => (
                StatusCode::BAD_GATEWAY,
                format!("Payment could not be initiated, retry with a fresh idempotency key: {}", msg),
            ),
            SettlementError::VerificationFailed => (
                StatusCode::BAD_REQUEST,
                "Callback verification failed".to_string(),
            ),
            SettlementError::CommitFailed(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            SettlementError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            SettlementError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

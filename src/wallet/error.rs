use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Error types for wallet and ledger operations
#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Wallet not found for user {0}")]
    NotFound(i32),

    #[error("Insufficient coins: attempted delta {delta} against balance {balance}")]
    InsufficientCoins { delta: i64, balance: i64 },

    #[error("Ledger write conflict for user {0} after retries")]
    Conflict(i32),
}

impl From<sqlx::Error> for WalletError {
    fn from(err: sqlx::Error) -> Self {
        WalletError::DatabaseError(err.to_string())
    }
}

impl IntoResponse for WalletError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            WalletError::DatabaseError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            WalletError::NotFound(user_id) => (
                StatusCode::NOT_FOUND,
                format!("Wallet not found for user {}", user_id),
            ),
            WalletError::InsufficientCoins { delta, balance } => (
                StatusCode::BAD_REQUEST,
                format!(
                    "Insufficient coins: attempted delta {} against balance {}",
                    delta, balance
                ),
            ),
            WalletError::Conflict(user_id) => (
                StatusCode::CONFLICT,
                format!("Ledger write conflict for user {}", user_id),
            ),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

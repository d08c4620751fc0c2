use crate::wallet::WalletError;

/// Error types for reward operations
#[derive(Debug, thiserror::Error)]
pub enum RewardError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Wheel configuration has no drawable outcome")]
    InvalidWheel,

    #[error("Wallet error: {0}")]
    Wallet(#[from] WalletError),
}

impl From<sqlx::Error> for RewardError {
    fn from(err: sqlx::Error) -> Self {
        RewardError::DatabaseError(err.to_string())
    }
}

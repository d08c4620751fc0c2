/// Error types for payment gateway operations
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("Payment intent creation failed: {0}")]
    CreateFailed(String),

    #[error("Payment gateway call timed out")]
    Timeout,

    #[error("Invalid amount for payment intent: {0}")]
    InvalidAmount(String),
}

impl From<reqwest::Error> for PaymentError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            PaymentError::Timeout
        } else {
            PaymentError::CreateFailed(err.to_string())
        }
    }
}

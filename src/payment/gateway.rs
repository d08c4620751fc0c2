// Payment provider client
//
// The gateway only talks to the provider and reports its answers; it never
// touches application state. The trait seam lets the orchestrator take any
// implementation, which is also how tests substitute a stub.

use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::config::GatewayConfig;
use crate::payment::error::PaymentError;
use crate::payment::models::{PaymentIntent, ProviderOrderRequest, ProviderOrderResponse};

/// External payment provider operations used by the orchestrator
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a payment intent/order at the provider for the given amount
    ///
    /// Never called for zero amounts; fully coin-funded settlements skip the
    /// gateway entirely.
    async fn create_intent(
        &self,
        amount: Decimal,
        currency: &str,
        transaction_id: Uuid,
    ) -> Result<PaymentIntent, PaymentError>;
}

/// REST client for the real provider (no SDK dependency)
pub struct HttpPaymentGateway {
    http: reqwest::Client,
    base_url: String,
    key_id: String,
    key_secret: String,
}

impl HttpPaymentGateway {
    /// Build a client from gateway configuration
    ///
    /// The underlying HTTP client carries the configured timeout, so a hung
    /// provider cannot stall a settlement past its bound.
    pub fn new(config: &GatewayConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("reqwest client construction cannot fail with static options");

        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            key_id: config.key_id.clone(),
            key_secret: config.key_secret.clone(),
        }
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn create_intent(
        &self,
        amount: Decimal,
        currency: &str,
        transaction_id: Uuid,
    ) -> Result<PaymentIntent, PaymentError> {
        // Providers want minor units (paise, cents)
        let amount_minor = (amount * Decimal::from(100))
            .round_dp(0)
            .to_i64()
            .ok_or_else(|| PaymentError::InvalidAmount(amount.to_string()))?;
        if amount_minor <= 0 {
            return Err(PaymentError::InvalidAmount(amount.to_string()));
        }

        let request = ProviderOrderRequest {
            amount: amount_minor,
            currency: currency.to_string(),
            receipt: transaction_id.to_string(),
        };

        tracing::debug!(
            "Creating payment intent for transaction {} ({} {})",
            transaction_id,
            amount,
            currency
        );

        let response = self
            .http
            .post(format!("{}/orders", self.base_url))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(
                "Provider rejected intent for transaction {}: {} {}",
                transaction_id,
                status,
                body
            );
            return Err(PaymentError::CreateFailed(format!(
                "provider returned {}: {}",
                status, body
            )));
        }

        let order: ProviderOrderResponse = response.json().await?;

        tracing::info!(
            "Created provider order {} for transaction {}",
            order.id,
            transaction_id
        );
        Ok(PaymentIntent {
            provider_order_id: order.id,
            client_secret: order.client_secret,
        })
    }
}

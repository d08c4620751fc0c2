use serde::{Deserialize, Serialize};

/// A payment intent created at the provider
///
/// `provider_order_id` is the key the asynchronous callback is matched on;
/// `client_secret` is handed to the client to drive the provider's
/// checkout flow.
#[derive(Debug, Clone)]
pub struct PaymentIntent {
    pub provider_order_id: String,
    pub client_secret: String,
}

/// Wire request for the provider's order-creation endpoint
#[derive(Debug, Serialize)]
pub struct ProviderOrderRequest {
    /// Amount in minor currency units (paise, cents)
    pub amount: i64,
    pub currency: String,
    /// Our transaction id, echoed back by the provider for reconciliation
    pub receipt: String,
}

/// Wire response from the provider's order-creation endpoint
#[derive(Debug, Deserialize)]
pub struct ProviderOrderResponse {
    pub id: String,
    #[serde(default)]
    pub client_secret: String,
}

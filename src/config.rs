// Settlement configuration loaded from environment variables

use rust_decimal::Decimal;
use std::time::Duration;

/// Tunable settlement parameters, read once at startup and shared via AppState
#[derive(Debug, Clone)]
pub struct SettlementConfig {
    /// Tax rate applied to the subtotal (e.g. 0.18 for 18%)
    pub tax_rate: Decimal,
    /// Flat shipping fee for product orders; event bookings ship nothing
    pub shipping_flat: Decimal,
    /// Fraction of the paid amount credited back as coins on product orders
    pub cashback_rate: Decimal,
    /// When true, requesting more coins than the wallet holds is rejected
    /// instead of clamped to the balance
    pub strict_redemption: bool,
    /// Whether a successful settlement triggers a spin-wheel draw
    pub wheel_enabled: bool,
    /// ISO currency code passed to the payment provider
    pub currency: String,
    pub gateway: GatewayConfig,
}

/// Payment provider connection settings
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub base_url: String,
    pub key_id: String,
    pub key_secret: String,
    /// Server-held secret used to verify inbound callback signatures
    pub webhook_secret: String,
    /// Upper bound on any single provider call
    pub timeout: Duration,
}

impl SettlementConfig {
    /// Read configuration from the environment
    ///
    /// Gateway credentials are required; pricing knobs fall back to defaults
    /// so a local instance starts without a full .env file.
    pub fn from_env() -> Self {
        let tax_rate = env_decimal("TAX_RATE", "0.18");
        let shipping_flat = env_decimal("SHIPPING_FLAT", "50");
        let cashback_rate = env_decimal("CASHBACK_RATE", "0.05");
        let strict_redemption = env_bool("STRICT_REDEMPTION", false);
        let wheel_enabled = env_bool("WHEEL_ENABLED", true);
        let currency = std::env::var("CURRENCY").unwrap_or_else(|_| "INR".to_string());

        let gateway = GatewayConfig {
            base_url: std::env::var("GATEWAY_BASE_URL")
                .expect("GATEWAY_BASE_URL must be set in environment"),
            key_id: std::env::var("GATEWAY_KEY_ID")
                .expect("GATEWAY_KEY_ID must be set in environment"),
            key_secret: std::env::var("GATEWAY_KEY_SECRET")
                .expect("GATEWAY_KEY_SECRET must be set in environment"),
            webhook_secret: std::env::var("GATEWAY_WEBHOOK_SECRET")
                .expect("GATEWAY_WEBHOOK_SECRET must be set in environment"),
            timeout: Duration::from_secs(
                std::env::var("GATEWAY_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(10),
            ),
        };

        Self {
            tax_rate,
            shipping_flat,
            cashback_rate,
            strict_redemption,
            wheel_enabled,
            currency,
            gateway,
        }
    }
}

fn env_decimal(key: &str, default: &str) -> Decimal {
    std::env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse::<Decimal>()
        .unwrap_or_else(|_| panic!("{} must be a decimal number", key))
}

fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_env_decimal_default() {
        assert_eq!(env_decimal("SETTLEMENT_TEST_MISSING_RATE", "0.18"), dec!(0.18));
    }

    #[test]
    fn test_env_bool_default() {
        assert!(!env_bool("SETTLEMENT_TEST_MISSING_FLAG", false));
        assert!(env_bool("SETTLEMENT_TEST_MISSING_FLAG", true));
    }
}

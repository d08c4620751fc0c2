// Callback signature verification
//
// The provider signs `provider_order_id|provider_payment_id` with a shared
// secret. Verification recomputes the HMAC and compares in constant time;
// any malformed input is a plain failure, never a panic.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Verify an inbound callback signature
///
/// Returns false for empty fields, non-hex signatures, or any mismatch.
pub fn verify_callback_signature(
    provider_order_id: &str,
    provider_payment_id: &str,
    signature: &str,
    secret: &str,
) -> bool {
    if provider_order_id.is_empty() || provider_payment_id.is_empty() || signature.is_empty() {
        return false;
    }

    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(provider_order_id.as_bytes());
    mac.update(b"|");
    mac.update(provider_payment_id.as_bytes());

    let signature_bytes = match hex::decode(signature) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };

    // verify_slice compares in constant time
    mac.verify_slice(&signature_bytes).is_ok()
}

/// Produce the hex signature for a callback payload
///
/// The server only ever verifies; this is the counterpart used by tests and
/// local tooling to forge valid provider callbacks.
pub fn sign_callback(provider_order_id: &str, provider_payment_id: &str, secret: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(provider_order_id.as_bytes());
    mac.update(b"|");
    mac.update(provider_payment_id.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test_webhook_secret";

    #[test]
    fn test_valid_signature_verifies() {
        let signature = sign_callback("order_1", "pay_1", SECRET);
        assert!(verify_callback_signature("order_1", "pay_1", &signature, SECRET));
    }

    #[test]
    fn test_tampered_signature_fails() {
        let mut signature = sign_callback("order_1", "pay_1", SECRET);
        // Flip the last hex digit
        let last = signature.pop().unwrap();
        signature.push(if last == '0' { '1' } else { '0' });
        assert!(!verify_callback_signature("order_1", "pay_1", &signature, SECRET));
    }

    #[test]
    fn test_signature_bound_to_payload() {
        let signature = sign_callback("order_1", "pay_1", SECRET);
        assert!(!verify_callback_signature("order_2", "pay_1", &signature, SECRET));
        assert!(!verify_callback_signature("order_1", "pay_2", &signature, SECRET));
    }

    #[test]
    fn test_wrong_secret_fails() {
        let signature = sign_callback("order_1", "pay_1", SECRET);
        assert!(!verify_callback_signature("order_1", "pay_1", &signature, "other_secret"));
    }

    #[test]
    fn test_missing_fields_fail() {
        let signature = sign_callback("order_1", "pay_1", SECRET);
        assert!(!verify_callback_signature("", "pay_1", &signature, SECRET));
        assert!(!verify_callback_signature("order_1", "", &signature, SECRET));
        assert!(!verify_callback_signature("order_1", "pay_1", "", SECRET));
    }

    #[test]
    fn test_non_hex_signature_fails() {
        assert!(!verify_callback_signature("order_1", "pay_1", "not-hex!", SECRET));
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    /// A signature only verifies against the exact payload it was made for
    #[test]
    fn prop_signature_rejects_any_other_payload() {
        proptest!(|(
            order in "[a-z0-9_]{1,32}",
            payment in "[a-z0-9_]{1,32}",
            other_order in "[a-z0-9_]{1,32}",
            other_payment in "[a-z0-9_]{1,32}",
        )| {
            let signature = sign_callback(&order, &payment, "secret");
            prop_assert!(verify_callback_signature(&order, &payment, &signature, "secret"));

            if other_order != order || other_payment != payment {
                prop_assert!(!verify_callback_signature(
                    &other_order,
                    &other_payment,
                    &signature,
                    "secret"
                ));
            }
        });
    }
}

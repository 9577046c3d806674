use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{to_minor_units, AppError, GatewayConfig};

/// Everything the frontend needs to redirect to the hosted checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutHandle {
    pub reference: String,
    pub amount_in_cents: i64,
    pub currency: String,
    pub integrity_signature: String,
    pub public_key: String,
    pub checkout_url: String,
    pub redirect_url: String,
}

/// Integrity signature the hosted checkout verifies before rendering the
/// widget: SHA-256 over reference, amount in minor units, currency and
/// the merchant integrity secret, hex-encoded.
pub fn integrity_signature(
    reference: &str,
    amount_in_cents: i64,
    currency: &str,
    integrity_secret: &str,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(reference.as_bytes());
    hasher.update(amount_in_cents.to_string().as_bytes());
    hasher.update(currency.as_bytes());
    hasher.update(integrity_secret.as_bytes());
    hex::encode(hasher.finalize())
}

pub fn new_reference(payment_id: Uuid) -> String {
    format!("KAIROS-{}", payment_id.simple())
}

pub fn build_checkout_handle(
    config: &GatewayConfig,
    reference: String,
    amount: Decimal,
) -> Result<CheckoutHandle, AppError> {
    let amount_in_cents = to_minor_units(amount)
        .ok_or_else(|| AppError::Gateway(format!("Amount {} overflows minor units", amount)))?;

    let integrity_signature = integrity_signature(
        &reference,
        amount_in_cents,
        &config.currency,
        &config.integrity_secret,
    );

    Ok(CheckoutHandle {
        reference,
        amount_in_cents,
        currency: config.currency.clone(),
        integrity_signature,
        public_key: config.public_key.clone(),
        checkout_url: config.checkout_url.clone(),
        redirect_url: config.redirect_url.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GatewayConfig {
        GatewayConfig {
            public_key: "pub_test_key".to_string(),
            integrity_secret: "test_integrity_secret".to_string(),
            events_secret: "test_events_secret".to_string(),
            checkout_url: "https://checkout.co/p/".to_string(),
            api_base_url: "https://sandbox.gateway.co/v1".to_string(),
            currency: "COP".to_string(),
            redirect_url: "http://localhost:3000/enrollment/result".to_string(),
            sandbox: true,
        }
    }

    #[test]
    fn signature_is_deterministic_and_hex() {
        let a = integrity_signature("KAIROS-x", 35_000_000, "COP", "secret");
        let b = integrity_signature("KAIROS-x", 35_000_000, "COP", "secret");

        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn signature_changes_with_any_input() {
        let base = integrity_signature("KAIROS-x", 35_000_000, "COP", "secret");

        assert_ne!(base, integrity_signature("KAIROS-y", 35_000_000, "COP", "secret"));
        assert_ne!(base, integrity_signature("KAIROS-x", 35_000_001, "COP", "secret"));
        assert_ne!(base, integrity_signature("KAIROS-x", 35_000_000, "USD", "secret"));
        assert_ne!(base, integrity_signature("KAIROS-x", 35_000_000, "COP", "other"));
    }

    #[test]
    fn handle_converts_pesos_to_cents() {
        let handle =
            build_checkout_handle(&config(), "KAIROS-ref".to_string(), Decimal::from(350_000))
                .unwrap();

        assert_eq!(handle.amount_in_cents, 35_000_000);
        assert_eq!(handle.currency, "COP");
        assert_eq!(
            handle.integrity_signature,
            integrity_signature("KAIROS-ref", 35_000_000, "COP", "test_integrity_secret")
        );
    }

    #[test]
    fn references_are_prefixed_and_unique_per_payment() {
        let a = new_reference(Uuid::new_v4());
        let b = new_reference(Uuid::new_v4());

        assert!(a.starts_with("KAIROS-"));
        assert_ne!(a, b);
    }
}

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use kairos_common::{AppError, GatewayConfig};

use crate::models::{GatewayEvent, GatewayTransaction};

type HmacSha256 = Hmac<Sha256>;

/// Event checksum: HMAC-SHA256 keyed with the merchant events secret over
/// the transaction reference, status, amount in minor units and the event
/// timestamp, hex-encoded.
pub fn event_checksum(
    reference: &str,
    status: &str,
    amount_in_cents: i64,
    timestamp: i64,
    events_secret: &str,
) -> Result<String, AppError> {
    let mut mac = HmacSha256::new_from_slice(events_secret.as_bytes())
        .map_err(|_| AppError::Internal("Invalid events secret".to_string()))?;

    mac.update(reference.as_bytes());
    mac.update(status.as_bytes());
    mac.update(amount_in_cents.to_string().as_bytes());
    mac.update(timestamp.to_string().as_bytes());

    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Rejects events whose checksum does not match what the events secret
/// produces over the signed transaction fields.
pub fn verify_event(event: &GatewayEvent, events_secret: &str) -> Result<(), AppError> {
    let transaction = &event.data.transaction;
    let expected = event_checksum(
        &transaction.reference,
        &transaction.status,
        transaction.amount_in_cents,
        event.timestamp,
        events_secret,
    )?;

    if expected.eq_ignore_ascii_case(&event.signature.checksum) {
        Ok(())
    } else {
        Err(AppError::Authentication(format!(
            "Invalid event checksum for reference {}",
            transaction.reference
        )))
    }
}

/// Read-only client for the gateway transactions API, used to confirm a
/// webhook against the source of truth before settling.
#[derive(Clone)]
pub struct GatewayClient {
    http: reqwest::Client,
    config: GatewayConfig,
}

impl GatewayClient {
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    pub async fn fetch_transaction(
        &self,
        transaction_id: &str,
    ) -> Result<GatewayTransaction, AppError> {
        #[derive(Deserialize)]
        struct Envelope {
            data: GatewayTransaction,
        }

        let url = format!(
            "{}/transactions/{}",
            self.config.api_base_url.trim_end_matches('/'),
            transaction_id
        );

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.config.public_key)
            .send()
            .await
            .map_err(|e| AppError::Gateway(format!("Transaction lookup failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Gateway(format!(
                "Gateway returned {} for transaction {}",
                response.status(),
                transaction_id
            )));
        }

        let envelope: Envelope = response
            .json()
            .await
            .map_err(|e| AppError::Gateway(format!("Malformed transaction response: {}", e)))?;

        Ok(envelope.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EventSignature, GatewayEventData};

    fn event(checksum: &str) -> GatewayEvent {
        GatewayEvent {
            event: "transaction.updated".to_string(),
            data: GatewayEventData {
                transaction: GatewayTransaction {
                    id: "tx-1".to_string(),
                    reference: "KAIROS-abc".to_string(),
                    status: "APPROVED".to_string(),
                    amount_in_cents: 20_000_000,
                    payment_method_type: Some("CARD".to_string()),
                },
            },
            timestamp: 1_700_000_000,
            signature: EventSignature {
                checksum: checksum.to_string(),
                properties: vec![],
            },
        }
    }

    #[test]
    fn checksum_is_deterministic() {
        let a = event_checksum("KAIROS-abc", "APPROVED", 20_000_000, 1_700_000_000, "s").unwrap();
        let b = event_checksum("KAIROS-abc", "APPROVED", 20_000_000, 1_700_000_000, "s").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn checksum_covers_every_signed_field() {
        let base = event_checksum("KAIROS-abc", "APPROVED", 20_000_000, 1_700_000_000, "s").unwrap();

        assert_ne!(base, event_checksum("KAIROS-xyz", "APPROVED", 20_000_000, 1_700_000_000, "s").unwrap());
        assert_ne!(base, event_checksum("KAIROS-abc", "DECLINED", 20_000_000, 1_700_000_000, "s").unwrap());
        assert_ne!(base, event_checksum("KAIROS-abc", "APPROVED", 20_000_001, 1_700_000_000, "s").unwrap());
        assert_ne!(base, event_checksum("KAIROS-abc", "APPROVED", 20_000_000, 1_700_000_001, "s").unwrap());
        assert_ne!(base, event_checksum("KAIROS-abc", "APPROVED", 20_000_000, 1_700_000_000, "t").unwrap());
    }

    #[test]
    fn valid_checksum_passes_verification() {
        let checksum =
            event_checksum("KAIROS-abc", "APPROVED", 20_000_000, 1_700_000_000, "secret").unwrap();
        assert!(verify_event(&event(&checksum), "secret").is_ok());
    }

    #[test]
    fn checksum_comparison_ignores_hex_case() {
        let checksum =
            event_checksum("KAIROS-abc", "APPROVED", 20_000_000, 1_700_000_000, "secret").unwrap();
        assert!(verify_event(&event(&checksum.to_uppercase()), "secret").is_ok());
    }

    #[test]
    fn forged_checksum_is_rejected() {
        let result = verify_event(&event("0000"), "secret");
        assert!(matches!(result, Err(AppError::Authentication(_))));
    }
}

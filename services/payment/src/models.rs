use chrono::NaiveDate;
use kairos_database::{Payment, PaymentTransaction};
use serde::{Deserialize, Serialize};

use kairos_common::SettlementMethod;

/// Transaction event as delivered by the gateway webhook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayEvent {
    pub event: String,
    pub data: GatewayEventData,
    pub timestamp: i64,
    pub signature: EventSignature,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayEventData {
    pub transaction: GatewayTransaction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayTransaction {
    pub id: String,
    pub reference: String,
    pub status: String,
    pub amount_in_cents: i64,
    #[serde(default)]
    pub payment_method_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSignature {
    pub checksum: String,
    #[serde(default)]
    pub properties: Vec<String>,
}

/// Cash-desk settlement recorded by an administrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualSettlementRequest {
    pub method: SettlementMethod,
    /// Receipt number or voucher id; generated when absent.
    #[serde(default)]
    pub external_reference: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SettlementOutcome {
    pub payment: Payment,
    pub transaction: PaymentTransaction,
    /// True when the payment was already completed under the same
    /// external reference and nothing changed.
    pub already_settled: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecomputeResult {
    pub as_of: NaiveDate,
    pub transitioned: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WebhookAck {
    pub received: bool,
    pub detail: String,
}

impl WebhookAck {
    pub fn handled(detail: impl Into<String>) -> Self {
        Self {
            received: true,
            detail: detail.into(),
        }
    }
}

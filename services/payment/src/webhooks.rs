use kairos_common::{AppError, GatewayConfig, SettlementMethod};

use crate::gateway::{self, GatewayClient};
use crate::ledger::LedgerService;
use crate::models::{GatewayEvent, WebhookAck};
use crate::notifications::Mailer;

/// Handles gateway transaction events. Deliveries may arrive repeated or
/// out of order; everything funnels into the idempotent settlement path
/// and is acknowledged so the gateway stops retrying.
#[derive(Clone)]
pub struct WebhookProcessor {
    ledger: LedgerService,
    client: GatewayClient,
    mailer: Mailer,
    config: GatewayConfig,
}

impl WebhookProcessor {
    pub fn new(
        ledger: LedgerService,
        client: GatewayClient,
        mailer: Mailer,
        config: GatewayConfig,
    ) -> Self {
        Self {
            ledger,
            client,
            mailer,
            config,
        }
    }

    pub async fn process(&self, event: GatewayEvent) -> Result<WebhookAck, AppError> {
        gateway::verify_event(&event, &self.config.events_secret)?;

        let transaction = &event.data.transaction;

        match transaction.status.as_str() {
            "APPROVED" => self.settle_approved(&event).await,
            "DECLINED" | "VOIDED" | "ERROR" => {
                tracing::info!(
                    "transaction {} for {} ended as {}",
                    transaction.id,
                    transaction.reference,
                    transaction.status
                );
                Ok(WebhookAck::handled(format!(
                    "{} acknowledged",
                    transaction.status
                )))
            }
            "PENDING" => {
                tracing::debug!(
                    "transaction {} for {} still pending",
                    transaction.id,
                    transaction.reference
                );
                Ok(WebhookAck::handled("PENDING acknowledged"))
            }
            other => {
                tracing::warn!(
                    "unrecognized transaction status '{}' for {}",
                    other,
                    transaction.reference
                );
                Ok(WebhookAck::handled("unrecognized status acknowledged"))
            }
        }
    }

    async fn settle_approved(&self, event: &GatewayEvent) -> Result<WebhookAck, AppError> {
        let transaction = &event.data.transaction;

        // Outside the sandbox the event is confirmed against the
        // transactions API before money is marked as received.
        if !self.config.sandbox {
            let fetched = self.client.fetch_transaction(&transaction.id).await?;
            if fetched.status != "APPROVED" || fetched.reference != transaction.reference {
                return Err(AppError::Gateway(format!(
                    "Transaction {} does not confirm as APPROVED for {}",
                    transaction.id, transaction.reference
                )));
            }
        }

        let method = transaction
            .payment_method_type
            .as_deref()
            .and_then(SettlementMethod::parse)
            .unwrap_or(SettlementMethod::Card);

        let outcome = match self
            .ledger
            .settle_by_reference(
                &transaction.reference,
                method,
                &transaction.id,
                Some(transaction.amount_in_cents),
            )
            .await
        {
            Ok(outcome) => outcome,
            // References the ledger never issued (other environments,
            // stale sandboxes) are acknowledged, not retried forever.
            Err(AppError::NotFound(_)) => {
                tracing::warn!("webhook for unknown reference {}", transaction.reference);
                return Ok(WebhookAck::handled("unknown reference acknowledged"));
            }
            Err(e) => return Err(e),
        };

        if outcome.already_settled {
            tracing::info!(
                "duplicate APPROVED delivery for {}, already settled",
                transaction.reference
            );
            return Ok(WebhookAck::handled("already settled"));
        }

        tracing::info!(
            "payment {} settled via {} for {} COP",
            outcome.payment.payment_id,
            method.as_str(),
            outcome.payment.amount
        );

        if let Some(recipient) = self
            .ledger
            .settlement_recipient(outcome.payment.student_id)
            .await?
        {
            self.mailer.spawn_settlement_confirmation(
                recipient,
                outcome.payment.concept.clone(),
                outcome.payment.amount,
                transaction.reference.clone(),
            );
        }

        Ok(WebhookAck::handled("settled"))
    }
}

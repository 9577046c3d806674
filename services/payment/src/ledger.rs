use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use kairos_common::gateway as checkout;
use kairos_common::{
    to_minor_units, AppError, CheckoutHandle, GatewayConfig, PaymentStatus, SettlementMethod,
};
use kairos_database::{Payment, PaymentTransaction};

use crate::models::{ManualSettlementRequest, SettlementOutcome};

/// Settlement and query side of the payment ledger. Every settlement path
/// funnels through one guarded row update so gateway retries, replayed
/// webhooks and concurrent cash-desk entries cannot double-count.
#[derive(Clone)]
pub struct LedgerService {
    pool: PgPool,
    gateway: GatewayConfig,
}

impl LedgerService {
    pub fn new(pool: PgPool, gateway: GatewayConfig) -> Self {
        Self { pool, gateway }
    }

    /// Settles the payment carrying the given gateway reference. The
    /// expected amount, when provided, must match the ledger row exactly.
    pub async fn settle_by_reference(
        &self,
        reference: &str,
        method: SettlementMethod,
        external_reference: &str,
        expected_cents: Option<i64>,
    ) -> Result<SettlementOutcome, AppError> {
        let mut tx = self.pool.begin().await?;

        let payment = sqlx::query_as::<_, Payment>(
            "SELECT * FROM payments WHERE gateway_reference = $1 FOR UPDATE",
        )
        .bind(reference)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No payment with reference {}", reference)))?;

        let outcome =
            settle_locked(&mut tx, payment, method, external_reference, expected_cents).await?;
        tx.commit().await?;

        Ok(outcome)
    }

    /// Cash-desk settlement by payment id, recorded by an administrator.
    pub async fn settle_payment_by_id(
        &self,
        payment_id: Uuid,
        request: ManualSettlementRequest,
    ) -> Result<SettlementOutcome, AppError> {
        let external_reference = request
            .external_reference
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| format!("MANUAL-{}", Uuid::new_v4().simple()));

        let mut tx = self.pool.begin().await?;

        let payment =
            sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE payment_id = $1 FOR UPDATE")
                .bind(payment_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Payment {} not found", payment_id)))?;

        let outcome =
            settle_locked(&mut tx, payment, request.method, &external_reference, None).await?;
        tx.commit().await?;

        Ok(outcome)
    }

    /// Pending monthly payments whose due date has fully elapsed become
    /// overdue. Returns the number of rows transitioned.
    pub async fn recompute_overdue(&self, as_of: NaiveDate) -> Result<i64, AppError> {
        let result = sqlx::query(
            "UPDATE payments SET status = 'overdue', updated_at = NOW() \
             WHERE status = 'pending' AND due_date < $1 AND concept LIKE 'Mensualidad%'",
        )
        .bind(as_of)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() as i64)
    }

    pub async fn list_by_student_document(
        &self,
        document_number: &str,
    ) -> Result<Vec<Payment>, AppError> {
        let payments = sqlx::query_as::<_, Payment>(
            "SELECT p.* FROM payments p \
             JOIN students s ON s.student_id = p.student_id \
             WHERE s.document_number = $1 \
             ORDER BY p.due_date, p.concept",
        )
        .bind(document_number)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    pub async fn list_by_enrollment(&self, enrollment_id: Uuid) -> Result<Vec<Payment>, AppError> {
        let payments = sqlx::query_as::<_, Payment>(
            "SELECT * FROM payments WHERE enrollment_id = $1 ORDER BY due_date, concept",
        )
        .bind(enrollment_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    /// Re-issues the hosted-checkout handle for an unsettled payment,
    /// minting a gateway reference if the payment never received one.
    pub async fn reissue_checkout(&self, payment_id: Uuid) -> Result<CheckoutHandle, AppError> {
        let mut tx = self.pool.begin().await?;

        let payment =
            sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE payment_id = $1 FOR UPDATE")
                .bind(payment_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Payment {} not found", payment_id)))?;

        if payment.status == PaymentStatus::Completed.as_str() {
            return Err(AppError::Conflict(format!(
                "Payment {} is already settled",
                payment_id
            )));
        }

        let reference = match payment.gateway_reference.clone() {
            Some(reference) => reference,
            None => {
                let reference = checkout::new_reference(payment.payment_id);
                sqlx::query(
                    "UPDATE payments SET gateway_reference = $1, updated_at = NOW() \
                     WHERE payment_id = $2",
                )
                .bind(&reference)
                .bind(payment.payment_id)
                .execute(&mut *tx)
                .await?;
                reference
            }
        };

        tx.commit().await?;

        checkout::build_checkout_handle(&self.gateway, reference, payment.amount)
    }

    /// Address for settlement confirmations: the student's own mail when
    /// present, otherwise the responsible party's.
    pub async fn settlement_recipient(
        &self,
        student_id: Uuid,
    ) -> Result<Option<String>, AppError> {
        let recipient: Option<Option<String>> = sqlx::query_scalar(
            "SELECT COALESCE(s.email, rp.email) FROM students s \
             LEFT JOIN responsible_parties rp ON rp.responsible_party_id = s.parent_id \
             WHERE s.student_id = $1",
        )
        .bind(student_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(recipient.flatten())
    }
}

/// Completes a payment row already locked FOR UPDATE and records exactly
/// one transaction. Already-completed payments are a no-op when the
/// external reference matches and a conflict when it does not.
async fn settle_locked(
    tx: &mut Transaction<'_, Postgres>,
    payment: Payment,
    method: SettlementMethod,
    external_reference: &str,
    expected_cents: Option<i64>,
) -> Result<SettlementOutcome, AppError> {
    if payment.status == PaymentStatus::Completed.as_str() {
        let transaction = sqlx::query_as::<_, PaymentTransaction>(
            "SELECT * FROM payment_transactions WHERE payment_id = $1",
        )
        .bind(payment.payment_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| {
            AppError::Internal(format!(
                "Settled payment {} has no transaction record",
                payment.payment_id
            ))
        })?;

        if transaction.external_reference == external_reference {
            return Ok(SettlementOutcome {
                payment,
                transaction,
                already_settled: true,
            });
        }

        return Err(AppError::SettlementConflict(format!(
            "Payment {} is already settled under reference {}",
            payment.payment_id, transaction.external_reference
        )));
    }

    if let Some(expected) = expected_cents {
        let ledger_cents = to_minor_units(payment.amount).ok_or_else(|| {
            AppError::Internal(format!("Amount {} overflows minor units", payment.amount))
        })?;

        if expected != ledger_cents {
            return Err(AppError::SettlementConflict(format!(
                "Settled amount {} centavos does not match {} owed on payment {}",
                expected, ledger_cents, payment.payment_id
            )));
        }
    }

    // The status guard makes this a no-op if another settlement landed
    // between our lock acquisition and here.
    let payment = sqlx::query_as::<_, Payment>(
        "UPDATE payments SET status = 'completed', paid_amount = amount, \
         remaining_amount = 0, payment_date = NOW(), payment_method = $1, updated_at = NOW() \
         WHERE payment_id = $2 AND status <> 'completed' RETURNING *",
    )
    .bind(method.as_str())
    .bind(payment.payment_id)
    .fetch_one(&mut **tx)
    .await?;

    sqlx::query(
        "INSERT INTO payment_transactions \
         (transaction_id, payment_id, amount, method, external_reference, transaction_date) \
         VALUES ($1, $2, $3, $4, $5, NOW()) \
         ON CONFLICT (payment_id) DO NOTHING",
    )
    .bind(Uuid::new_v4())
    .bind(payment.payment_id)
    .bind(payment.amount)
    .bind(method.as_str())
    .bind(external_reference)
    .execute(&mut **tx)
    .await?;

    let transaction = sqlx::query_as::<_, PaymentTransaction>(
        "SELECT * FROM payment_transactions WHERE payment_id = $1",
    )
    .bind(payment.payment_id)
    .fetch_one(&mut **tx)
    .await?;

    Ok(SettlementOutcome {
        payment,
        transaction,
        already_settled: false,
    })
}

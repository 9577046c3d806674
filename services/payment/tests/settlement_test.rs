use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use kairos_common::{
    AppError, DatabaseConfig, GatewayConfig, PaymentStatus, SettlementMethod, SmtpConfig,
};
use kairos_database::{create_pool, MigrationRunner};
use kairos_payment::gateway::{self, GatewayClient};
use kairos_payment::ledger::LedgerService;
use kairos_payment::models::{
    EventSignature, GatewayEvent, GatewayEventData, GatewayTransaction, ManualSettlementRequest,
};
use kairos_payment::notifications::Mailer;
use kairos_payment::webhooks::WebhookProcessor;

const EVENTS_SECRET: &str = "test_events_secret";

fn gateway_config() -> GatewayConfig {
    GatewayConfig {
        public_key: "pub_test_key".to_string(),
        integrity_secret: "test_integrity_secret".to_string(),
        events_secret: EVENTS_SECRET.to_string(),
        checkout_url: "https://checkout.co/p/".to_string(),
        api_base_url: "https://sandbox.gateway.co/v1".to_string(),
        currency: "COP".to_string(),
        redirect_url: "http://localhost:3000/enrollment/result".to_string(),
        sandbox: true,
    }
}

/// One throwaway database per test; skipped entirely when no Postgres is
/// reachable through DATABASE_URL.
async fn harness() -> Option<(PgPool, LedgerService)> {
    if std::env::var("DATABASE_URL").is_err() {
        println!("Skipping database test - DATABASE_URL not set");
        return None;
    }

    let database = DatabaseConfig {
        database: format!("kairos_test_{}", Uuid::new_v4().simple()),
        ..DatabaseConfig::from_env()
    };

    let pool = create_pool(&database).await.expect("Failed to create test database");
    MigrationRunner::new(pool.clone())
        .run_all_migrations()
        .await
        .expect("Failed to run migrations");

    let ledger = LedgerService::new(pool.clone(), gateway_config());
    Some((pool, ledger))
}

fn processor(ledger: LedgerService) -> WebhookProcessor {
    let smtp = SmtpConfig {
        enabled: false,
        host: "localhost".to_string(),
        username: String::new(),
        password: String::new(),
        from_name: "Academia Kairos".to_string(),
        from_email: "no-reply@kairos.edu.co".to_string(),
    };
    let mailer = Mailer::new(&smtp).expect("Failed to build mailer");

    WebhookProcessor::new(
        ledger,
        GatewayClient::new(gateway_config()),
        mailer,
        gateway_config(),
    )
}

struct Fixture {
    student_id: Uuid,
    program_id: Uuid,
    enrollment_id: Uuid,
}

async fn seed_enrollment(pool: &PgPool) -> Fixture {
    let student_id: Uuid = sqlx::query_scalar(
        "INSERT INTO students (name, last_name, document_type, document_number, birth_date, gender, email) \
         VALUES ('Samuel', 'Pérez', 'ti', $1, '2015-03-12', 'male', 'samuel@example.com') \
         RETURNING student_id",
    )
    .bind(&Uuid::new_v4().simple().to_string()[..16])
    .fetch_one(pool)
    .await
    .expect("Failed to insert student");

    let program_id: Uuid = sqlx::query_scalar(
        "INSERT INTO academic_programs (name, monthly_fee) VALUES ('Piano Infantil', 180000) \
         RETURNING program_id",
    )
    .fetch_one(pool)
    .await
    .expect("Failed to insert program");

    let enrollment_id: Uuid = sqlx::query_scalar(
        "INSERT INTO enrollments (student_id, program_id, enrollment_date, payment_commitment) \
         VALUES ($1, $2, CURRENT_DATE, TRUE) RETURNING enrollment_id",
    )
    .bind(student_id)
    .bind(program_id)
    .fetch_one(pool)
    .await
    .expect("Failed to insert enrollment");

    Fixture {
        student_id,
        program_id,
        enrollment_id,
    }
}

async fn seed_payment(
    pool: &PgPool,
    fixture: &Fixture,
    concept: &str,
    amount: Decimal,
    due_date: NaiveDate,
    status: &str,
    gateway_reference: Option<&str>,
) -> Uuid {
    sqlx::query_scalar(
        "INSERT INTO payments (enrollment_id, student_id, program_id, concept, amount, \
         original_amount, paid_amount, remaining_amount, status, due_date, gateway_reference) \
         VALUES ($1, $2, $3, $4, $5, $5, 0, $5, $6, $7, $8) RETURNING payment_id",
    )
    .bind(fixture.enrollment_id)
    .bind(fixture.student_id)
    .bind(fixture.program_id)
    .bind(concept)
    .bind(amount)
    .bind(status)
    .bind(due_date)
    .bind(gateway_reference)
    .fetch_one(pool)
    .await
    .expect("Failed to insert payment")
}

async fn payment_status(pool: &PgPool, payment_id: Uuid) -> String {
    sqlx::query_scalar("SELECT status FROM payments WHERE payment_id = $1")
        .bind(payment_id)
        .fetch_one(pool)
        .await
        .expect("Failed to read payment status")
}

async fn transaction_count(pool: &PgPool, payment_id: Uuid) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM payment_transactions WHERE payment_id = $1")
        .bind(payment_id)
        .fetch_one(pool)
        .await
        .expect("Failed to count transactions")
}

fn approved_event(reference: &str, transaction_id: &str, amount_in_cents: i64) -> GatewayEvent {
    let timestamp = Utc::now().timestamp();
    let checksum = gateway::event_checksum(
        reference,
        "APPROVED",
        amount_in_cents,
        timestamp,
        EVENTS_SECRET,
    )
    .expect("Failed to compute checksum");

    GatewayEvent {
        event: "transaction.updated".to_string(),
        data: GatewayEventData {
            transaction: GatewayTransaction {
                id: transaction_id.to_string(),
                reference: reference.to_string(),
                status: "APPROVED".to_string(),
                amount_in_cents,
                payment_method_type: Some("CARD".to_string()),
            },
        },
        timestamp,
        signature: EventSignature {
            checksum,
            properties: vec![],
        },
    }
}

#[tokio::test]
async fn settlement_completes_payment_with_one_transaction() {
    let Some((pool, ledger)) = harness().await else { return };
    let fixture = seed_enrollment(&pool).await;
    let due = NaiveDate::from_ymd_opt(2026, 8, 31).unwrap();
    let payment_id = seed_payment(
        &pool,
        &fixture,
        "Matrícula",
        Decimal::from(200_000),
        due,
        "pending",
        Some("KAIROS-ref-1"),
    )
    .await;

    let outcome = ledger
        .settle_by_reference("KAIROS-ref-1", SettlementMethod::Card, "tx-1", Some(20_000_000))
        .await
        .expect("Settlement failed");

    assert!(!outcome.already_settled);
    assert_eq!(outcome.payment.status, PaymentStatus::Completed.as_str());
    assert_eq!(outcome.payment.paid_amount, Decimal::from(200_000));
    assert_eq!(outcome.payment.remaining_amount, Decimal::ZERO);
    assert!(outcome.payment.payment_date.is_some());
    assert_eq!(outcome.transaction.external_reference, "tx-1");
    assert_eq!(transaction_count(&pool, payment_id).await, 1);
}

#[tokio::test]
async fn repeated_settlement_with_same_reference_is_noop() {
    let Some((pool, ledger)) = harness().await else { return };
    let fixture = seed_enrollment(&pool).await;
    let due = NaiveDate::from_ymd_opt(2026, 8, 31).unwrap();
    let payment_id = seed_payment(
        &pool,
        &fixture,
        "Matrícula",
        Decimal::from(200_000),
        due,
        "pending",
        Some("KAIROS-ref-2"),
    )
    .await;

    ledger
        .settle_by_reference("KAIROS-ref-2", SettlementMethod::Card, "tx-1", None)
        .await
        .expect("First settlement failed");

    let second = ledger
        .settle_by_reference("KAIROS-ref-2", SettlementMethod::Card, "tx-1", None)
        .await
        .expect("Replay should be a no-op success");

    assert!(second.already_settled);
    assert_eq!(transaction_count(&pool, payment_id).await, 1);
}

#[tokio::test]
async fn settlement_under_different_reference_conflicts() {
    let Some((pool, ledger)) = harness().await else { return };
    let fixture = seed_enrollment(&pool).await;
    let due = NaiveDate::from_ymd_opt(2026, 8, 31).unwrap();
    let payment_id = seed_payment(
        &pool,
        &fixture,
        "Matrícula",
        Decimal::from(200_000),
        due,
        "pending",
        Some("KAIROS-ref-3"),
    )
    .await;

    ledger
        .settle_by_reference("KAIROS-ref-3", SettlementMethod::Card, "tx-1", None)
        .await
        .expect("First settlement failed");

    let second = ledger
        .settle_by_reference("KAIROS-ref-3", SettlementMethod::Pse, "tx-2", None)
        .await;

    assert!(matches!(second, Err(AppError::SettlementConflict(_))));
    assert_eq!(transaction_count(&pool, payment_id).await, 1);
}

#[tokio::test]
async fn amount_mismatch_blocks_settlement() {
    let Some((pool, ledger)) = harness().await else { return };
    let fixture = seed_enrollment(&pool).await;
    let due = NaiveDate::from_ymd_opt(2026, 8, 31).unwrap();
    let payment_id = seed_payment(
        &pool,
        &fixture,
        "Matrícula",
        Decimal::from(200_000),
        due,
        "pending",
        Some("KAIROS-ref-4"),
    )
    .await;

    let result = ledger
        .settle_by_reference("KAIROS-ref-4", SettlementMethod::Card, "tx-1", Some(19_999_999))
        .await;

    assert!(matches!(result, Err(AppError::SettlementConflict(_))));
    assert_eq!(payment_status(&pool, payment_id).await, "pending");
    assert_eq!(transaction_count(&pool, payment_id).await, 0);
}

#[tokio::test]
async fn cash_desk_settlement_by_id() {
    let Some((pool, ledger)) = harness().await else { return };
    let fixture = seed_enrollment(&pool).await;
    let due = NaiveDate::from_ymd_opt(2026, 8, 31).unwrap();
    let payment_id = seed_payment(
        &pool,
        &fixture,
        "Mensualidad Agosto 2026",
        Decimal::from(180_000),
        due,
        "overdue",
        None,
    )
    .await;

    let outcome = ledger
        .settle_payment_by_id(
            payment_id,
            ManualSettlementRequest {
                method: SettlementMethod::Cash,
                external_reference: None,
            },
        )
        .await
        .expect("Manual settlement failed");

    assert_eq!(outcome.payment.status, PaymentStatus::Completed.as_str());
    assert_eq!(outcome.transaction.method, "cash");
    assert!(outcome.transaction.external_reference.starts_with("MANUAL-"));
}

#[tokio::test]
async fn overdue_sweep_targets_elapsed_monthlies_only() {
    let Some((pool, ledger)) = harness().await else { return };
    let fixture = seed_enrollment(&pool).await;
    let as_of = NaiveDate::from_ymd_opt(2026, 8, 31).unwrap();
    let fee = Decimal::from(180_000);

    let elapsed_monthly = seed_payment(
        &pool,
        &fixture,
        "Mensualidad Julio 2026",
        fee,
        NaiveDate::from_ymd_opt(2026, 7, 31).unwrap(),
        "pending",
        None,
    )
    .await;
    let due_today_monthly = seed_payment(
        &pool,
        &fixture,
        "Mensualidad Agosto 2026",
        fee,
        as_of,
        "pending",
        None,
    )
    .await;
    let future_monthly = seed_payment(
        &pool,
        &fixture,
        "Mensualidad Septiembre 2026",
        fee,
        NaiveDate::from_ymd_opt(2026, 9, 30).unwrap(),
        "pending",
        None,
    )
    .await;
    let elapsed_admission = seed_payment(
        &pool,
        &fixture,
        "Matrícula",
        Decimal::from(200_000),
        NaiveDate::from_ymd_opt(2026, 6, 30).unwrap(),
        "pending",
        None,
    )
    .await;
    let settled_monthly = seed_payment(
        &pool,
        &fixture,
        "Mensualidad Mayo 2026",
        fee,
        NaiveDate::from_ymd_opt(2026, 5, 31).unwrap(),
        "completed",
        None,
    )
    .await;

    let transitioned = ledger.recompute_overdue(as_of).await.expect("Sweep failed");
    assert_eq!(transitioned, 1);

    assert_eq!(payment_status(&pool, elapsed_monthly).await, "overdue");
    assert_eq!(payment_status(&pool, due_today_monthly).await, "pending");
    assert_eq!(payment_status(&pool, future_monthly).await, "pending");
    assert_eq!(payment_status(&pool, elapsed_admission).await, "pending");
    assert_eq!(payment_status(&pool, settled_monthly).await, "completed");

    // Re-running the sweep finds nothing left to move.
    let again = ledger.recompute_overdue(as_of).await.expect("Sweep failed");
    assert_eq!(again, 0);
}

#[tokio::test]
async fn approved_webhook_settles_idempotently() {
    let Some((pool, ledger)) = harness().await else { return };
    let fixture = seed_enrollment(&pool).await;
    let due = NaiveDate::from_ymd_opt(2026, 8, 31).unwrap();
    let payment_id = seed_payment(
        &pool,
        &fixture,
        "Matrícula",
        Decimal::from(200_000),
        due,
        "pending",
        Some("KAIROS-ref-5"),
    )
    .await;

    let webhooks = processor(ledger);
    let event = approved_event("KAIROS-ref-5", "tx-99", 20_000_000);

    let ack = webhooks.process(event.clone()).await.expect("Webhook failed");
    assert!(ack.received);
    assert_eq!(payment_status(&pool, payment_id).await, "completed");

    // Redelivery of the same event changes nothing.
    let replay = webhooks.process(event).await.expect("Replay failed");
    assert!(replay.received);
    assert_eq!(transaction_count(&pool, payment_id).await, 1);
}

#[tokio::test]
async fn forged_webhook_checksum_is_rejected() {
    let Some((pool, ledger)) = harness().await else { return };
    let fixture = seed_enrollment(&pool).await;
    let due = NaiveDate::from_ymd_opt(2026, 8, 31).unwrap();
    let payment_id = seed_payment(
        &pool,
        &fixture,
        "Matrícula",
        Decimal::from(200_000),
        due,
        "pending",
        Some("KAIROS-ref-6"),
    )
    .await;

    let mut event = approved_event("KAIROS-ref-6", "tx-1", 20_000_000);
    event.signature.checksum = "0".repeat(64);

    let webhooks = processor(ledger);
    let result = webhooks.process(event).await;

    assert!(matches!(result, Err(AppError::Authentication(_))));
    assert_eq!(payment_status(&pool, payment_id).await, "pending");
}

#[tokio::test]
async fn webhook_for_unknown_reference_is_acknowledged() {
    let Some((_pool, ledger)) = harness().await else { return };

    let webhooks = processor(ledger);
    let event = approved_event("KAIROS-never-issued", "tx-1", 20_000_000);

    let ack = webhooks.process(event).await.expect("Unknown reference should be acknowledged");
    assert!(ack.received);
}

#[tokio::test]
async fn checkout_reissue_mints_and_persists_a_reference() {
    let Some((pool, ledger)) = harness().await else { return };
    let fixture = seed_enrollment(&pool).await;
    let due = NaiveDate::from_ymd_opt(2026, 8, 31).unwrap();
    let payment_id = seed_payment(
        &pool,
        &fixture,
        "Matrícula",
        Decimal::from(200_000),
        due,
        "pending",
        None,
    )
    .await;

    let handle = ledger.reissue_checkout(payment_id).await.expect("Reissue failed");
    assert!(handle.reference.starts_with("KAIROS-"));
    assert_eq!(handle.amount_in_cents, 20_000_000);

    let stored: Option<String> =
        sqlx::query_scalar("SELECT gateway_reference FROM payments WHERE payment_id = $1")
            .bind(payment_id)
            .fetch_one(&pool)
            .await
            .expect("Failed to read payment");
    assert_eq!(stored.as_deref(), Some(handle.reference.as_str()));

    // A second issue keeps the stored reference stable.
    let again = ledger.reissue_checkout(payment_id).await.expect("Reissue failed");
    assert_eq!(again.reference, handle.reference);
}

#[tokio::test]
async fn checkout_reissue_rejects_settled_payments() {
    let Some((pool, ledger)) = harness().await else { return };
    let fixture = seed_enrollment(&pool).await;
    let due = NaiveDate::from_ymd_opt(2026, 8, 31).unwrap();
    let payment_id = seed_payment(
        &pool,
        &fixture,
        "Matrícula",
        Decimal::from(200_000),
        due,
        "completed",
        None,
    )
    .await;

    let result = ledger.reissue_checkout(payment_id).await;
    assert!(matches!(result, Err(AppError::Conflict(_))));
}

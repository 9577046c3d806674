use axum::{
    extract::{Path, State},
    response::Json,
};
use chrono::Utc;
use uuid::Uuid;

use kairos_auth::Claims;
use kairos_common::{ApiResponse, AppError, CheckoutHandle};
use kairos_database::Payment;

use crate::models::{
    GatewayEvent, ManualSettlementRequest, RecomputeResult, SettlementOutcome, WebhookAck,
};
use crate::AppState;

/// Public endpoint the gateway delivers transaction events to. Replies
/// 2xx for every verified event so the gateway stops retrying.
pub async fn gateway_webhook(
    State(state): State<AppState>,
    Json(event): Json<GatewayEvent>,
) -> Result<Json<ApiResponse<WebhookAck>>, AppError> {
    let ack = state.webhooks.process(event).await?;
    Ok(Json(ApiResponse::success(ack)))
}

/// Re-issues the hosted-checkout handle for an unsettled payment, the
/// recovery path when the first checkout attempt failed or expired.
pub async fn reissue_checkout(
    State(state): State<AppState>,
    Path(payment_id): Path<Uuid>,
) -> Result<Json<ApiResponse<CheckoutHandle>>, AppError> {
    let handle = state.ledger.reissue_checkout(payment_id).await?;
    Ok(Json(ApiResponse::success(handle)))
}

// Admin ledger operations

pub async fn settle_payment(
    State(state): State<AppState>,
    claims: Claims,
    Path(payment_id): Path<Uuid>,
    Json(request): Json<ManualSettlementRequest>,
) -> Result<Json<ApiResponse<SettlementOutcome>>, AppError> {
    let outcome = state.ledger.settle_payment_by_id(payment_id, request).await?;
    tracing::info!(
        "payment {} settled manually via {} by {}",
        payment_id,
        outcome.transaction.method,
        claims.username
    );
    Ok(Json(ApiResponse::success(outcome)))
}

pub async fn recompute_overdue(
    State(state): State<AppState>,
    claims: Claims,
) -> Result<Json<ApiResponse<RecomputeResult>>, AppError> {
    let as_of = Utc::now().date_naive();
    let transitioned = state.ledger.recompute_overdue(as_of).await?;
    tracing::info!(
        "overdue recomputation by {} moved {} payments",
        claims.username,
        transitioned
    );
    Ok(Json(ApiResponse::success(RecomputeResult { as_of, transitioned })))
}

pub async fn list_by_document(
    State(state): State<AppState>,
    Path(document_number): Path<String>,
) -> Result<Json<ApiResponse<Vec<Payment>>>, AppError> {
    let payments = state.ledger.list_by_student_document(&document_number).await?;
    Ok(Json(ApiResponse::success(payments)))
}

pub async fn list_by_enrollment(
    State(state): State<AppState>,
    Path(enrollment_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<Payment>>>, AppError> {
    let payments = state.ledger.list_by_enrollment(enrollment_id).await?;
    Ok(Json(ApiResponse::success(payments)))
}

// Health check endpoint
pub async fn health_check() -> Result<Json<ApiResponse<String>>, AppError> {
    Ok(Json(ApiResponse::success("Payment service is healthy".to_string())))
}

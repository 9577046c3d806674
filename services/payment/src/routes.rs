use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use kairos_auth::{admin_only_middleware, auth_middleware};

use crate::{handlers, AppState};

pub fn create_routes(state: &AppState) -> Router<AppState> {
    // Ledger management is admin-only.
    let admin_routes = Router::new()
        .route(
            "/admin/payments/:payment_id/settle",
            post(handlers::settle_payment),
        )
        .route(
            "/admin/payments/recompute-overdue",
            post(handlers::recompute_overdue),
        )
        .route(
            "/admin/payments/by-document/:document_number",
            get(handlers::list_by_document),
        )
        .route(
            "/admin/enrollments/:enrollment_id/payments",
            get(handlers::list_by_enrollment),
        )
        .layer(middleware::from_fn(admin_only_middleware))
        .layer(middleware::from_fn_with_state(
            state.jwt_service.clone(),
            auth_middleware,
        ));

    // The gateway delivers events unauthenticated; the event checksum is
    // the authentication.
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/webhooks/gateway", post(handlers::gateway_webhook))
        .route(
            "/payments/:payment_id/checkout",
            post(handlers::reissue_checkout),
        )
        .merge(admin_routes)
}

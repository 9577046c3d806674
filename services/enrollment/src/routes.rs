use axum::{
    middleware,
    routing::{get, patch, post, put},
    Router,
};

use kairos_auth::{admin_only_middleware, auth_middleware};

use crate::{handlers, services::AppState};

pub fn create_routes(state: &AppState) -> Router<AppState> {
    // Catalog management and enrollment status changes are admin-only.
    let admin_routes = Router::new()
        .route("/admin/programs", post(handlers::create_program))
        .route("/admin/programs/:program_id", put(handlers::update_program))
        .route(
            "/admin/programs/:program_id/schedules",
            post(handlers::create_schedule),
        )
        .route(
            "/admin/enrollments/:enrollment_id/status",
            patch(handlers::change_enrollment_status),
        )
        .layer(middleware::from_fn(admin_only_middleware))
        .layer(middleware::from_fn_with_state(
            state.jwt_service.clone(),
            auth_middleware,
        ));

    // The enrollment submission is an unauthenticated public form.
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/programs", get(handlers::list_programs))
        .route("/enrollments", post(handlers::submit_enrollment))
        .merge(admin_routes)
}

use axum::{
    http::{Method, StatusCode},
    response::Json,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kairos_auth::JwtService;
use kairos_common::ApiResponse;
use kairos_database::{create_pool, MigrationRunner};

use kairos_enrollment::catalog::CatalogService;
use kairos_enrollment::config::EnrollmentConfig;
use kairos_enrollment::notifications::Mailer;
use kairos_enrollment::routes;
use kairos_enrollment::services::{AppState, EnrollmentService};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kairos_enrollment=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = EnrollmentConfig::from_env()?;

    // Create database connection pool and run migrations
    let db_pool = create_pool(&config.database).await?;
    let migration_runner = MigrationRunner::new(db_pool.clone());
    migration_runner.run_all_migrations().await?;
    migration_runner.seed_initial_data().await?;

    let jwt_service = JwtService::new(&config.jwt.secret);
    let mailer = Mailer::new(&config.smtp)?;
    let catalog = CatalogService::new(db_pool.clone());
    let enrollment_service = EnrollmentService::new(
        db_pool.clone(),
        catalog.clone(),
        mailer,
        config.clone(),
    );

    let app_state = AppState {
        config: config.clone(),
        db_pool,
        jwt_service,
        catalog,
        enrollment_service,
    };

    // Build CORS layer
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH])
        .allow_headers(Any)
        .allow_origin(Any);

    // Build the application
    let app = routes::create_routes(&app_state)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors))
        .with_state(app_state)
        .fallback(handler_404);

    // Start the server
    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", config.server.host, config.server.port))
            .await?;

    tracing::info!(
        "Enrollment Service listening on {}:{}",
        config.server.host,
        config.server.port
    );

    axum::serve(listener, app).await?;

    Ok(())
}

async fn handler_404() -> (StatusCode, Json<ApiResponse<()>>) {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::error("Endpoint not found".to_string())),
    )
}

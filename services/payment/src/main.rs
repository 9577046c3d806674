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

use kairos_payment::config::PaymentConfig;
use kairos_payment::gateway::GatewayClient;
use kairos_payment::ledger::LedgerService;
use kairos_payment::notifications::Mailer;
use kairos_payment::webhooks::WebhookProcessor;
use kairos_payment::{overdue, routes, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kairos_payment=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = PaymentConfig::from_env();

    // Create database connection pool and run migrations
    let db_pool = create_pool(&config.database).await?;
    let migration_runner = MigrationRunner::new(db_pool.clone());
    migration_runner.run_all_migrations().await?;
    migration_runner.seed_initial_data().await?;

    let jwt_service = JwtService::new(&config.jwt.secret);
    let mailer = Mailer::new(&config.smtp)?;
    let ledger = LedgerService::new(db_pool.clone(), config.gateway.clone());
    let client = GatewayClient::new(config.gateway.clone());
    let webhooks = WebhookProcessor::new(
        ledger.clone(),
        client,
        mailer,
        config.gateway.clone(),
    );

    // Nightly pending→overdue sweep; the handle must outlive the server.
    let _scheduler = overdue::start_overdue_job(&config.overdue_cron, ledger.clone()).await?;

    let app_state = AppState {
        config: config.clone(),
        db_pool,
        jwt_service,
        ledger,
        webhooks,
    };

    // Build CORS layer
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
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
        "Payment Service listening on {}:{}",
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

pub mod config;
pub mod gateway;
pub mod handlers;
pub mod ledger;
pub mod models;
pub mod notifications;
pub mod overdue;
pub mod routes;
pub mod webhooks;

use sqlx::PgPool;

use kairos_auth::JwtService;

use crate::config::PaymentConfig;
use crate::ledger::LedgerService;
use crate::webhooks::WebhookProcessor;

#[derive(Clone)]
pub struct AppState {
    pub config: PaymentConfig,
    pub db_pool: PgPool,
    pub jwt_service: JwtService,
    pub ledger: LedgerService,
    pub webhooks: WebhookProcessor,
}

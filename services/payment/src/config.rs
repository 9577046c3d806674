use kairos_common::{DatabaseConfig, GatewayConfig, JwtConfig, ServerConfig, SmtpConfig};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub gateway: GatewayConfig,
    pub smtp: SmtpConfig,
    /// Cron expression for the nightly pending→overdue sweep.
    pub overdue_cron: String,
}

impl PaymentConfig {
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig::from_env("PAYMENT_HOST", "PAYMENT_PORT", 8002),
            database: DatabaseConfig::from_env(),
            jwt: JwtConfig::from_env(),
            gateway: GatewayConfig::from_env(),
            smtp: SmtpConfig::from_env(),
            overdue_cron: std::env::var("OVERDUE_CRON")
                .unwrap_or_else(|_| "0 0 2 * * *".to_string()),
        }
    }
}

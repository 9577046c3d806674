use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
    pub max_connections: u32,
}

impl DatabaseConfig {
    pub fn connection_string(&self) -> String {
        format!(
            "postgresql://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database
        )
    }

    pub fn from_env() -> Self {
        Self {
            host: std::env::var("DATABASE_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: std::env::var("DATABASE_PORT")
                .unwrap_or_else(|_| "5432".to_string())
                .parse()
                .unwrap_or(5432),
            username: std::env::var("DATABASE_USERNAME")
                .unwrap_or_else(|_| "kairos_user".to_string()),
            password: std::env::var("DATABASE_PASSWORD")
                .unwrap_or_else(|_| "kairos_password".to_string()),
            database: std::env::var("DATABASE_NAME").unwrap_or_else(|_| "kairos".to_string()),
            max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap_or(10),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

impl ServerConfig {
    pub fn from_env(host_var: &str, port_var: &str, default_port: u16) -> Self {
        Self {
            host: std::env::var(host_var).unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var(port_var)
                .unwrap_or_else(|_| default_port.to_string())
                .parse()
                .unwrap_or(default_port),
            cors_origins: std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:3000".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub expiration_hours: u64,
    pub issuer: String,
}

impl JwtConfig {
    pub fn from_env() -> Self {
        Self {
            secret: std::env::var("JWT_SECRET")
                .unwrap_or_else(|_| "dev-secret-key-change-in-production".to_string()),
            expiration_hours: std::env::var("JWT_EXPIRATION_HOURS")
                .unwrap_or_else(|_| "24".to_string())
                .parse()
                .unwrap_or(24),
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "kairos".to_string()),
        }
    }
}

/// Hosted-checkout gateway credentials. The integrity secret signs the
/// redirect payload; the events secret verifies incoming webhooks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub public_key: String,
    pub integrity_secret: String,
    pub events_secret: String,
    pub checkout_url: String,
    pub api_base_url: String,
    pub currency: String,
    pub redirect_url: String,
    pub sandbox: bool,
}

impl GatewayConfig {
    pub fn from_env() -> Self {
        Self {
            public_key: std::env::var("GATEWAY_PUBLIC_KEY")
                .unwrap_or_else(|_| "pub_test_key".to_string()),
            integrity_secret: std::env::var("GATEWAY_INTEGRITY_SECRET")
                .unwrap_or_else(|_| "test_integrity_secret".to_string()),
            events_secret: std::env::var("GATEWAY_EVENTS_SECRET")
                .unwrap_or_else(|_| "test_events_secret".to_string()),
            checkout_url: std::env::var("GATEWAY_CHECKOUT_URL")
                .unwrap_or_else(|_| "https://checkout.co/p/".to_string()),
            api_base_url: std::env::var("GATEWAY_API_BASE_URL")
                .unwrap_or_else(|_| "https://sandbox.gateway.co/v1".to_string()),
            currency: std::env::var("GATEWAY_CURRENCY").unwrap_or_else(|_| "COP".to_string()),
            redirect_url: std::env::var("GATEWAY_REDIRECT_URL")
                .unwrap_or_else(|_| "http://localhost:3000/enrollment/result".to_string()),
            sandbox: std::env::var("GATEWAY_SANDBOX")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap_or(true),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub enabled: bool,
    pub host: String,
    pub username: String,
    pub password: String,
    pub from_name: String,
    pub from_email: String,
}

impl SmtpConfig {
    pub fn from_env() -> Self {
        Self {
            enabled: std::env::var("SMTP_ENABLED")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),
            host: std::env::var("SMTP_HOST").unwrap_or_else(|_| "localhost".to_string()),
            username: std::env::var("SMTP_USERNAME").unwrap_or_default(),
            password: std::env::var("SMTP_PASSWORD").unwrap_or_default(),
            from_name: std::env::var("SMTP_FROM_NAME")
                .unwrap_or_else(|_| "Academia Kairos".to_string()),
            from_email: std::env::var("SMTP_FROM_EMAIL")
                .unwrap_or_else(|_| "no-reply@kairos.edu.co".to_string()),
        }
    }
}

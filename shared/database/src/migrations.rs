use kairos_common::AppError;
use sqlx::PgPool;

pub struct MigrationRunner {
    pool: PgPool,
}

impl MigrationRunner {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn run_all_migrations(&self) -> Result<(), AppError> {
        tracing::info!("Starting database migrations...");

        let migrator = sqlx::migrate!("./migrations");
        migrator
            .run(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.into()))?;

        tracing::info!("All migrations completed successfully");
        Ok(())
    }

    /// Idempotent deployment-time bootstrap: creates the administrator
    /// account once. Re-running is a no-op.
    pub async fn seed_initial_data(&self) -> Result<(), AppError> {
        let admin_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)",
        )
        .bind("admin@kairos.edu.co")
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)?;

        if !admin_exists {
            let admin_password = kairos_auth::PasswordService::hash_password(
                &std::env::var("ADMIN_INITIAL_PASSWORD")
                    .unwrap_or_else(|_| "admin123!".to_string()),
            )?;

            sqlx::query(
                r#"
                INSERT INTO users (username, email, roles, hashed_password)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (email) DO NOTHING
                "#,
            )
            .bind("admin")
            .bind("admin@kairos.edu.co")
            .bind(vec!["administrador".to_string()])
            .bind(admin_password)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

            tracing::info!("Administrator account created");
        }

        Ok(())
    }
}

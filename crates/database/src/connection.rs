use crate::error::DbError;
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::env;
use std::time::Duration;

/// Pool settings handed over by the application's configuration layer.
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl ConnectOptions {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: 10,
            acquire_timeout: Duration::from_secs(5),
        }
    }

    /// Builds options from the `DATABASE_URL` environment variable, reading a
    /// `.env` file first when one is present.
    pub fn from_env() -> Result<Self, DbError> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_e| DbError::ConnectionConfigError("DATABASE_URL must be set.".to_string()))?;

        Ok(Self::new(database_url))
    }
}

/// Establishes a connection pool to the PostgreSQL database.
pub async fn connect(options: &ConnectOptions) -> Result<PgPool, DbError> {
    let pool = PgPoolOptions::new()
        .max_connections(options.max_connections)
        .acquire_timeout(options.acquire_timeout)
        .connect(&options.database_url)
        .await?;

    tracing::debug!(
        max_connections = options.max_connections,
        "Database connection pool established."
    );
    Ok(pool)
}

/// Applies the embedded migrations so the `customers` and `reservations`
/// tables exist before any repository runs.
pub async fn run_migrations(pool: &PgPool) -> Result<(), DbError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

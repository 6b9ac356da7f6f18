use sqlx::{postgres::PgPoolOptions, PgPool};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;

/// Errors raised at the store boundary
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Store call exceeded deadline of {0:?}")]
    Timeout(Duration),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Conflicting write: {0}")]
    Conflict(String),

    #[error("Row decode error: {0}")]
    Decode(String),

    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Run a store future under a deadline. Dropping the future on expiry
/// cancels the in-flight query and rolls back any open transaction.
pub async fn with_deadline<T, F>(timeout: Duration, fut: F) -> Result<T, StorageError>
where
    F: Future<Output = Result<T, StorageError>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(StorageError::Timeout(timeout)),
    }
}

/// Builds the Postgres pool backing the identity store
pub struct DatabaseManager;

impl DatabaseManager {
    /// Connect using DATABASE_URL and the configured pool limits
    pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, StorageError> {
        let base = std::env::var("DATABASE_URL")
            .map_err(|_| StorageError::ConfigMissing("DATABASE_URL"))?;
        Self::connect_url(&base, config).await
    }

    pub async fn connect_url(database_url: &str, config: &DatabaseConfig) -> Result<PgPool, StorageError> {
        let url = Self::validate_url(database_url)?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url.as_str())
            .await?;

        info!("Created database pool for: {}", Self::redacted(&url));
        Ok(pool)
    }

    /// Apply bundled schema migrations
    pub async fn migrate(pool: &PgPool) -> Result<(), StorageError> {
        sqlx::migrate!("./migrations").run(pool).await?;
        info!("Database migrations applied");
        Ok(())
    }

    fn validate_url(database_url: &str) -> Result<url::Url, StorageError> {
        let url = url::Url::parse(database_url).map_err(|_| StorageError::InvalidDatabaseUrl)?;
        match url.scheme() {
            "postgres" | "postgresql" => Ok(url),
            _ => Err(StorageError::InvalidDatabaseUrl),
        }
    }

    /// Connection string safe for logs (password stripped)
    fn redacted(url: &url::Url) -> String {
        let mut url = url.clone();
        if url.password().is_some() {
            let _ = url.set_password(Some("***"));
        }
        url.to_string()
    }
}

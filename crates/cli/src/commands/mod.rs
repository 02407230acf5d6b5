//! CLI command implementations.

pub mod migrate;
pub mod seed;
pub mod user;

use restcrud_api::config::ApiConfig;
use restcrud_api::db::{self, PgStore};
use thiserror::Error;

/// Errors shared by every command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("configuration error: {0}")]
    Config(#[from] restcrud_api::config::ConfigError),

    #[error("RESTCRUD_DATABASE_URL (or DATABASE_URL) is not set")]
    MissingDatabaseUrl,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Connect to the configured database.
///
/// # Errors
///
/// Returns `CommandError` if no database is configured or it is unreachable.
pub async fn connect() -> Result<PgStore, CommandError> {
    let config = ApiConfig::from_env()?;
    let database_url = config
        .database_url
        .as_ref()
        .ok_or(CommandError::MissingDatabaseUrl)?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(database_url, config.max_connections).await?;
    Ok(PgStore::new(pool))
}

//! Database migration command.
//!
//! Applies the embedded schema migrations from `crates/api/migrations/`
//! and creates the session table used by `tower-sessions`.

use restcrud_api::db::MIGRATOR;
use tower_sessions_sqlx_store::PostgresStore;

use super::connect;

/// Run all migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let store = connect().await?;

    tracing::info!("Running schema migrations...");
    MIGRATOR.run(store.pool()).await?;

    tracing::info!("Creating session table...");
    PostgresStore::new(store.pool().clone()).migrate().await?;

    tracing::info!("Migrations complete!");
    Ok(())
}

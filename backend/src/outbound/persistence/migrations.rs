//! Embedded schema migrations applied at startup.

use diesel::{Connection, PgConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::info;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Failure to bring the schema up to date.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MigrationError {
    #[error("failed to connect for migrations: {message}")]
    Connect { message: String },
    #[error("failed to apply migrations: {message}")]
    Apply { message: String },
}

/// Apply pending migrations over a dedicated synchronous connection.
///
/// Runs on the blocking thread pool; the async pool is not involved.
///
/// # Errors
///
/// Returns [`MigrationError`] when the database is unreachable or a
/// migration fails.
pub async fn run_pending_migrations(database_url: &str) -> Result<(), MigrationError> {
    let url = database_url.to_owned();
    tokio::task::spawn_blocking(move || {
        let mut conn = PgConnection::establish(&url).map_err(|err| MigrationError::Connect {
            message: err.to_string(),
        })?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|err| MigrationError::Apply {
                message: err.to_string(),
            })?;
        info!(count = applied.len(), "database migrations applied");
        Ok(())
    })
    .await
    .map_err(|err| MigrationError::Apply {
        message: err.to_string(),
    })?
}

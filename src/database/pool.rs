use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;
use tracing::info;

use crate::config::{ConfigError, DatabaseConfig};

/// SQLSTATE for a foreign key violation (e.g. review for an unknown product)
const FOREIGN_KEY_VIOLATION: &str = "23503";
/// SQLSTATE for a CHECK constraint violation (e.g. stars out of range)
const CHECK_VIOLATION: &str = "23514";
/// SQLSTATE for a NOT NULL violation
const NOT_NULL_VIOLATION: &str = "23502";

/// Errors from the data access layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Row shape did not match the record it was mapped into.
    #[error("Integrity error: {0}")]
    Integrity(String),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Sqlx(sqlx::Error),
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::ColumnNotFound(column) => {
                DatabaseError::Integrity(format!("expected column '{}' is missing", column))
            }
            sqlx::Error::ColumnDecode { index, source } => {
                DatabaseError::Integrity(format!("column {} could not be decoded: {}", index, source))
            }
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.into_owned());
                match code.as_deref() {
                    Some(FOREIGN_KEY_VIOLATION) => DatabaseError::Validation(format!(
                        "referenced record does not exist ({})",
                        db_err.constraint().unwrap_or("foreign key")
                    )),
                    Some(CHECK_VIOLATION) | Some(NOT_NULL_VIOLATION) => DatabaseError::Validation(format!(
                        "value violates constraint ({})",
                        db_err.constraint().unwrap_or("check")
                    )),
                    _ => DatabaseError::Sqlx(sqlx::Error::Database(db_err)),
                }
            }
            other => DatabaseError::Sqlx(other),
        }
    }
}

/// Open the connection pool described by `config`.
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
    let url = config.connection_url()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout())
        .connect(&url)
        .await
        .map_err(DatabaseError::Sqlx)?;

    info!(
        host = %config.host,
        database = %config.name,
        max_connections = config.max_connections,
        "Created database pool"
    );
    Ok(pool)
}

/// Apply the versioned SQL files under `./migrations`.
pub async fn run_migrations(pool: &PgPool) -> Result<(), DatabaseError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("Database migrations applied");
    Ok(())
}

//! Database-specific error types and conversions.

use greffe_core::error::GreffeError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Corrupt row: {0}")]
    Corrupt(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },
}

impl From<DbError> for GreffeError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => GreffeError::NotFound { entity, id },
            other => GreffeError::Database(other.to_string()),
        }
    }
}

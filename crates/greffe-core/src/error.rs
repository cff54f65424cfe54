//! Error taxonomy for the greffe system.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GreffeError {
    #[error("Unauthorized: {reason}")]
    Unauthorized { reason: String },

    #[error("Forbidden: {reason}")]
    Forbidden { reason: String },

    #[error("Not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type GreffeResult<T> = Result<T, GreffeError>;

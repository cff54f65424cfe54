//! Transfer service error types.

use greffe_core::error::GreffeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("you do not own this file")]
    NotOwner,

    #[error("only the sender may modify this transfer")]
    NotSender,

    #[error("you are not the recipient of this transfer")]
    NotRecipient,

    #[error("your role may not register new files")]
    RegistrationNotAllowed,

    #[error("transfer was already accepted")]
    AlreadyAccepted,

    #[error("transfer was already resolved")]
    AlreadyResolved,

    #[error("no recipient user or role was given")]
    NoRecipient,

    #[error("batch contains no processable items")]
    EmptyBatch,
}

impl From<TransferError> for GreffeError {
    fn from(err: TransferError) -> Self {
        match err {
            TransferError::NotOwner
            | TransferError::NotSender
            | TransferError::NotRecipient
            | TransferError::RegistrationNotAllowed => GreffeError::Forbidden {
                reason: err.to_string(),
            },
            TransferError::AlreadyAccepted | TransferError::AlreadyResolved => {
                GreffeError::Conflict {
                    message: err.to_string(),
                }
            }
            TransferError::NoRecipient | TransferError::EmptyBatch => {
                GreffeError::InvalidArgument {
                    message: err.to_string(),
                }
            }
        }
    }
}

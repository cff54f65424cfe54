//! Greffe Transfer — entity registration, the transfer state machine
//! (create, edit, cancel, accept, refuse, batches), ownership guards,
//! and the actor-scoped reporting views.

pub mod error;
pub mod guard;
pub mod service;
pub mod views;

pub use error::TransferError;
pub use service::{BatchCreateOutcome, BatchResolveOutcome, CreateBatchTransfer, TransferService};
pub use views::{CanTransfer, FileSource, FileView};

//! Greffe Core — domain models, error taxonomy, actor context, and
//! repository traits for the court file-transfer service.

pub mod context;
pub mod error;
pub mod models;
pub mod repository;

pub use context::{ActorContext, RoleName};
pub use error::{GreffeError, GreffeResult};

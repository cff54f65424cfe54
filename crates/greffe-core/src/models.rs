//! Domain models for the greffe transfer service.

pub mod entity;
pub mod transfer;
pub mod user;

//! User directory model.
//!
//! Authentication fields (password hash, session state) are owned by
//! an external collaborator; this service only needs identity and
//! role for routing transfers.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::context::RoleName;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub role: RoleName,
    pub created_at: NaiveDate,
}

impl User {
    /// Display name for presentation. Never used as a lookup key.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub first_name: String,
    pub last_name: String,
    pub role: RoleName,
}

/// Directory projection consumed by role fan-out and presentation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryUser {
    pub id: Uuid,
    pub display_name: String,
    pub role: RoleName,
}

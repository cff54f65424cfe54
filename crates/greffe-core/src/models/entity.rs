//! Entity domain model — a legal file or document under ownership
//! tracking.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EntityKind {
    Dossier,
    Document,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: Uuid,
    /// Human-assigned file number. Used as a lookup key but not
    /// guaranteed unique across time; lookups resolve the first match.
    pub number: String,
    pub subject: String,
    pub part_one: String,
    pub part_two: String,
    /// Free-text status label assigned by the registry.
    pub status: String,
    pub magistrate: String,
    pub kind: EntityKind,
    /// Exactly one owner at all times; reassigned only when a
    /// transfer is accepted.
    pub owner_id: Uuid,
    pub created_at: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterEntity {
    pub number: String,
    pub subject: String,
    pub part_one: String,
    pub part_two: String,
    pub status: String,
    pub magistrate: String,
    pub kind: EntityKind,
}

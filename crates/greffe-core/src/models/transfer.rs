//! Transfer domain model — a unit of ownership-movement intent.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::context::RoleName;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TransferStatus {
    Sent,
    Accepted,
    Refused,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transfer {
    pub id: Uuid,
    pub entity_id: Uuid,
    /// Sender; equals the entity's owner at creation time.
    pub from_user: Uuid,
    /// Explicit recipient. `None` with a role set means role-wide:
    /// any member of `to_role` may accept, and acceptance narrows
    /// the record to the accepting user.
    pub to_user: Option<Uuid>,
    pub to_role: Option<RoleName>,
    pub status: TransferStatus,
    pub content: String,
    pub date_sent: NaiveDate,
    /// Set when the transfer is accepted or refused.
    pub date_resolved: Option<NaiveDate>,
}

impl Transfer {
    /// A transfer is terminal once accepted or refused; only an edit
    /// by the sender can resurrect a refused one.
    pub fn is_resolved(&self) -> bool {
        self.status != TransferStatus::Sent
    }
}

/// Creation request for a single entity, addressed to a user and/or
/// a whole role.
#[derive(Debug, Clone)]
pub struct CreateTransfer {
    pub entity_number: String,
    pub to_user: Option<Uuid>,
    pub to_role: Option<RoleName>,
    pub content: Option<String>,
}

/// Row-level creation input produced by recipient resolution.
#[derive(Debug, Clone)]
pub struct NewTransfer {
    pub entity_id: Uuid,
    pub from_user: Uuid,
    pub to_user: Option<Uuid>,
    pub to_role: Option<RoleName>,
    pub content: String,
    pub date_sent: NaiveDate,
}

/// Partial update for a pending transfer. An absent `content` is
/// left unchanged. The recipient pair is replaced as a unit: when
/// either `to_user` or `to_role` is supplied, the pair overwrites
/// both stored fields, so re-routing a row to a different role also
/// clears a stale explicit recipient.
#[derive(Debug, Clone, Default)]
pub struct TransferPatch {
    pub to_user: Option<Uuid>,
    pub to_role: Option<RoleName>,
    pub content: Option<String>,
}

impl TransferPatch {
    pub fn is_empty(&self) -> bool {
        self.to_user.is_none() && self.to_role.is_none() && self.content.is_none()
    }

    /// True when the patch re-routes the transfer.
    pub fn changes_recipient(&self) -> bool {
        self.to_user.is_some() || self.to_role.is_some()
    }
}

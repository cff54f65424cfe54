//! Ownership/authorization guard.
//!
//! Pure checks invoked by every state-machine operation. The actor
//! identity arrives as an explicit [`ActorContext`]; there is no
//! session state here.

use greffe_core::ActorContext;
use greffe_core::models::entity::Entity;
use greffe_core::models::transfer::Transfer;

use crate::error::TransferError;

/// Roles allowed to register new entities: administration plus the
/// two designated office roles.
pub const ENTITY_REGISTRAR_ROLES: &[&str] = &["admin", "registry-office", "cashier"];

/// Entity registration is restricted to an allow-list of roles.
pub fn require_registrar(ctx: &ActorContext) -> Result<(), TransferError> {
    if ENTITY_REGISTRAR_ROLES.contains(&ctx.role.as_str()) {
        Ok(())
    } else {
        Err(TransferError::RegistrationNotAllowed)
    }
}

/// Only the current owner of an entity may send it.
pub fn require_entity_owner(ctx: &ActorContext, entity: &Entity) -> Result<(), TransferError> {
    if entity.owner_id == ctx.user_id {
        Ok(())
    } else {
        Err(TransferError::NotOwner)
    }
}

/// Only the original sender may edit or cancel a transfer.
pub fn require_sender(ctx: &ActorContext, transfer: &Transfer) -> Result<(), TransferError> {
    if transfer.from_user == ctx.user_id {
        Ok(())
    } else {
        Err(TransferError::NotSender)
    }
}

/// Accept is allowed for the explicit recipient, or for a role-wide
/// transfer with no recipient yet, for any actor whose role matches
/// the transfer's role.
///
/// Requiring the role match closes the gap where any caller could
/// claim an unassigned transfer.
pub fn check_accept(ctx: &ActorContext, transfer: &Transfer) -> Result<(), TransferError> {
    let authorized = match transfer.to_user {
        Some(recipient) => recipient == ctx.user_id,
        None => transfer.to_role.as_ref() == Some(&ctx.role),
    };
    if authorized {
        Ok(())
    } else {
        Err(TransferError::NotRecipient)
    }
}

/// Refuse is allowed only for the explicit recipient; a role-wide
/// transfer cannot be refused on behalf of the whole role.
pub fn check_refuse(ctx: &ActorContext, transfer: &Transfer) -> Result<(), TransferError> {
    if transfer.to_user == Some(ctx.user_id) {
        Ok(())
    } else {
        Err(TransferError::NotRecipient)
    }
}

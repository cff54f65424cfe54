//! Transfer state machine — creation (single, batch, role fan-out),
//! accept/refuse (single and batch), edit-while-pending, cancel, and
//! entity registration.
//!
//! Generic over the repository traits so the service has no
//! dependency on the database crate.

use chrono::{NaiveDate, Utc};
use greffe_core::error::{GreffeError, GreffeResult};
use greffe_core::models::entity::{Entity, RegisterEntity};
use greffe_core::models::transfer::{
    CreateTransfer, NewTransfer, Transfer, TransferPatch, TransferStatus,
};
use greffe_core::models::user::User;
use greffe_core::repository::{EntityRepository, TransferRepository, UserDirectory};
use greffe_core::{ActorContext, RoleName};
use tracing::info;
use uuid::Uuid;

use crate::error::TransferError;
use crate::guard;

/// Outcome of a batch creation: rows written atomically, plus the
/// entity ids that were silently skipped (missing or not owned by
/// the sender).
#[derive(Debug)]
pub struct BatchCreateOutcome {
    pub created: Vec<Transfer>,
    pub skipped: Vec<Uuid>,
}

/// Outcome of a batch accept/refuse: per-item failures are reported,
/// not fatal.
#[derive(Debug)]
pub struct BatchResolveOutcome {
    pub processed: usize,
    pub errors: Vec<String>,
}

/// Creation request applied independently to several entities.
#[derive(Debug, Clone)]
pub struct CreateBatchTransfer {
    pub entity_ids: Vec<Uuid>,
    pub to_user: Option<Uuid>,
    pub to_role: Option<RoleName>,
    pub content: Option<String>,
}

/// The transfer state machine and its surrounding operations.
pub struct TransferService<E, T, U>
where
    E: EntityRepository,
    T: TransferRepository,
    U: UserDirectory,
{
    entities: E,
    transfers: T,
    directory: U,
}

impl<E, T, U> TransferService<E, T, U>
where
    E: EntityRepository,
    T: TransferRepository,
    U: UserDirectory,
{
    pub fn new(entities: E, transfers: T, directory: U) -> Self {
        Self {
            entities,
            transfers,
            directory,
        }
    }

    pub(crate) fn entities(&self) -> &E {
        &self.entities
    }

    pub(crate) fn transfers(&self) -> &T {
        &self.transfers
    }

    pub(crate) fn directory(&self) -> &U {
        &self.directory
    }

    fn today() -> NaiveDate {
        Utc::now().date_naive()
    }

    // -------------------------------------------------------------------
    // Entity registration boundary
    // -------------------------------------------------------------------

    /// Register a new entity owned by the calling actor. Restricted
    /// to the registrar role allow-list.
    pub async fn register_entity(
        &self,
        ctx: &ActorContext,
        input: RegisterEntity,
    ) -> GreffeResult<Entity> {
        guard::require_registrar(ctx)?;

        // The session may outlive the account; re-check the directory.
        self.directory
            .get_by_id(ctx.user_id)
            .await
            .map_err(|_| GreffeError::Unauthorized {
                reason: "actor is not in the user directory".into(),
            })?;

        let entity = self
            .entities
            .create(input, ctx.user_id, Self::today())
            .await?;

        info!(entity = %entity.id, number = %entity.number, owner = %ctx.user_id, "Entity registered");
        Ok(entity)
    }

    // -------------------------------------------------------------------
    // Creation (single + batch + role fan-out)
    // -------------------------------------------------------------------

    /// Create one or more transfer rows for a single entity: one for
    /// the explicit recipient (if any) and one per member of the
    /// recipient role, deduplicated by user id. All rows are written
    /// atomically.
    pub async fn create_transfer(
        &self,
        ctx: &ActorContext,
        input: CreateTransfer,
    ) -> GreffeResult<Vec<Transfer>> {
        if input.to_user.is_none() && input.to_role.is_none() {
            return Err(TransferError::NoRecipient.into());
        }

        let entity = self.entities.get_by_number(&input.entity_number).await?;
        guard::require_entity_owner(ctx, &entity)?;

        let members = match &input.to_role {
            Some(role) => self.directory.members_of(role).await?,
            None => Vec::new(),
        };

        let content = input
            .content
            .unwrap_or_else(|| default_content(&entity.number));

        let batch = expand_recipients(
            &entity,
            ctx.user_id,
            input.to_user,
            input.to_role.as_ref(),
            &members,
            &content,
            Self::today(),
        );

        if batch.is_empty() {
            // Role expansion yielded nobody and no explicit user was given.
            return Err(TransferError::NoRecipient.into());
        }

        let created = self.transfers.create_many(batch).await?;
        info!(
            entity = %entity.id,
            sender = %ctx.user_id,
            count = created.len(),
            "Transfer(s) created"
        );
        Ok(created)
    }

    /// Apply the same recipient specification independently to each
    /// entity id. Missing or un-owned entities are skipped, not
    /// errors; the resulting rows are written in one atomic commit.
    pub async fn create_batch(
        &self,
        ctx: &ActorContext,
        input: CreateBatchTransfer,
    ) -> GreffeResult<BatchCreateOutcome> {
        if input.to_user.is_none() && input.to_role.is_none() {
            return Err(TransferError::NoRecipient.into());
        }

        let members = match &input.to_role {
            Some(role) => self.directory.members_of(role).await?,
            None => Vec::new(),
        };

        let today = Self::today();
        let mut batch = Vec::new();
        let mut skipped = Vec::new();

        for entity_id in input.entity_ids {
            let entity = match self.entities.get_by_id(entity_id).await {
                Ok(entity) => entity,
                Err(GreffeError::NotFound { .. }) => {
                    skipped.push(entity_id);
                    continue;
                }
                Err(e) => return Err(e),
            };
            if guard::require_entity_owner(ctx, &entity).is_err() {
                skipped.push(entity_id);
                continue;
            }

            let content = input
                .content
                .clone()
                .unwrap_or_else(|| default_content(&entity.number));

            batch.extend(expand_recipients(
                &entity,
                ctx.user_id,
                input.to_user,
                input.to_role.as_ref(),
                &members,
                &content,
                today,
            ));
        }

        if batch.is_empty() {
            return Err(TransferError::EmptyBatch.into());
        }

        let created = self.transfers.create_many(batch).await?;
        info!(
            sender = %ctx.user_id,
            created = created.len(),
            skipped = skipped.len(),
            "Batch transfer created"
        );
        Ok(BatchCreateOutcome { created, skipped })
    }

    // -------------------------------------------------------------------
    // Edit / cancel (sender side)
    // -------------------------------------------------------------------

    /// Partially update a pending transfer. Any edit re-sends: the
    /// status resets to `Sent` and the sent date is refreshed, which
    /// is the only way a refused transfer comes back to life.
    pub async fn edit_transfer(
        &self,
        ctx: &ActorContext,
        transfer_id: Uuid,
        patch: TransferPatch,
    ) -> GreffeResult<Transfer> {
        let transfer = self.transfers.get_by_id(transfer_id).await?;
        guard::require_sender(ctx, &transfer)?;
        if transfer.status == TransferStatus::Accepted {
            return Err(TransferError::AlreadyAccepted.into());
        }

        match self
            .transfers
            .update(transfer_id, patch, Self::today())
            .await?
        {
            Some(updated) => {
                info!(transfer = %transfer_id, sender = %ctx.user_id, "Transfer edited and re-sent");
                Ok(updated)
            }
            // Lost a race against an accept.
            None => Err(TransferError::AlreadyAccepted.into()),
        }
    }

    /// Cancel (hard-delete) a pending transfer.
    pub async fn cancel_transfer(&self, ctx: &ActorContext, transfer_id: Uuid) -> GreffeResult<()> {
        let transfer = self.transfers.get_by_id(transfer_id).await?;
        guard::require_sender(ctx, &transfer)?;
        if transfer.status == TransferStatus::Accepted {
            return Err(TransferError::AlreadyAccepted.into());
        }

        self.transfers.delete(transfer_id).await?;
        info!(transfer = %transfer_id, sender = %ctx.user_id, "Transfer cancelled");
        Ok(())
    }

    // -------------------------------------------------------------------
    // Accept / refuse (recipient side)
    // -------------------------------------------------------------------

    /// Accept a transfer: the ledger entry closes and the entity's
    /// ownership moves to the actor, atomically.
    pub async fn accept_transfer(&self, ctx: &ActorContext, transfer_id: Uuid) -> GreffeResult<()> {
        let transfer = self.transfers.get_by_id(transfer_id).await?;
        if transfer.is_resolved() {
            return Err(TransferError::AlreadyResolved.into());
        }
        guard::check_accept(ctx, &transfer)?;

        match self
            .transfers
            .accept(transfer_id, transfer.entity_id, ctx.user_id, Self::today())
            .await?
        {
            Some(_) => {
                info!(
                    transfer = %transfer_id,
                    entity = %transfer.entity_id,
                    new_owner = %ctx.user_id,
                    "Transfer accepted, ownership moved"
                );
                Ok(())
            }
            None => Err(TransferError::AlreadyResolved.into()),
        }
    }

    /// Refuse a transfer. No ownership change; the resolution date is
    /// still recorded.
    pub async fn refuse_transfer(&self, ctx: &ActorContext, transfer_id: Uuid) -> GreffeResult<()> {
        let transfer = self.transfers.get_by_id(transfer_id).await?;
        if transfer.is_resolved() {
            return Err(TransferError::AlreadyResolved.into());
        }
        guard::check_refuse(ctx, &transfer)?;

        match self.transfers.refuse(transfer_id, Self::today()).await? {
            Some(_) => {
                info!(transfer = %transfer_id, actor = %ctx.user_id, "Transfer refused");
                Ok(())
            }
            None => Err(TransferError::AlreadyResolved.into()),
        }
    }

    /// Accept several transfers; per-item failures (unauthorized,
    /// already resolved, missing) are collected, not fatal.
    pub async fn accept_batch(
        &self,
        ctx: &ActorContext,
        transfer_ids: Vec<Uuid>,
    ) -> GreffeResult<BatchResolveOutcome> {
        if transfer_ids.is_empty() {
            return Err(TransferError::EmptyBatch.into());
        }

        let mut outcome = BatchResolveOutcome {
            processed: 0,
            errors: Vec::new(),
        };
        for transfer_id in transfer_ids {
            match self.accept_transfer(ctx, transfer_id).await {
                Ok(()) => outcome.processed += 1,
                Err(e) => outcome.errors.push(format!("transfer {transfer_id}: {e}")),
            }
        }
        Ok(outcome)
    }

    /// Refuse several transfers with the same degraded-success model
    /// as [`accept_batch`](Self::accept_batch).
    pub async fn refuse_batch(
        &self,
        ctx: &ActorContext,
        transfer_ids: Vec<Uuid>,
    ) -> GreffeResult<BatchResolveOutcome> {
        if transfer_ids.is_empty() {
            return Err(TransferError::EmptyBatch.into());
        }

        let mut outcome = BatchResolveOutcome {
            processed: 0,
            errors: Vec::new(),
        };
        for transfer_id in transfer_ids {
            match self.refuse_transfer(ctx, transfer_id).await {
                Ok(()) => outcome.processed += 1,
                Err(e) => outcome.errors.push(format!("transfer {transfer_id}: {e}")),
            }
        }
        Ok(outcome)
    }
}

fn default_content(entity_number: &str) -> String {
    format!("File {entity_number} forwarded")
}

/// Resolve the recipient specification for one entity into concrete
/// ledger rows: the explicit user (if any) plus every member of the
/// role who was not already added, deduplicated by user id.
fn expand_recipients(
    entity: &Entity,
    sender: Uuid,
    to_user: Option<Uuid>,
    to_role: Option<&RoleName>,
    members: &[User],
    content: &str,
    date_sent: NaiveDate,
) -> Vec<NewTransfer> {
    let mut added = std::collections::HashSet::new();
    let mut rows = Vec::new();

    if let Some(user_id) = to_user {
        rows.push(NewTransfer {
            entity_id: entity.id,
            from_user: sender,
            to_user: Some(user_id),
            to_role: to_role.cloned(),
            content: content.to_string(),
            date_sent,
        });
        added.insert(user_id);
    }

    if let Some(role) = to_role {
        for member in members {
            if !added.insert(member.id) {
                continue;
            }
            rows.push(NewTransfer {
                entity_id: entity.id,
                from_user: sender,
                to_user: Some(member.id),
                to_role: Some(role.clone()),
                content: content.to_string(),
                date_sent,
            });
        }
    }

    rows
}

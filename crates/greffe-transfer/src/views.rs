//! Query/reporting views over the entity store and transfer ledger.
//!
//! Every view is scoped to the calling actor: a user sees what they
//! own, what they sent, and what is addressed to them — never a
//! global listing.

use std::collections::HashSet;

use chrono::NaiveDate;
use greffe_core::ActorContext;
use greffe_core::error::{GreffeError, GreffeResult};
use greffe_core::models::entity::{Entity, EntityKind};
use greffe_core::models::transfer::Transfer;
use greffe_core::repository::{
    EntityRepository, PaginatedResult, Pagination, TransferRepository, UserDirectory,
};
use serde::Serialize;
use uuid::Uuid;

use crate::service::TransferService;

/// Which relation put a row into the unified view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FileSource {
    /// Held by the actor with no pending transfer against it.
    Owned,
    /// Sent by the actor, not yet accepted.
    Sent,
    /// Addressed to the actor (directly or via role), still pending.
    Received,
}

/// Flattened entity/transfer row for presentation.
#[derive(Debug, Clone, Serialize)]
pub struct FileView {
    /// Entity id for `Owned` rows, transfer id otherwise.
    pub id: Uuid,
    pub number: String,
    pub subject: String,
    pub part_one: String,
    pub part_two: String,
    pub status: String,
    pub magistrate: String,
    pub kind: EntityKind,
    /// Registration date for `Owned` rows, sent date for pending
    /// rows, resolution date for completed rows.
    pub date: NaiveDate,
    pub source: FileSource,
    /// Counterparty label: recipient for `Sent`, sender for
    /// `Received`. Empty for `Owned`.
    pub from_or_to: Option<String>,
}

/// Answer to "may this entity be sent right now?".
#[derive(Debug, Clone, Serialize)]
pub struct CanTransfer {
    pub allowed: bool,
    pub reason: &'static str,
}

impl CanTransfer {
    fn ok() -> Self {
        Self {
            allowed: true,
            reason: "ok",
        }
    }

    fn denied(reason: &'static str) -> Self {
        Self {
            allowed: false,
            reason,
        }
    }
}

impl<E, T, U> TransferService<E, T, U>
where
    E: EntityRepository,
    T: TransferRepository,
    U: UserDirectory,
{
    /// Entities the actor owns that have no pending transfer against
    /// them — the set eligible for sending.
    pub async fn owned_unsent(&self, ctx: &ActorContext) -> GreffeResult<Vec<Entity>> {
        let owned = self.entities().list_by_owner(ctx.user_id).await?;
        let pending: HashSet<Uuid> = self
            .transfers()
            .entities_with_pending()
            .await?
            .into_iter()
            .collect();
        Ok(owned
            .into_iter()
            .filter(|e| !pending.contains(&e.id))
            .collect())
    }

    /// Transfers the actor sent that the recipient has not accepted,
    /// refused rows included so the sender can see them and re-send.
    pub async fn sent_pending(&self, ctx: &ActorContext) -> GreffeResult<Vec<FileView>> {
        let transfers = self.transfers().list_outgoing(ctx.user_id).await?;
        self.project(transfers, FileSource::Sent).await
    }

    /// Pending transfers addressed to the actor, either directly or
    /// to their role.
    pub async fn received_pending(&self, ctx: &ActorContext) -> GreffeResult<Vec<FileView>> {
        let transfers = self
            .transfers()
            .list_incoming(ctx.user_id, &ctx.role)
            .await?;
        self.project(transfers, FileSource::Received).await
    }

    /// Accepted transfers the actor took part in, newest resolution
    /// first, paginated.
    pub async fn completed(
        &self,
        ctx: &ActorContext,
        pagination: Pagination,
    ) -> GreffeResult<PaginatedResult<FileView>> {
        let page = self
            .transfers()
            .list_accepted(ctx.user_id, &ctx.role, pagination)
            .await?;

        let mut items = Vec::with_capacity(page.items.len());
        for transfer in &page.items {
            let source = if transfer.from_user == ctx.user_id {
                FileSource::Sent
            } else {
                FileSource::Received
            };
            items.push(self.row_for(transfer, source, true).await?);
        }
        Ok(PaginatedResult {
            items,
            total: page.total,
            offset: page.offset,
            limit: page.limit,
        })
    }

    /// Unified "reunion" view: everything the actor holds or has in
    /// flight, merged and ordered by date descending. Rows keep their
    /// source tag so the caller can render each group distinctly.
    /// Unlike [`sent_pending`](Self::sent_pending), refused outgoing
    /// rows are excluded here.
    pub async fn reunion(&self, ctx: &ActorContext) -> GreffeResult<Vec<FileView>> {
        let mut rows = Vec::new();
        for entity in self.owned_unsent(ctx).await? {
            rows.push(owned_row(&entity));
        }
        let sent = self.transfers().list_sent_by(ctx.user_id).await?;
        rows.extend(self.project(sent, FileSource::Sent).await?);
        rows.extend(self.received_pending(ctx).await?);

        // Stable sort keeps Owned/Sent/Received grouping for equal dates.
        rows.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(rows)
    }

    /// Precondition check used before offering a send action.
    pub async fn can_transfer(&self, ctx: &ActorContext, entity_id: Uuid) -> GreffeResult<CanTransfer> {
        let entity = match self.entities().get_by_id(entity_id).await {
            Ok(entity) => entity,
            Err(GreffeError::NotFound { .. }) => {
                return Ok(CanTransfer::denied("not-owned-or-missing"));
            }
            Err(e) => return Err(e),
        };
        if entity.owner_id != ctx.user_id {
            return Ok(CanTransfer::denied("not-owned-or-missing"));
        }

        let pending = self.transfers().entities_with_pending().await?;
        if pending.contains(&entity.id) {
            return Ok(CanTransfer::denied("already-sent"));
        }
        Ok(CanTransfer::ok())
    }

    async fn project(
        &self,
        transfers: Vec<Transfer>,
        source: FileSource,
    ) -> GreffeResult<Vec<FileView>> {
        let mut rows = Vec::with_capacity(transfers.len());
        for transfer in &transfers {
            rows.push(self.row_for(transfer, source, false).await?);
        }
        Ok(rows)
    }

    /// Build one presentation row, resolving the entity and the
    /// counterparty label. `resolved` selects `date_resolved` over
    /// `date_sent` for completed rows.
    async fn row_for(
        &self,
        transfer: &Transfer,
        source: FileSource,
        resolved: bool,
    ) -> GreffeResult<FileView> {
        let entity = self.entities().get_by_id(transfer.entity_id).await?;

        let counterparty_id = match source {
            FileSource::Sent => transfer.to_user,
            FileSource::Received => Some(transfer.from_user),
            FileSource::Owned => None,
        };
        let from_or_to = match counterparty_id {
            Some(user_id) => Some(self.counterparty_label(user_id, transfer).await?),
            // Role-wide row with no recipient yet: show the role.
            None => transfer.to_role.as_ref().map(|r| r.as_str().to_string()),
        };

        let date = if resolved {
            transfer.date_resolved.unwrap_or(transfer.date_sent)
        } else {
            transfer.date_sent
        };

        Ok(FileView {
            id: transfer.id,
            number: entity.number,
            subject: entity.subject,
            part_one: entity.part_one,
            part_two: entity.part_two,
            status: entity.status,
            magistrate: entity.magistrate,
            kind: entity.kind,
            date,
            source,
            from_or_to,
        })
    }

    /// Display name for a counterparty. A user deleted from the
    /// directory after the transfer falls back to the role label or
    /// the bare id rather than failing the whole view.
    async fn counterparty_label(&self, user_id: Uuid, transfer: &Transfer) -> GreffeResult<String> {
        match self.directory().get_by_id(user_id).await {
            Ok(user) => Ok(user.display_name()),
            Err(GreffeError::NotFound { .. }) => Ok(transfer
                .to_role
                .as_ref()
                .map(|r| r.as_str().to_string())
                .unwrap_or_else(|| user_id.to_string())),
            Err(e) => Err(e),
        }
    }
}

fn owned_row(entity: &Entity) -> FileView {
    FileView {
        id: entity.id,
        number: entity.number.clone(),
        subject: entity.subject.clone(),
        part_one: entity.part_one.clone(),
        part_two: entity.part_two.clone(),
        status: entity.status.clone(),
        magistrate: entity.magistrate.clone(),
        kind: entity.kind,
        date: entity.created_at,
        source: FileSource::Owned,
        from_or_to: None,
    }
}

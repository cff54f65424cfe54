//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. The transfer service is
//! generic over these traits, so it carries no database dependency.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::context::RoleName;
use crate::error::GreffeResult;
use crate::models::entity::{Entity, RegisterEntity};
use crate::models::transfer::{NewTransfer, Transfer, TransferPatch};
use crate::models::user::{CreateUser, DirectoryUser, User};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 20,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

// ---------------------------------------------------------------------------
// User directory
// ---------------------------------------------------------------------------

/// Read access to the user/role directory, plus creation for
/// provisioning. Authentication state lives elsewhere.
pub trait UserDirectory: Send + Sync {
    fn create(&self, input: CreateUser) -> impl Future<Output = GreffeResult<User>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = GreffeResult<User>> + Send;

    /// All users, optionally filtered by role, as directory tuples.
    fn list(
        &self,
        role: Option<&RoleName>,
    ) -> impl Future<Output = GreffeResult<Vec<DirectoryUser>>> + Send;

    /// Current members of a role — the fan-out population.
    fn members_of(&self, role: &RoleName) -> impl Future<Output = GreffeResult<Vec<User>>> + Send;

    /// All distinct role labels in use.
    fn distinct_roles(&self) -> impl Future<Output = GreffeResult<Vec<RoleName>>> + Send;
}

// ---------------------------------------------------------------------------
// Entity store
// ---------------------------------------------------------------------------

pub trait EntityRepository: Send + Sync {
    fn create(
        &self,
        input: RegisterEntity,
        owner_id: Uuid,
        created_at: NaiveDate,
    ) -> impl Future<Output = GreffeResult<Entity>> + Send;

    fn get_by_id(&self, id: Uuid) -> impl Future<Output = GreffeResult<Entity>> + Send;

    /// Resolve a human-assigned file number. Numbers are not
    /// guaranteed unique across time; the first match wins.
    fn get_by_number(&self, number: &str) -> impl Future<Output = GreffeResult<Entity>> + Send;

    /// Entities owned by a user, newest first.
    fn list_by_owner(&self, owner_id: Uuid)
    -> impl Future<Output = GreffeResult<Vec<Entity>>> + Send;
}

// ---------------------------------------------------------------------------
// Transfer ledger
// ---------------------------------------------------------------------------

/// Ledger of ownership-movement records.
///
/// Methods that mutate a transfer after creation carry a status guard
/// and return `Ok(None)` when the record was already resolved — the
/// caller decides whether that is a `Conflict` or a batch skip.
pub trait TransferRepository: Send + Sync {
    /// Persist a batch of rows in one atomic write — all or none.
    /// Used for role fan-out and batch creation.
    fn create_many(
        &self,
        batch: Vec<NewTransfer>,
    ) -> impl Future<Output = GreffeResult<Vec<Transfer>>> + Send;

    fn get_by_id(&self, id: Uuid) -> impl Future<Output = GreffeResult<Transfer>> + Send;

    /// Apply a partial update, reset status to `Sent`, and refresh
    /// `date_sent`. Guarded by `status != Accepted`. The recipient
    /// pair is replaced as a unit when either field is supplied.
    fn update(
        &self,
        id: Uuid,
        patch: TransferPatch,
        date_sent: NaiveDate,
    ) -> impl Future<Output = GreffeResult<Option<Transfer>>> + Send;

    /// Hard delete (cancellation).
    fn delete(&self, id: Uuid) -> impl Future<Output = GreffeResult<()>> + Send;

    /// Accept: set status/date_resolved, narrow `to_user` to the
    /// actor, and reassign the entity's owner — all in one
    /// transaction, guarded by `status = Sent`.
    fn accept(
        &self,
        id: Uuid,
        entity_id: Uuid,
        actor_id: Uuid,
        resolved_on: NaiveDate,
    ) -> impl Future<Output = GreffeResult<Option<Transfer>>> + Send;

    /// Refuse: set status/date_resolved, no ownership change.
    /// Guarded by `status = Sent`.
    fn refuse(
        &self,
        id: Uuid,
        resolved_on: NaiveDate,
    ) -> impl Future<Output = GreffeResult<Option<Transfer>>> + Send;

    /// Transfers sent by a user that are still relevant to the
    /// sender (`status != Accepted`), newest first.
    fn list_outgoing(
        &self,
        sender: Uuid,
    ) -> impl Future<Output = GreffeResult<Vec<Transfer>>> + Send;

    /// Transfers sent by a user that are still pending
    /// (`status = Sent`), newest first.
    fn list_sent_by(
        &self,
        sender: Uuid,
    ) -> impl Future<Output = GreffeResult<Vec<Transfer>>> + Send;

    /// Pending transfers addressed to a user or their role,
    /// newest first.
    fn list_incoming(
        &self,
        user_id: Uuid,
        role: &RoleName,
    ) -> impl Future<Output = GreffeResult<Vec<Transfer>>> + Send;

    /// Accepted transfers related to a user as sender, recipient, or
    /// role match, ordered by `date_resolved` descending.
    fn list_accepted(
        &self,
        user_id: Uuid,
        role: &RoleName,
        pagination: Pagination,
    ) -> impl Future<Output = GreffeResult<PaginatedResult<Transfer>>> + Send;

    /// Ids of entities that currently have a transfer in `Sent`
    /// status against them.
    fn entities_with_pending(&self) -> impl Future<Output = GreffeResult<Vec<Uuid>>> + Send;
}

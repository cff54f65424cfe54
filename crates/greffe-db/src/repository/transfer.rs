//! SurrealDB implementation of [`TransferRepository`].
//!
//! Multi-row creation and the accept path run inside explicit
//! SurrealDB transactions so that fan-out writes are all-or-nothing
//! and ownership never drifts from transfer status.

use chrono::NaiveDate;
use greffe_core::RoleName;
use greffe_core::error::GreffeResult;
use greffe_core::models::transfer::{NewTransfer, Transfer, TransferPatch, TransferStatus};
use greffe_core::repository::{PaginatedResult, Pagination, TransferRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

use super::{date_to_string, parse_date, parse_uuid};

/// Sentinel thrown inside the accept transaction when the status
/// guard finds the transfer already resolved.
const ALREADY_RESOLVED: &str = "transfer-already-resolved";

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct TransferRow {
    entity_id: String,
    from_user: String,
    to_user: Option<String>,
    to_role: Option<String>,
    status: String,
    content: String,
    date_sent: String,
    date_resolved: Option<String>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct TransferRowWithId {
    record_id: String,
    entity_id: String,
    from_user: String,
    to_user: Option<String>,
    to_role: Option<String>,
    status: String,
    content: String,
    date_sent: String,
    date_resolved: Option<String>,
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

fn parse_status(s: &str) -> Result<TransferStatus, DbError> {
    match s {
        "Sent" => Ok(TransferStatus::Sent),
        "Accepted" => Ok(TransferStatus::Accepted),
        "Refused" => Ok(TransferStatus::Refused),
        other => Err(DbError::Corrupt(format!("unknown transfer status: {other}"))),
    }
}

impl TransferRow {
    fn into_transfer(self, id: Uuid) -> Result<Transfer, DbError> {
        Ok(Transfer {
            id,
            entity_id: parse_uuid(&self.entity_id, "entity")?,
            from_user: parse_uuid(&self.from_user, "sender")?,
            to_user: self
                .to_user
                .as_deref()
                .map(|s| parse_uuid(s, "recipient"))
                .transpose()?,
            to_role: self.to_role.as_deref().map(RoleName::new),
            status: parse_status(&self.status)?,
            content: self.content,
            date_sent: parse_date(&self.date_sent)?,
            date_resolved: self.date_resolved.as_deref().map(parse_date).transpose()?,
        })
    }
}

impl TransferRowWithId {
    fn try_into_transfer(self) -> Result<Transfer, DbError> {
        let id = parse_uuid(&self.record_id, "transfer")?;
        let row = TransferRow {
            entity_id: self.entity_id,
            from_user: self.from_user,
            to_user: self.to_user,
            to_role: self.to_role,
            status: self.status,
            content: self.content,
            date_sent: self.date_sent,
            date_resolved: self.date_resolved,
        };
        row.into_transfer(id)
    }
}

/// SurrealDB implementation of the transfer ledger.
#[derive(Clone)]
pub struct SurrealTransferRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealTransferRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> TransferRepository for SurrealTransferRepository<C> {
    async fn create_many(&self, batch: Vec<NewTransfer>) -> GreffeResult<Vec<Transfer>> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }

        // One CREATE statement per row inside a single transaction.
        let mut sql = String::from("BEGIN TRANSACTION;\n");
        for i in 0..batch.len() {
            sql.push_str(&format!(
                "CREATE type::record('transfer', $id_{i}) SET \
                 entity_id = $entity_{i}, \
                 from_user = $from_{i}, \
                 to_user = $to_user_{i}, \
                 to_role = $to_role_{i}, \
                 status = 'Sent', \
                 content = $content_{i}, \
                 date_sent = $date_{i}, \
                 date_resolved = NONE;\n",
            ));
        }
        sql.push_str("COMMIT TRANSACTION;");

        let ids: Vec<Uuid> = batch.iter().map(|_| Uuid::new_v4()).collect();

        let mut builder = self.db.query(&sql);
        for (i, (row, id)) in batch.iter().zip(&ids).enumerate() {
            builder = builder
                .bind((format!("id_{i}"), id.to_string()))
                .bind((format!("entity_{i}"), row.entity_id.to_string()))
                .bind((format!("from_{i}"), row.from_user.to_string()))
                .bind((
                    format!("to_user_{i}"),
                    row.to_user.map(|u| u.to_string()),
                ))
                .bind((
                    format!("to_role_{i}"),
                    row.to_role.as_ref().map(|r| r.as_str().to_string()),
                ))
                .bind((format!("content_{i}"), row.content.clone()))
                .bind((format!("date_{i}"), date_to_string(row.date_sent)));
        }

        let result = builder.await.map_err(DbError::from)?;
        result.check().map_err(DbError::from)?;

        // The commit succeeded, so the persisted rows are exactly the
        // inputs; no need to re-read them.
        Ok(batch
            .into_iter()
            .zip(ids)
            .map(|(row, id)| Transfer {
                id,
                entity_id: row.entity_id,
                from_user: row.from_user,
                to_user: row.to_user,
                to_role: row.to_role,
                status: TransferStatus::Sent,
                content: row.content,
                date_sent: row.date_sent,
                date_resolved: None,
            })
            .collect())
    }

    async fn get_by_id(&self, id: Uuid) -> GreffeResult<Transfer> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('transfer', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TransferRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "transfer".into(),
            id: id_str,
        })?;

        Ok(row.into_transfer(id)?)
    }

    async fn update(
        &self,
        id: Uuid,
        patch: TransferPatch,
        date_sent: NaiveDate,
    ) -> GreffeResult<Option<Transfer>> {
        // Editing always re-sends: status resets and the sent date is
        // refreshed even when no recipient field changed. The
        // recipient pair is written as a unit so re-routing clears a
        // stale explicit recipient.
        let mut sets = vec!["status = 'Sent'", "date_sent = $date_sent"];
        if patch.changes_recipient() {
            sets.push("to_user = $to_user");
            sets.push("to_role = $to_role");
        }
        if patch.content.is_some() {
            sets.push("content = $content");
        }

        let query = format!(
            "UPDATE type::record('transfer', $id) SET {} \
             WHERE status != 'Accepted' RETURN AFTER",
            sets.join(", ")
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("id", id.to_string()))
            .bind(("date_sent", date_to_string(date_sent)));

        if patch.changes_recipient() {
            builder = builder
                .bind(("to_user", patch.to_user.map(|u| u.to_string())))
                .bind((
                    "to_role",
                    patch.to_role.as_ref().map(|r| r.as_str().to_string()),
                ));
        }
        if let Some(content) = patch.content {
            builder = builder.bind(("content", content));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<TransferRow> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.into_transfer(id)?)),
            None => Ok(None),
        }
    }

    async fn delete(&self, id: Uuid) -> GreffeResult<()> {
        self.db
            .query("DELETE type::record('transfer', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn accept(
        &self,
        id: Uuid,
        entity_id: Uuid,
        actor_id: Uuid,
        resolved_on: NaiveDate,
    ) -> GreffeResult<Option<Transfer>> {
        // Transfer status and entity ownership move together or not
        // at all. The THROW aborts the transaction when a racing
        // accept (or refuse) resolved the transfer first.
        let result = self
            .db
            .query(format!(
                "BEGIN TRANSACTION;\n\
                 LET $updated = (UPDATE type::record('transfer', $id) SET \
                 status = 'Accepted', \
                 date_resolved = $resolved, \
                 to_user = $actor \
                 WHERE status = 'Sent' RETURN AFTER);\n\
                 IF array::len($updated) = 0 {{ THROW '{ALREADY_RESOLVED}' }};\n\
                 UPDATE type::record('entity', $entity_id) SET owner_id = $actor;\n\
                 COMMIT TRANSACTION;"
            ))
            .bind(("id", id.to_string()))
            .bind(("entity_id", entity_id.to_string()))
            .bind(("actor", actor_id.to_string()))
            .bind(("resolved", date_to_string(resolved_on)))
            .await
            .map_err(DbError::from)?;

        match result.check() {
            Ok(_) => {}
            Err(e) if e.to_string().contains(ALREADY_RESOLVED) => return Ok(None),
            Err(e) => return Err(DbError::from(e).into()),
        }

        Ok(Some(self.get_by_id(id).await?))
    }

    async fn refuse(&self, id: Uuid, resolved_on: NaiveDate) -> GreffeResult<Option<Transfer>> {
        let result = self
            .db
            .query(
                "UPDATE type::record('transfer', $id) SET \
                 status = 'Refused', \
                 date_resolved = $resolved \
                 WHERE status = 'Sent' RETURN AFTER",
            )
            .bind(("id", id.to_string()))
            .bind(("resolved", date_to_string(resolved_on)))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<TransferRow> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.into_transfer(id)?)),
            None => Ok(None),
        }
    }

    async fn list_outgoing(&self, sender: Uuid) -> GreffeResult<Vec<Transfer>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM transfer \
                 WHERE from_user = $sender AND status != 'Accepted' \
                 ORDER BY date_sent DESC",
            )
            .bind(("sender", sender.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TransferRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .map(|row| row.try_into_transfer())
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn list_sent_by(&self, sender: Uuid) -> GreffeResult<Vec<Transfer>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM transfer \
                 WHERE from_user = $sender AND status = 'Sent' \
                 ORDER BY date_sent DESC",
            )
            .bind(("sender", sender.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TransferRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .map(|row| row.try_into_transfer())
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn list_incoming(&self, user_id: Uuid, role: &RoleName) -> GreffeResult<Vec<Transfer>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM transfer \
                 WHERE status = 'Sent' \
                 AND (to_user = $user_id OR to_role = $role) \
                 ORDER BY date_sent DESC",
            )
            .bind(("user_id", user_id.to_string()))
            .bind(("role", role.as_str().to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TransferRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .map(|row| row.try_into_transfer())
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn list_accepted(
        &self,
        user_id: Uuid,
        role: &RoleName,
        pagination: Pagination,
    ) -> GreffeResult<PaginatedResult<Transfer>> {
        let user_str = user_id.to_string();
        let role_str = role.as_str().to_string();

        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM transfer \
                 WHERE status = 'Accepted' \
                 AND (from_user = $user_id OR to_user = $user_id \
                 OR to_role = $role) GROUP ALL",
            )
            .bind(("user_id", user_str.clone()))
            .bind(("role", role_str.clone()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM transfer \
                 WHERE status = 'Accepted' \
                 AND (from_user = $user_id OR to_user = $user_id \
                 OR to_role = $role) \
                 ORDER BY date_resolved DESC \
                 LIMIT $limit START $offset",
            )
            .bind(("user_id", user_str))
            .bind(("role", role_str))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TransferRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_transfer())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn entities_with_pending(&self) -> GreffeResult<Vec<Uuid>> {
        let mut result = self
            .db
            .query("SELECT VALUE entity_id FROM transfer WHERE status = 'Sent'")
            .await
            .map_err(DbError::from)?;

        let ids: Vec<String> = result.take(0).map_err(DbError::from)?;

        let mut seen = std::collections::HashSet::new();
        let mut entities = Vec::new();
        for id in ids {
            let id = parse_uuid(&id, "entity")?;
            if seen.insert(id) {
                entities.push(id);
            }
        }
        Ok(entities)
    }
}

//! SurrealDB implementation of [`EntityRepository`].

use chrono::NaiveDate;
use greffe_core::error::GreffeResult;
use greffe_core::models::entity::{Entity, EntityKind, RegisterEntity};
use greffe_core::repository::EntityRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

use super::{date_to_string, parse_date, parse_uuid};

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct EntityRow {
    number: String,
    subject: String,
    part_one: String,
    part_two: String,
    status: String,
    magistrate: String,
    kind: String,
    owner_id: String,
    created_at: String,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct EntityRowWithId {
    record_id: String,
    number: String,
    subject: String,
    part_one: String,
    part_two: String,
    status: String,
    magistrate: String,
    kind: String,
    owner_id: String,
    created_at: String,
}

fn parse_kind(s: &str) -> Result<EntityKind, DbError> {
    match s {
        "Dossier" => Ok(EntityKind::Dossier),
        "Document" => Ok(EntityKind::Document),
        other => Err(DbError::Corrupt(format!("unknown entity kind: {other}"))),
    }
}

fn kind_to_string(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Dossier => "Dossier",
        EntityKind::Document => "Document",
    }
}

impl EntityRow {
    fn into_entity(self, id: Uuid) -> Result<Entity, DbError> {
        Ok(Entity {
            id,
            number: self.number,
            subject: self.subject,
            part_one: self.part_one,
            part_two: self.part_two,
            status: self.status,
            magistrate: self.magistrate,
            kind: parse_kind(&self.kind)?,
            owner_id: parse_uuid(&self.owner_id, "owner")?,
            created_at: parse_date(&self.created_at)?,
        })
    }
}

impl EntityRowWithId {
    fn try_into_entity(self) -> Result<Entity, DbError> {
        let id = parse_uuid(&self.record_id, "entity")?;
        Ok(Entity {
            id,
            number: self.number,
            subject: self.subject,
            part_one: self.part_one,
            part_two: self.part_two,
            status: self.status,
            magistrate: self.magistrate,
            kind: parse_kind(&self.kind)?,
            owner_id: parse_uuid(&self.owner_id, "owner")?,
            created_at: parse_date(&self.created_at)?,
        })
    }
}

/// SurrealDB implementation of the entity store.
#[derive(Clone)]
pub struct SurrealEntityRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealEntityRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> EntityRepository for SurrealEntityRepository<C> {
    async fn create(
        &self,
        input: RegisterEntity,
        owner_id: Uuid,
        created_at: NaiveDate,
    ) -> GreffeResult<Entity> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('entity', $id) SET \
                 number = $number, \
                 subject = $subject, \
                 part_one = $part_one, \
                 part_two = $part_two, \
                 status = $status, \
                 magistrate = $magistrate, \
                 kind = $kind, \
                 owner_id = $owner_id, \
                 created_at = $created_at",
            )
            .bind(("id", id_str.clone()))
            .bind(("number", input.number))
            .bind(("subject", input.subject))
            .bind(("part_one", input.part_one))
            .bind(("part_two", input.part_two))
            .bind(("status", input.status))
            .bind(("magistrate", input.magistrate))
            .bind(("kind", kind_to_string(input.kind).to_string()))
            .bind(("owner_id", owner_id.to_string()))
            .bind(("created_at", date_to_string(created_at)))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<EntityRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "entity".into(),
            id: id_str,
        })?;

        Ok(row.into_entity(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> GreffeResult<Entity> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('entity', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<EntityRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "entity".into(),
            id: id_str,
        })?;

        Ok(row.into_entity(id)?)
    }

    async fn get_by_number(&self, number: &str) -> GreffeResult<Entity> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM entity \
                 WHERE number = $number",
            )
            .bind(("number", number.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<EntityRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "entity".into(),
            id: format!("number={number}"),
        })?;

        Ok(row.try_into_entity()?)
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> GreffeResult<Vec<Entity>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM entity \
                 WHERE owner_id = $owner_id \
                 ORDER BY created_at DESC",
            )
            .bind(("owner_id", owner_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<EntityRowWithId> = result.take(0).map_err(DbError::from)?;

        Ok(rows
            .into_iter()
            .map(|row| row.try_into_entity())
            .collect::<Result<Vec<_>, DbError>>()?)
    }
}

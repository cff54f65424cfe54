//! SurrealDB implementation of [`UserDirectory`].

use chrono::Utc;
use greffe_core::RoleName;
use greffe_core::error::GreffeResult;
use greffe_core::models::user::{CreateUser, DirectoryUser, User};
use greffe_core::repository::UserDirectory;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

use super::{date_to_string, parse_date, parse_uuid};

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct UserRow {
    first_name: String,
    last_name: String,
    role: String,
    created_at: String,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct UserRowWithId {
    record_id: String,
    first_name: String,
    last_name: String,
    role: String,
    created_at: String,
}

impl UserRow {
    fn into_user(self, id: Uuid) -> Result<User, DbError> {
        Ok(User {
            id,
            first_name: self.first_name,
            last_name: self.last_name,
            role: RoleName::new(&self.role),
            created_at: parse_date(&self.created_at)?,
        })
    }
}

impl UserRowWithId {
    fn try_into_user(self) -> Result<User, DbError> {
        let id = parse_uuid(&self.record_id, "user")?;
        Ok(User {
            id,
            first_name: self.first_name,
            last_name: self.last_name,
            role: RoleName::new(&self.role),
            created_at: parse_date(&self.created_at)?,
        })
    }
}

/// SurrealDB implementation of the user directory.
#[derive(Clone)]
pub struct SurrealUserDirectory<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealUserDirectory<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> UserDirectory for SurrealUserDirectory<C> {
    async fn create(&self, input: CreateUser) -> GreffeResult<User> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let created_at = Utc::now().date_naive();

        let result = self
            .db
            .query(
                "CREATE type::record('user', $id) SET \
                 first_name = $first_name, \
                 last_name = $last_name, \
                 role = $role, \
                 created_at = $created_at",
            )
            .bind(("id", id_str.clone()))
            .bind(("first_name", input.first_name))
            .bind(("last_name", input.last_name))
            .bind(("role", input.role.as_str().to_string()))
            .bind(("created_at", date_to_string(created_at)))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> GreffeResult<User> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('user', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(id)?)
    }

    async fn list(&self, role: Option<&RoleName>) -> GreffeResult<Vec<DirectoryUser>> {
        let mut query = String::from("SELECT meta::id(id) AS record_id, * FROM user");
        if role.is_some() {
            query.push_str(" WHERE role = $role");
        }
        query.push_str(" ORDER BY last_name ASC");

        let mut builder = self.db.query(&query);
        if let Some(role) = role {
            builder = builder.bind(("role", role.as_str().to_string()));
        }

        let mut result = builder.await.map_err(DbError::from)?;
        let rows: Vec<UserRowWithId> = result.take(0).map_err(DbError::from)?;

        let mut users = Vec::with_capacity(rows.len());
        for row in rows {
            let user = row.try_into_user()?;
            users.push(DirectoryUser {
                id: user.id,
                display_name: user.display_name(),
                role: user.role,
            });
        }

        Ok(users)
    }

    async fn members_of(&self, role: &RoleName) -> GreffeResult<Vec<User>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM user \
                 WHERE role = $role",
            )
            .bind(("role", role.as_str().to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRowWithId> = result.take(0).map_err(DbError::from)?;

        Ok(rows
            .into_iter()
            .map(|row| row.try_into_user())
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn distinct_roles(&self) -> GreffeResult<Vec<RoleName>> {
        let mut result = self
            .db
            .query("SELECT VALUE role FROM user")
            .await
            .map_err(DbError::from)?;

        let labels: Vec<String> = result.take(0).map_err(DbError::from)?;

        // Roles are stored normalized; dedup preserves a stable order.
        let distinct: std::collections::BTreeSet<String> = labels
            .into_iter()
            .filter(|label| !label.trim().is_empty())
            .collect();

        Ok(distinct.into_iter().map(|s| RoleName::new(&s)).collect())
    }
}

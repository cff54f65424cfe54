//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs are stored as strings. Enums are stored as strings with
//! ASSERT constraints. Dates are day-granularity, stored as ISO
//! `YYYY-MM-DD` strings (no time-of-day component is meaningful).

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1 — initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Users (directory; auth state lives elsewhere)
-- =======================================================================
DEFINE TABLE user SCHEMAFULL;
DEFINE FIELD first_name ON TABLE user TYPE string;
DEFINE FIELD last_name ON TABLE user TYPE string;
DEFINE FIELD role ON TABLE user TYPE string;
DEFINE FIELD created_at ON TABLE user TYPE string;
DEFINE INDEX idx_user_role ON TABLE user COLUMNS role;

-- =======================================================================
-- Entities (legal files/documents; FK owner_id -> user, no cascade)
-- =======================================================================
DEFINE TABLE entity SCHEMAFULL;
DEFINE FIELD number ON TABLE entity TYPE string;
DEFINE FIELD subject ON TABLE entity TYPE string;
DEFINE FIELD part_one ON TABLE entity TYPE string;
DEFINE FIELD part_two ON TABLE entity TYPE string;
DEFINE FIELD status ON TABLE entity TYPE string;
DEFINE FIELD magistrate ON TABLE entity TYPE string;
DEFINE FIELD kind ON TABLE entity TYPE string \
    ASSERT $value IN ['Dossier', 'Document'];
DEFINE FIELD owner_id ON TABLE entity TYPE string;
DEFINE FIELD created_at ON TABLE entity TYPE string;
DEFINE INDEX idx_entity_number ON TABLE entity COLUMNS number;
DEFINE INDEX idx_entity_owner ON TABLE entity COLUMNS owner_id;

-- =======================================================================
-- Transfers (ownership-movement ledger)
-- =======================================================================
DEFINE TABLE transfer SCHEMAFULL;
DEFINE FIELD entity_id ON TABLE transfer TYPE string;
DEFINE FIELD from_user ON TABLE transfer TYPE string;
DEFINE FIELD to_user ON TABLE transfer TYPE option<string>;
DEFINE FIELD to_role ON TABLE transfer TYPE option<string>;
DEFINE FIELD status ON TABLE transfer TYPE string \
    ASSERT $value IN ['Sent', 'Accepted', 'Refused'];
DEFINE FIELD content ON TABLE transfer TYPE string;
DEFINE FIELD date_sent ON TABLE transfer TYPE string;
DEFINE FIELD date_resolved ON TABLE transfer TYPE option<string>;
DEFINE INDEX idx_transfer_entity ON TABLE transfer COLUMNS entity_id;
DEFINE INDEX idx_transfer_from ON TABLE transfer COLUMNS from_user;
DEFINE INDEX idx_transfer_to ON TABLE transfer COLUMNS to_user;
DEFINE INDEX idx_transfer_status ON TABLE transfer COLUMNS status;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
/// All DEFINE statements are idempotent so re-running is safe.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    // Ensure migration tracking table exists (idempotent).
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    // Determine current schema version.
    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            // Record the applied migration.
            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(
                version = migration.version,
                "Migration applied successfully"
            );
        }
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
///
/// Exposed for testing with in-memory SurrealDB instances that
/// bypass the migration runner.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}

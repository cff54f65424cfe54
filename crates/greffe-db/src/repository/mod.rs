//! SurrealDB repository implementations.

mod entity;
mod transfer;
mod user;

pub use entity::SurrealEntityRepository;
pub use transfer::SurrealTransferRepository;
pub use user::SurrealUserDirectory;

use chrono::NaiveDate;

use crate::error::DbError;

/// Dates are persisted at day granularity as ISO `YYYY-MM-DD` strings.
const DATE_FORMAT: &str = "%Y-%m-%d";

fn parse_date(s: &str) -> Result<NaiveDate, DbError> {
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .map_err(|e| DbError::Corrupt(format!("invalid date '{s}': {e}")))
}

fn date_to_string(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn parse_uuid(s: &str, what: &str) -> Result<uuid::Uuid, DbError> {
    uuid::Uuid::parse_str(s).map_err(|e| DbError::Corrupt(format!("invalid {what} UUID: {e}")))
}

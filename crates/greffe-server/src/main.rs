//! Greffe Server — application entry point.
//!
//! Connects to SurrealDB, applies schema migrations, and wires the
//! repositories into the transfer service. The transport layer in
//! front of the service is deployment-specific and lives elsewhere.

use greffe_db::repository::{SurrealEntityRepository, SurrealTransferRepository, SurrealUserDirectory};
use greffe_db::{DbConfig, DbManager, run_migrations};
use greffe_transfer::TransferService;
use tracing_subscriber::EnvFilter;

fn db_config_from_env() -> DbConfig {
    let defaults = DbConfig::default();
    DbConfig {
        url: std::env::var("GREFFE_DB_URL").unwrap_or(defaults.url),
        namespace: std::env::var("GREFFE_DB_NAMESPACE").unwrap_or(defaults.namespace),
        database: std::env::var("GREFFE_DB_DATABASE").unwrap_or(defaults.database),
        username: std::env::var("GREFFE_DB_USERNAME").unwrap_or(defaults.username),
        password: std::env::var("GREFFE_DB_PASSWORD").unwrap_or(defaults.password),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("greffe=info".parse().unwrap()),
        )
        .json()
        .init();

    tracing::info!("Starting greffe server...");

    let config = db_config_from_env();
    let manager = DbManager::connect(&config).await?;
    run_migrations(manager.client()).await?;

    let db = manager.client().clone();
    let _service = TransferService::new(
        SurrealEntityRepository::new(db.clone()),
        SurrealTransferRepository::new(db.clone()),
        SurrealUserDirectory::new(db),
    );

    tracing::info!("Greffe service ready");
    tokio::signal::ctrl_c().await?;

    tracing::info!("Greffe server stopped.");
    Ok(())
}

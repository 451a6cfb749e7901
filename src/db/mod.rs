//! Persistence layer: connection setup, schema migrations, entities and the
//! query services used by the web handlers and the monitor scheduler.

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use std::time::Duration;
use tracing::info;

pub mod entities;
pub mod migration;
pub mod services;

/// Opens the connection pool and brings the schema up to date.
pub async fn connect_and_migrate(
    database_url: &str,
    max_connections: u32,
) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(database_url.to_owned());
    opt.max_connections(max_connections)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);

    let db = Database::connect(opt).await?;
    migration::Migrator::up(&db, None).await?;
    info!("Database schema is up to date.");
    Ok(db)
}

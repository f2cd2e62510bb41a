use migration::Migrator;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use sea_orm_migration::MigratorTrait;
use tracing::debug;

use crate::error::{AppError, AppResult};

const PRAGMAS: [&str; 2] = ["PRAGMA journal_mode=WAL", "PRAGMA synchronous=NORMAL"];

/// sea-orm URL for a SQLite file, created on first open.
pub fn sqlite_url(path: &str) -> String {
    format!("sqlite://{path}?mode=rwc")
}

pub async fn connect_and_migrate(database_url: &str) -> AppResult<DatabaseConnection> {
    // One writer per run; also keeps `sqlite::memory:` on a single database.
    let mut options = ConnectOptions::new(database_url);
    options.max_connections(1).min_connections(1);

    let db = Database::connect(options).await.map_err(AppError::StoreConnection)?;

    for pragma in PRAGMAS {
        db.execute(Statement::from_string(db.get_database_backend(), pragma.to_string()))
            .await
            .map_err(AppError::StoreConnection)?;
    }

    Migrator::up(&db, None).await.map_err(AppError::StoreConnection)?;
    debug!(database_url = %database_url, "store ready");
    Ok(db)
}

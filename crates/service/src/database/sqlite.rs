use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::database::DatabaseSetupError;

pub(super) async fn connect_sqlite(url: &url::Url) -> Result<SqlitePool, DatabaseSetupError> {
    let connection_options = SqliteConnectOptions::from_str(url.as_str())
        .map_err(DatabaseSetupError::Unavailable)?
        .create_if_missing(true);

    // An in-memory database lives and dies with its connection, so the pool
    // must never hand out more than one or recycle it.
    let pool_options = if url.as_str().contains(":memory:") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new()
    };

    pool_options
        .connect_with(connection_options)
        .await
        .map_err(DatabaseSetupError::Unavailable)
}

pub(super) async fn migrate_sqlite(pool: &SqlitePool) -> Result<(), DatabaseSetupError> {
    sqlx::migrate!()
        .run(pool)
        .await
        .map_err(DatabaseSetupError::MigrationFailed)
}

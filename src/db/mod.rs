pub mod courses;
pub mod repository;
pub mod schedules;

use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::info;

use crate::error::AppError;

pub use courses::CourseStore;
pub use repository::Repository;
pub use schedules::ScheduleStore;

/// Opens the local store and brings its schema up to date.
///
/// The pool holds a single connection, so all statements against one store
/// run one after another on the same connection.
pub async fn connect(database_url: &str) -> Result<SqlitePool, AppError> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("local store ready at {}", database_url);

    Ok(pool)
}

/// Fresh in-memory store, used by tests.
pub async fn connect_in_memory() -> Result<SqlitePool, AppError> {
    connect("sqlite::memory:").await
}

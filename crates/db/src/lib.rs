pub mod appointments;
pub mod maintenance;
pub mod owners;
pub mod pets;
pub mod providers;
pub mod tokens;

use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::info;

pub use appointments::*;
pub use owners::*;
pub use pets::*;
pub use providers::*;
pub use tokens::*;

#[derive(Debug, Clone)]
pub struct Db(pub PgPool);

#[derive(thiserror::Error, Debug)]
pub enum DbError {
    #[error("sqlx error: {0}")]
    Sqlx(sqlx::Error),

    #[error("unique constraint `{0}` violated")]
    Conflict(String),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl From<sqlx::Error> for DbError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return DbError::Conflict(db_err.constraint().unwrap_or_default().to_string());
            }
        }
        DbError::Sqlx(e)
    }
}

impl DbError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, DbError::Conflict(_))
    }
}

/// Hides the password part of a connection string before it is logged.
pub fn mask_url(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    match rest.split_once('@') {
        Some((_, host)) => format!("{scheme}://***:***@{host}"),
        None => url.to_string(),
    }
}

pub async fn connect(database_url: &str, max: u32) -> Result<Db, DbError> {
    info!(url = %mask_url(database_url), "connecting to database");
    let pool = PgPoolOptions::new()
        .max_connections(max)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url)
        .await?;
    Ok(Db(pool))
}

/// Builds a pool without opening a connection; connections are made on
/// first use.
pub fn connect_lazy(database_url: &str, max: u32) -> Result<Db, DbError> {
    let pool = PgPoolOptions::new()
        .max_connections(max)
        .acquire_timeout(Duration::from_secs(2))
        .connect_lazy(database_url)?;
    Ok(Db(pool))
}

pub async fn migrate(db: &Db) -> Result<(), DbError> {
    sqlx::migrate!("./migrations").run(&db.0).await?;
    Ok(())
}

pub async fn ping(db: &Db) -> bool {
    sqlx::query("SELECT 1").execute(&db.0).await.is_ok()
}

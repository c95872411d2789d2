//! Database module: models, schema and storage for persistent state.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows and conversions
//! - `schema.rs`: SQL DDL for initializing the database (SQLite-first)
//! - `clients.rs`: read access to the Client projection
//! - `credentials.rs`: credential repository with the encryption decorator
//! - `metrics.rs`: metric upserts and analytics aggregation queries

pub mod clients;
pub mod credentials;
pub mod metrics;
pub mod models;
pub mod schema;

pub use clients::ClientDirectory;
pub use credentials::CredentialStore;
pub use metrics::MetricsStore;
pub use models::{Client, Credential, MetricRow};
pub use schema::SQLITE_INIT;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

use crate::error::AdmetraError;

pub type SqlitePool = sqlx::Pool<sqlx::Sqlite>;

/// Open (creating if missing) the database and run the bundled DDL.
pub async fn connect(database_url: &str) -> Result<SqlitePool, AdmetraError> {
    let connect_opts = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new().connect_with(connect_opts).await?;
    init_schema(&pool).await?;
    Ok(pool)
}

/// Execute the bundled DDL statement by statement (sqlx::query rejects
/// multi-statement strings).
async fn init_schema(pool: &SqlitePool) -> Result<(), AdmetraError> {
    for stmt in SQLITE_INIT.split(';') {
        let s = stmt.trim();
        if s.is_empty() {
            continue;
        }
        sqlx::query(s).execute(pool).await?;
    }
    Ok(())
}

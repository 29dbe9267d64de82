//! SQLite backend for `strata-core`.
//!
//! Provides [`SqliteDatabase`], a blocking implementation of the
//! [`Database`](strata_core::Database) execution contract on top of sqlx, and
//! [`connect`] to build a ready [`DataClient`] using the SQLite dialect.
//!
//! ```rust,no_run
//! use strata_core::prelude::*;
//! use strata_sqlite::{connect, SqliteOptions};
//!
//! let options = SqliteOptions::new("sqlite://app.db");
//! let mut client = connect(&options, None, ClientConfig::default())?;
//! client.add_table("users", vec![Column::big_int("id").primary_key().auto_increment()])?;
//! assert!(client.table_exists("users")?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod database;

pub use database::{SqliteDatabase, SqliteOptions};

use strata_core::client::{ClientConfig, DataClient};
use strata_core::database::DbResult;
use strata_core::dialect::SqliteDialect;

/// Opens a SQLite database and wraps it in a [`DataClient`].
///
/// # Errors
///
/// Fails when the database cannot be opened.
pub fn connect(
    options: &SqliteOptions,
    schema: Option<String>,
    config: ClientConfig,
) -> DbResult<DataClient> {
    let database = SqliteDatabase::open(options)?;
    Ok(DataClient::new(
        Box::new(database),
        Box::new(SqliteDialect::new()),
        schema,
        config,
    ))
}

/// Opens a private in-memory database wrapped in a strict [`DataClient`].
///
/// # Errors
///
/// Fails when SQLite cannot be opened.
pub fn memory_client() -> DbResult<DataClient> {
    connect(&SqliteOptions::memory(), None, ClientConfig::default())
}

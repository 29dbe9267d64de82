//! Database-agnostic schema evolution and SQL generation.
//!
//! `strata-core` renders DDL and DML for several relational databases and
//! executes it through a small, driver-neutral execution contract:
//!
//! - [`schema`] describes tables, columns and keys as plain values.
//! - [`dialect`] turns those values into SQL for SQLite, PostgreSQL or
//!   SQL Server.
//! - [`filter`] compiles predicate trees into parameterized WHERE clauses.
//! - [`client`] sequences the generated statements against a [`Database`].
//!
//! # Example
//!
//! ```rust
//! use strata_core::prelude::*;
//!
//! let dialect = PostgresDialect::new();
//! let table = Table::new("users")
//!     .column(Column::big_int("id").primary_key().auto_increment())
//!     .column(Column::string("name").size(100).not_null());
//!
//! let sqls = dialect.create_table_sqls(&table).unwrap();
//! assert_eq!(
//!     sqls[0],
//!     "CREATE TABLE \"users\" (\n  \
//!      \"id\" BIGSERIAL NOT NULL PRIMARY KEY,\n  \
//!      \"name\" VARCHAR(100) NOT NULL\n)"
//! );
//!
//! let clause = Filter::eq("name", "Alice").compile(&dialect, 1).unwrap();
//! assert_eq!(clause.sql, "WHERE \"name\" = $2");
//! assert_eq!(clause.parameters[0].name, "par1");
//! ```

pub mod client;
pub mod database;
pub mod dialect;
pub mod error;
pub mod filter;
pub mod parameter;
pub mod schema;
pub mod select;
pub mod value;

pub use client::{ClientConfig, DataClient};
pub use database::{Database, DbResult};
pub use dialect::{Dialect, PostgresDialect, SqlServerDialect, SqliteDialect};
pub use error::{DatabaseError, DatabaseErrorKind, Error, Result};
pub use filter::{CompareOp, Filter, WhereClause};
pub use parameter::{InParameter, OutParameter, Parameter, ReturningInsert};
pub use schema::{Column, DbType, DefaultValue, ForeignKey, OnDelete, Table};
pub use select::{BuiltSelect, Direction, OrderBy, SelectQuery};
pub use value::{ResultSet, SqlValue, ToSqlValue};

/// Prelude for common imports.
pub mod prelude {
    pub use crate::client::{ClientConfig, DataClient};
    pub use crate::database::Database;
    pub use crate::dialect::{Dialect, PostgresDialect, SqlServerDialect, SqliteDialect};
    pub use crate::error::{Error, Result};
    pub use crate::filter::Filter;
    pub use crate::schema::{Column, DbType, DefaultValue, ForeignKey, OnDelete, Table};
    pub use crate::select::{OrderBy, SelectQuery};
    pub use crate::value::{ResultSet, SqlValue};
}

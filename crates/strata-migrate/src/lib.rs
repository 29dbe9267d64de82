//! Versioned, reversible schema migrations.
//!
//! `strata-migrate` applies numbered migration units through a
//! [`DataClient`](strata_core::client::DataClient) and records every applied
//! version, per group, in a tracking table:
//!
//! - **Operations** - [`SchemaOperation`](operations::SchemaOperation) values
//!   such as `CreateTable` or `RenameColumn`, each able to describe its own
//!   inverse.
//! - **Migrations** - [`MigrationInfo`](migration::MigrationInfo) pairs a
//!   version and group with either up-only or reversible logic.
//! - **Catalog** - the known migrations of a group, ordered by version.
//! - **History** - the `(version, group)` tracking table.
//! - **Runner** - applies pending migrations and rolls back applied ones.
//!
//! # Example
//!
//! ```rust
//! use strata_core::prelude::*;
//! use strata_migrate::prelude::*;
//!
//! let client = strata_sqlite::memory_client()?;
//! let migrations = vec![
//!     MigrationInfo::named(
//!         "_001_Create_users",
//!         MigrationKind::from_operations(vec![SchemaOperation::create_table(
//!             Table::new("users").column(Column::big_int("id").primary_key().auto_increment()),
//!         )]),
//!     )?,
//!     MigrationInfo::named(
//!         "_002_Rename_users",
//!         MigrationKind::from_operations(vec![SchemaOperation::rename_table("users", "members")]),
//!     )?,
//! ];
//!
//! let mut runner = MigrationRunner::new(client, VersionTableConfig::new(), migrations)?;
//! assert_eq!(runner.migrate_up()?, vec![1, 2]);
//! assert!(runner.client().table_exists("members")?);
//!
//! assert_eq!(runner.rollback_last()?, Some(2));
//! assert!(runner.client().table_exists("users")?);
//! assert_eq!(runner.current_version()?, 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! # Create the version table
//! strata-migrate --database sqlite:app.db init
//!
//! # Show applied versions of a group
//! strata-migrate --group reporting status --json
//!
//! # Print a fresh timestamp version for a new migration
//! strata-migrate new-version
//! ```

pub mod catalog;
pub mod error;
pub mod history;
pub mod migration;
pub mod operations;
pub mod runner;

pub use catalog::MigrationCatalog;
pub use error::{MigrateError, Result};
pub use history::{VersionRepository, VersionTableConfig};
pub use migration::{
    parse_version, timestamp_version, MigrationInfo, MigrationKind, ReversibleMigration,
    SchemaMigration, DEFAULT_GROUP,
};
pub use operations::{reverse_all, SchemaOperation};
pub use runner::{MigrationRunner, MigrationState, MigrationStatus};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::catalog::MigrationCatalog;
    pub use crate::error::{MigrateError, Result as MigrateResult};
    pub use crate::history::{VersionRepository, VersionTableConfig};
    pub use crate::migration::{
        MigrationInfo, MigrationKind, ReversibleMigration, SchemaMigration,
    };
    pub use crate::operations::SchemaOperation;
    pub use crate::runner::{MigrationRunner, MigrationState, MigrationStatus};
}

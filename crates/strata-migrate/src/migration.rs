//! Migration units.
//!
//! A migration is either up-only ([`SchemaMigration`]) or carries down logic
//! as well ([`ReversibleMigration`]). [`MigrationKind`] keeps the two apart so
//! only the reversible variant can ever be asked to roll back.

use std::fmt;

use chrono::{DateTime, Datelike, Timelike, Utc};
use strata_core::client::DataClient;

use crate::error::{MigrateError, Result};
use crate::operations::{reverse_all, SchemaOperation};

/// Group used when a migration does not name one.
pub const DEFAULT_GROUP: &str = "default";

/// Forward-only migration logic.
pub trait SchemaMigration: Send {
    /// Applies the migration.
    ///
    /// # Errors
    ///
    /// Returns the first client failure.
    fn up(&self, client: &mut DataClient) -> strata_core::Result<()>;
}

/// Migration logic that can also be undone.
pub trait ReversibleMigration: SchemaMigration {
    /// Undoes [`SchemaMigration::up`].
    ///
    /// # Errors
    ///
    /// Returns the first client failure.
    fn down(&self, client: &mut DataClient) -> strata_core::Result<()>;
}

/// Whether a migration can be rolled back.
pub enum MigrationKind {
    /// Up logic only.
    Irreversible(Box<dyn SchemaMigration>),
    /// Up and down logic.
    Reversible(Box<dyn ReversibleMigration>),
}

impl MigrationKind {
    /// Wraps up-only logic.
    #[must_use]
    pub fn irreversible(migration: impl SchemaMigration + 'static) -> Self {
        Self::Irreversible(Box::new(migration))
    }

    /// Wraps reversible logic.
    #[must_use]
    pub fn reversible(migration: impl ReversibleMigration + 'static) -> Self {
        Self::Reversible(Box::new(migration))
    }

    /// Builds a migration from operations. It is reversible exactly when every
    /// operation can be inverted.
    #[must_use]
    pub fn from_operations(operations: Vec<SchemaOperation>) -> Self {
        match reverse_all(&operations) {
            Some(down) => Self::reversible(ReversibleOperations {
                up: operations,
                down,
            }),
            None => Self::irreversible(Operations(operations)),
        }
    }

    /// Up-only migration from a closure.
    #[must_use]
    pub fn from_fn<U>(up: U) -> Self
    where
        U: Fn(&mut DataClient) -> strata_core::Result<()> + Send + 'static,
    {
        Self::irreversible(FnMigration { up })
    }

    /// Reversible migration from two closures.
    #[must_use]
    pub fn from_fns<U, D>(up: U, down: D) -> Self
    where
        U: Fn(&mut DataClient) -> strata_core::Result<()> + Send + 'static,
        D: Fn(&mut DataClient) -> strata_core::Result<()> + Send + 'static,
    {
        Self::reversible(ReversibleFnMigration { up, down })
    }

    /// Returns whether down logic exists.
    #[must_use]
    pub fn is_reversible(&self) -> bool {
        matches!(self, Self::Reversible(_))
    }

    /// Runs the up logic.
    ///
    /// # Errors
    ///
    /// Returns the first client failure.
    pub fn up(&self, client: &mut DataClient) -> strata_core::Result<()> {
        match self {
            Self::Irreversible(m) => m.up(client),
            Self::Reversible(m) => m.up(client),
        }
    }

    /// The down logic, if any.
    #[must_use]
    pub fn reversible_migration(&self) -> Option<&dyn ReversibleMigration> {
        match self {
            Self::Irreversible(_) => None,
            Self::Reversible(m) => Some(m.as_ref()),
        }
    }
}

impl fmt::Debug for MigrationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Irreversible(_) => f.write_str("Irreversible"),
            Self::Reversible(_) => f.write_str("Reversible"),
        }
    }
}

/// A list of operations applied in order.
struct Operations(Vec<SchemaOperation>);

impl SchemaMigration for Operations {
    fn up(&self, client: &mut DataClient) -> strata_core::Result<()> {
        apply_all(&self.0, client)
    }
}

/// Operations together with their derived inverse.
struct ReversibleOperations {
    up: Vec<SchemaOperation>,
    down: Vec<SchemaOperation>,
}

impl SchemaMigration for ReversibleOperations {
    fn up(&self, client: &mut DataClient) -> strata_core::Result<()> {
        apply_all(&self.up, client)
    }
}

impl ReversibleMigration for ReversibleOperations {
    fn down(&self, client: &mut DataClient) -> strata_core::Result<()> {
        apply_all(&self.down, client)
    }
}

fn apply_all(operations: &[SchemaOperation], client: &mut DataClient) -> strata_core::Result<()> {
    for op in operations {
        tracing::debug!(operation = %op.describe(), "Applying operation");
        op.apply(client)?;
    }
    Ok(())
}

struct FnMigration<U> {
    up: U,
}

impl<U> SchemaMigration for FnMigration<U>
where
    U: Fn(&mut DataClient) -> strata_core::Result<()> + Send,
{
    fn up(&self, client: &mut DataClient) -> strata_core::Result<()> {
        (self.up)(client)
    }
}

struct ReversibleFnMigration<U, D> {
    up: U,
    down: D,
}

impl<U, D> SchemaMigration for ReversibleFnMigration<U, D>
where
    U: Fn(&mut DataClient) -> strata_core::Result<()> + Send,
    D: Fn(&mut DataClient) -> strata_core::Result<()> + Send,
{
    fn up(&self, client: &mut DataClient) -> strata_core::Result<()> {
        (self.up)(client)
    }
}

impl<U, D> ReversibleMigration for ReversibleFnMigration<U, D>
where
    U: Fn(&mut DataClient) -> strata_core::Result<()> + Send,
    D: Fn(&mut DataClient) -> strata_core::Result<()> + Send,
{
    fn down(&self, client: &mut DataClient) -> strata_core::Result<()> {
        (self.down)(client)
    }
}

/// A versioned migration unit.
#[derive(Debug)]
pub struct MigrationInfo {
    /// Version number; migrations apply in ascending order.
    pub version: i64,
    /// Group the migration belongs to.
    pub group: String,
    /// Display name.
    pub name: String,
    /// The migration logic.
    pub kind: MigrationKind,
}

impl MigrationInfo {
    /// Creates a migration in the default group.
    #[must_use]
    pub fn new(version: i64, name: impl Into<String>, kind: MigrationKind) -> Self {
        Self {
            version,
            group: DEFAULT_GROUP.to_string(),
            name: name.into(),
            kind,
        }
    }

    /// Creates a migration whose version is read from its name, such as
    /// `_003_Rename_table`.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::InvalidName`] when the name has no leading
    /// version number.
    pub fn named(name: &str, kind: MigrationKind) -> Result<Self> {
        let version =
            parse_version(name).ok_or_else(|| MigrateError::InvalidName(name.to_string()))?;
        Ok(Self::new(version, name, kind))
    }

    /// Moves the migration into `group`.
    #[must_use]
    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    /// Returns whether the migration can be rolled back.
    #[must_use]
    pub fn is_reversible(&self) -> bool {
        self.kind.is_reversible()
    }
}

/// Reads the version number that leads a migration name.
///
/// Leading underscores are skipped, so `_003_Rename_table` is version 3 and
/// `20240131120000_add_users` is version 20240131120000.
#[must_use]
pub fn parse_version(name: &str) -> Option<i64> {
    let rest = name.trim_start_matches('_');
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    rest[..end].parse().ok()
}

/// Version number derived from a timestamp, as `yyyymmddHHMMSS`.
#[must_use]
pub fn timestamp_version(at: DateTime<Utc>) -> i64 {
    i64::from(at.year()) * 10_000_000_000
        + i64::from(at.month()) * 100_000_000
        + i64::from(at.day()) * 1_000_000
        + i64::from(at.hour()) * 10_000
        + i64::from(at.minute()) * 100
        + i64::from(at.second())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use strata_core::schema::{Column, Table};

    #[test]
    fn test_parse_version() {
        assert_eq!(parse_version("_003_Rename_table_rev_to_revbar"), Some(3));
        assert_eq!(parse_version("20240131120000_add_users"), Some(20_240_131_120_000));
        assert_eq!(parse_version("42"), Some(42));
        assert_eq!(parse_version("add_users"), None);
        assert_eq!(parse_version(""), None);
    }

    #[test]
    fn test_timestamp_version() {
        let at = Utc.with_ymd_and_hms(2024, 1, 31, 12, 5, 9).unwrap();
        assert_eq!(timestamp_version(at), 20_240_131_120_509);
    }

    #[test]
    fn test_named_requires_version() {
        let kind = || MigrationKind::from_fn(|_| Ok(()));
        let info = MigrationInfo::named("_007_Seed", kind()).unwrap();
        assert_eq!(info.version, 7);
        assert_eq!(info.group, DEFAULT_GROUP);
        assert!(matches!(
            MigrationInfo::named("Seed", kind()),
            Err(MigrateError::InvalidName(_))
        ));
    }

    #[test]
    fn test_operations_reversibility() {
        let reversible = MigrationKind::from_operations(vec![
            SchemaOperation::create_table(Table::new("t").column(Column::integer("a"))),
            SchemaOperation::rename_table("t", "u"),
        ]);
        assert!(reversible.is_reversible());

        let irreversible = MigrationKind::from_operations(vec![SchemaOperation::drop_table("t")]);
        assert!(!irreversible.is_reversible());
        assert!(irreversible.reversible_migration().is_none());
    }

    #[test]
    fn test_fn_kinds() {
        assert!(!MigrationKind::from_fn(|_| Ok(())).is_reversible());
        assert!(MigrationKind::from_fns(|_| Ok(()), |_| Ok(())).is_reversible());
    }
}

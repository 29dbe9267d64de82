//! Migration discovery.
//!
//! A [`MigrationCatalog`] holds the known migrations of one group keyed by
//! version, so iteration is always in ascending numeric order no matter how
//! the migrations were supplied.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{MigrateError, Result};
use crate::migration::MigrationInfo;

/// The known migrations of one group.
#[derive(Debug)]
pub struct MigrationCatalog {
    group: String,
    migrations: BTreeMap<i64, MigrationInfo>,
}

impl MigrationCatalog {
    /// Collects the migrations belonging to `group`; others are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::VersionConflict`] when two migrations of the
    /// group share a version.
    pub fn discover(
        group: &str,
        migrations: impl IntoIterator<Item = MigrationInfo>,
    ) -> Result<Self> {
        let mut by_version = BTreeMap::new();
        for migration in migrations.into_iter().filter(|m| m.group == group) {
            let version = migration.version;
            if by_version.insert(version, migration).is_some() {
                return Err(MigrateError::VersionConflict {
                    version,
                    group: group.to_string(),
                });
            }
        }
        Ok(Self {
            group: group.to_string(),
            migrations: by_version,
        })
    }

    /// The catalog's group.
    #[must_use]
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Number of known migrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    /// Returns true without migrations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }

    /// Looks up a migration.
    #[must_use]
    pub fn get(&self, version: i64) -> Option<&MigrationInfo> {
        self.migrations.get(&version)
    }

    /// Known versions, ascending.
    pub fn versions(&self) -> impl Iterator<Item = i64> + '_ {
        self.migrations.keys().copied()
    }

    /// Migrations in ascending version order.
    pub fn iter(&self) -> impl Iterator<Item = &MigrationInfo> {
        self.migrations.values()
    }

    /// Known migrations not in `applied`, ascending.
    #[must_use]
    pub fn pending(&self, applied: &BTreeSet<i64>) -> Vec<&MigrationInfo> {
        self.iter().filter(|m| !applied.contains(&m.version)).collect()
    }
}

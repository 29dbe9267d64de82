//! Migration runner.
//!
//! Applies and rolls back the migrations of one group against a
//! [`DataClient`], recording each success in the version table. Applied state
//! is re-read from the table on every call.
//!
//! Two runners working on the same database and group at the same time can
//! both see a version as pending and both apply it; serialize runs externally
//! (for example with an advisory lock) when that can happen.

use std::collections::BTreeSet;

use serde::Serialize;
use strata_core::client::DataClient;
use tracing::{info, warn};

use crate::catalog::MigrationCatalog;
use crate::error::{MigrateError, Result};
use crate::history::{VersionRepository, VersionTableConfig};
use crate::migration::MigrationInfo;

/// State of a migration in the version table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MigrationState {
    /// Not recorded.
    Pending,
    /// Recorded as applied.
    Applied,
}

/// One line of [`MigrationRunner::status`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationStatus {
    /// Version number.
    pub version: i64,
    /// Migration name.
    pub name: String,
    /// Current state.
    pub state: MigrationState,
    /// Whether it can be rolled back.
    pub reversible: bool,
}

/// Applies and rolls back one group of migrations.
#[derive(Debug)]
pub struct MigrationRunner {
    client: DataClient,
    catalog: MigrationCatalog,
    repository: VersionRepository,
}

impl MigrationRunner {
    /// Creates a runner for the group named in `config`. Migrations of other
    /// groups are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::VersionConflict`] for duplicate versions.
    pub fn new(
        client: DataClient,
        config: VersionTableConfig,
        migrations: impl IntoIterator<Item = MigrationInfo>,
    ) -> Result<Self> {
        let catalog = MigrationCatalog::discover(&config.group, migrations)?;
        Ok(Self {
            client,
            catalog,
            repository: VersionRepository::new(config),
        })
    }

    /// The underlying client.
    pub fn client(&mut self) -> &mut DataClient {
        &mut self.client
    }

    /// Gives the client back.
    #[must_use]
    pub fn into_client(self) -> DataClient {
        self.client
    }

    /// The known migrations.
    #[must_use]
    pub fn catalog(&self) -> &MigrationCatalog {
        &self.catalog
    }

    /// The group this runner manages.
    #[must_use]
    pub fn group(&self) -> &str {
        self.catalog.group()
    }

    /// Creates the version table unless it exists.
    ///
    /// # Errors
    ///
    /// Returns the client failure.
    pub fn ensure_version_table(&mut self) -> Result<()> {
        self.repository.ensure_version_table(&mut self.client)
    }

    /// Applied versions of the group. Reading does not create the version
    /// table.
    ///
    /// # Errors
    ///
    /// Returns the client failure.
    pub fn applied(&mut self) -> Result<BTreeSet<i64>> {
        self.repository.applied_versions(&mut self.client)
    }

    /// Known versions not applied yet, ascending.
    ///
    /// # Errors
    ///
    /// Returns the client failure.
    pub fn pending(&mut self) -> Result<Vec<i64>> {
        let applied = self.applied()?;
        Ok(self
            .catalog
            .pending(&applied)
            .iter()
            .map(|m| m.version)
            .collect())
    }

    /// Highest applied version, or 0.
    ///
    /// # Errors
    ///
    /// Returns the client failure.
    pub fn current_version(&mut self) -> Result<i64> {
        self.repository.current_version(&mut self.client)
    }

    fn apply(&mut self, version: i64) -> Result<()> {
        let Some(migration) = self.catalog.get(version) else {
            return Err(self.unknown(version));
        };
        info!(version, name = %migration.name, group = %migration.group, "Applying migration");
        migration
            .kind
            .up(&mut self.client)
            .map_err(|source| MigrateError::MigrationFailed { version, source })?;
        self.repository.ensure_version_table(&mut self.client)?;
        self.repository.insert_version(&mut self.client, version)?;
        Ok(())
    }

    fn revert(&mut self, version: i64) -> Result<()> {
        let Some(migration) = self.catalog.get(version) else {
            return Err(self.unknown(version));
        };
        let Some(reversible) = migration.kind.reversible_migration() else {
            return Err(self.not_reversible(version));
        };
        info!(version, name = %migration.name, group = %migration.group, "Rolling back migration");
        reversible
            .down(&mut self.client)
            .map_err(|source| MigrateError::MigrationFailed { version, source })?;
        self.repository.remove_version(&mut self.client, version)?;
        Ok(())
    }

    fn unknown(&self, version: i64) -> MigrateError {
        MigrateError::UnknownVersion {
            version,
            group: self.group().to_string(),
        }
    }

    fn not_reversible(&self, version: i64) -> MigrateError {
        MigrateError::MigrationNotReversible {
            version,
            group: self.group().to_string(),
        }
    }

    /// Applies every pending migration in ascending version order and returns
    /// the versions applied.
    ///
    /// Stops at the first failure. The failed version stays pending and no
    /// later migration is attempted.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::MigrationFailed`] for a failing migration.
    pub fn migrate_up(&mut self) -> Result<Vec<i64>> {
        let pending = self.pending()?;
        if pending.is_empty() {
            info!(group = %self.group(), "No pending migrations");
        }
        for &version in &pending {
            self.apply(version)?;
        }
        Ok(pending)
    }

    /// Brings the database to `target`: applied migrations above it are rolled
    /// back newest first, then pending migrations up to it are applied.
    ///
    /// Nothing runs when one of the migrations to roll back is not reversible.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::MigrationNotReversible`] or
    /// [`MigrateError::UnknownVersion`] before touching the database, or
    /// [`MigrateError::MigrationFailed`] for a failing migration.
    pub fn migrate_to(&mut self, target: i64) -> Result<()> {
        let applied = self.applied()?;
        let to_revert: Vec<i64> = applied.iter().rev().copied().filter(|&v| v > target).collect();
        for &version in &to_revert {
            match self.catalog.get(version) {
                None => return Err(self.unknown(version)),
                Some(m) if !m.is_reversible() => return Err(self.not_reversible(version)),
                Some(_) => {}
            }
        }
        for version in to_revert {
            self.revert(version)?;
        }

        let to_apply: Vec<i64> = self
            .catalog
            .pending(&applied)
            .iter()
            .map(|m| m.version)
            .filter(|&v| v <= target)
            .collect();
        for version in to_apply {
            self.apply(version)?;
        }
        Ok(())
    }

    /// Rolls back one applied migration. Returns false when it was not applied.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::MigrationNotReversible`] without running
    /// anything when the migration has no down logic.
    pub fn rollback(&mut self, version: i64) -> Result<bool> {
        match self.catalog.get(version) {
            None => return Err(self.unknown(version)),
            Some(m) if !m.is_reversible() => return Err(self.not_reversible(version)),
            Some(_) => {}
        }
        if !self.applied()?.contains(&version) {
            warn!(version, group = %self.group(), "Migration is not applied, nothing to roll back");
            return Ok(false);
        }
        self.revert(version)?;
        Ok(true)
    }

    /// Rolls back the highest applied version, if any.
    ///
    /// # Errors
    ///
    /// Same as [`MigrationRunner::rollback`].
    pub fn rollback_last(&mut self) -> Result<Option<i64>> {
        let Some(&version) = self.applied()?.last() else {
            return Ok(None);
        };
        self.rollback(version)?;
        Ok(Some(version))
    }

    /// Every known migration with its state.
    ///
    /// # Errors
    ///
    /// Returns the client failure.
    pub fn status(&mut self) -> Result<Vec<MigrationStatus>> {
        let applied = self.applied()?;
        Ok(self
            .catalog
            .iter()
            .map(|m| MigrationStatus {
                version: m.version,
                name: m.name.clone(),
                state: if applied.contains(&m.version) {
                    MigrationState::Applied
                } else {
                    MigrationState::Pending
                },
                reversible: m.is_reversible(),
            })
            .collect())
    }
}

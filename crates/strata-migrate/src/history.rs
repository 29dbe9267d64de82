//! Version tracking.
//!
//! Applied migrations are recorded as `(version, group)` rows in a tracking
//! table. Those rows are the only record of what has been applied; nothing is
//! cached between calls.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use strata_core::client::DataClient;
use strata_core::filter::Filter;
use strata_core::schema::{qualify, Column, DefaultValue};
use strata_core::select::SelectQuery;
use strata_core::value::SqlValue;

use crate::error::Result;
use crate::migration::DEFAULT_GROUP;

/// Default name of the tracking table.
pub const DEFAULT_VERSION_TABLE: &str = "strata_version";

/// Version column name.
pub const VERSION_COLUMN: &str = "version";

/// Group column name.
pub const GROUP_COLUMN: &str = "group";

/// Where versions are recorded, and for which group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VersionTableConfig {
    /// Schema of the tracking table; the client's schema when absent.
    pub schema: Option<String>,
    /// Tracking table name.
    pub table_name: String,
    /// Migration group this repository reads and writes.
    pub group: String,
}

impl Default for VersionTableConfig {
    fn default() -> Self {
        Self {
            schema: None,
            table_name: DEFAULT_VERSION_TABLE.to_string(),
            group: DEFAULT_GROUP.to_string(),
        }
    }
}

impl VersionTableConfig {
    /// Default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON configuration; missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::Serialization`](crate::error::MigrateError::Serialization)
    /// for malformed JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Sets the schema.
    #[must_use]
    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Sets the table name.
    #[must_use]
    pub fn table_name(mut self, name: impl Into<String>) -> Self {
        self.table_name = name.into();
        self
    }

    /// Sets the group.
    #[must_use]
    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }
}

/// Reads and writes version records through a [`DataClient`].
#[derive(Debug, Clone)]
pub struct VersionRepository {
    config: VersionTableConfig,
}

impl VersionRepository {
    /// Creates a repository for `config`.
    #[must_use]
    pub fn new(config: VersionTableConfig) -> Self {
        Self { config }
    }

    /// The repository configuration.
    #[must_use]
    pub fn config(&self) -> &VersionTableConfig {
        &self.config
    }

    /// The group whose versions this repository tracks.
    #[must_use]
    pub fn group(&self) -> &str {
        &self.config.group
    }

    /// Fully qualified tracking table name for `client`.
    #[must_use]
    pub fn table(&self, client: &DataClient) -> String {
        match self.config.schema {
            Some(ref schema) => qualify(Some(schema), &self.config.table_name),
            None => client.table_name(&self.config.table_name),
        }
    }

    fn group_filter(&self) -> Filter {
        Filter::eq(GROUP_COLUMN, self.config.group.as_str())
    }

    /// Creates the tracking table unless it exists. Safe to call repeatedly.
    ///
    /// # Errors
    ///
    /// Returns the client failure.
    pub fn ensure_version_table(&self, client: &mut DataClient) -> Result<()> {
        let table = self.table(client);
        if client.table_exists(&table)? {
            return Ok(());
        }
        tracing::info!(table = %table, "Creating version table");
        client.add_table(
            &table,
            vec![
                Column::big_int(VERSION_COLUMN).not_null(),
                Column::string(GROUP_COLUMN)
                    .size(255)
                    .not_null()
                    .default_value(DefaultValue::String(DEFAULT_GROUP.to_string())),
            ],
        )?;
        Ok(())
    }

    /// Versions applied in this group. Empty when the tracking table does not
    /// exist yet; reading never creates it.
    ///
    /// # Errors
    ///
    /// Returns the client failure.
    pub fn applied_versions(&self, client: &mut DataClient) -> Result<BTreeSet<i64>> {
        let table = self.table(client);
        if !client.table_exists(&table)? {
            return Ok(BTreeSet::new());
        }
        let query = SelectQuery::from(&table)
            .columns(&[VERSION_COLUMN])
            .filter(self.group_filter());
        let rows = client.select(&query)?;
        Ok(rows
            .rows()
            .iter()
            .filter_map(|row| row.first().and_then(SqlValue::as_i64))
            .collect())
    }

    /// Highest applied version, or 0 when nothing is applied.
    ///
    /// # Errors
    ///
    /// Returns the client failure.
    pub fn current_version(&self, client: &mut DataClient) -> Result<i64> {
        Ok(self
            .applied_versions(client)?
            .last()
            .copied()
            .unwrap_or(0))
    }

    /// Records `version` as applied.
    ///
    /// # Errors
    ///
    /// Returns the client failure.
    pub fn insert_version(&self, client: &mut DataClient, version: i64) -> Result<()> {
        let table = self.table(client);
        client.insert(
            &table,
            &[VERSION_COLUMN, GROUP_COLUMN],
            Some(vec![
                SqlValue::Int(version),
                SqlValue::Text(self.config.group.clone()),
            ]),
        )?;
        Ok(())
    }

    /// Forgets `version`.
    ///
    /// # Errors
    ///
    /// Returns the client failure.
    pub fn remove_version(&self, client: &mut DataClient, version: i64) -> Result<()> {
        let table = self.table(client);
        let filter = Filter::eq(VERSION_COLUMN, version).and(self.group_filter());
        client.delete(&table, Some(&filter))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults_from_partial_json() {
        let config = VersionTableConfig::from_json(r#"{"group": "reporting"}"#).unwrap();
        assert_eq!(config.table_name, DEFAULT_VERSION_TABLE);
        assert_eq!(config.group, "reporting");
        assert_eq!(config.schema, None);
    }

    #[test]
    fn test_config_rejects_malformed_json() {
        assert!(VersionTableConfig::from_json("{").is_err());
    }

    #[test]
    fn test_repository_round_trip() {
        let mut client = strata_sqlite::memory_client().unwrap();
        let repo = VersionRepository::new(VersionTableConfig::new());

        repo.ensure_version_table(&mut client).unwrap();
        repo.ensure_version_table(&mut client).unwrap();
        assert_eq!(repo.current_version(&mut client).unwrap(), 0);

        repo.insert_version(&mut client, 3).unwrap();
        repo.insert_version(&mut client, 1).unwrap();
        assert_eq!(
            repo.applied_versions(&mut client).unwrap(),
            BTreeSet::from([1, 3])
        );
        assert_eq!(repo.current_version(&mut client).unwrap(), 3);

        repo.remove_version(&mut client, 3).unwrap();
        assert_eq!(repo.current_version(&mut client).unwrap(), 1);
    }

    #[test]
    fn test_groups_are_isolated() {
        let mut client = strata_sqlite::memory_client().unwrap();
        let main = VersionRepository::new(VersionTableConfig::new());
        let other = VersionRepository::new(VersionTableConfig::new().group("reporting"));
        main.ensure_version_table(&mut client).unwrap();

        main.insert_version(&mut client, 1).unwrap();
        other.insert_version(&mut client, 2).unwrap();
        assert_eq!(main.applied_versions(&mut client).unwrap(), BTreeSet::from([1]));
        assert_eq!(other.applied_versions(&mut client).unwrap(), BTreeSet::from([2]));
    }

    #[test]
    fn test_reading_without_table_creates_nothing() {
        let mut client = strata_sqlite::memory_client().unwrap();
        let repo = VersionRepository::new(VersionTableConfig::new());

        assert!(repo.applied_versions(&mut client).unwrap().is_empty());
        assert_eq!(repo.current_version(&mut client).unwrap(), 0);
        assert!(!client.table_exists(DEFAULT_VERSION_TABLE).unwrap());
    }

    #[test]
    fn test_group_column_defaults_to_default_group() {
        let mut client = strata_sqlite::memory_client().unwrap();
        let repo = VersionRepository::new(VersionTableConfig::new());
        repo.ensure_version_table(&mut client).unwrap();

        client
            .insert(DEFAULT_VERSION_TABLE, &[VERSION_COLUMN], Some(vec![SqlValue::Int(5)]))
            .unwrap();
        assert_eq!(repo.current_version(&mut client).unwrap(), 5);

        let reporting = VersionRepository::new(VersionTableConfig::new().group("reporting"));
        assert!(reporting.applied_versions(&mut client).unwrap().is_empty());
    }

    #[test]
    fn test_table_uses_configured_schema() {
        let client = strata_sqlite::memory_client().unwrap();
        let repo = VersionRepository::new(VersionTableConfig::new().schema("main").table_name("v"));
        assert_eq!(repo.table(&client), "main.v");
    }
}

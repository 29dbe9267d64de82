//! Error types for the migration system.

/// Errors that can occur during migration operations.
#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    /// Rollback was requested for a migration without down logic.
    #[error("Migration {version} in group '{group}' is not reversible")]
    MigrationNotReversible {
        /// The migration version.
        version: i64,
        /// The migration group.
        group: String,
    },

    /// Two migrations of one group share a version number.
    #[error("Version {version} is declared more than once in group '{group}'")]
    VersionConflict {
        /// The duplicated version.
        version: i64,
        /// The migration group.
        group: String,
    },

    /// A version was requested that no known migration carries.
    #[error("No migration with version {version} in group '{group}'")]
    UnknownVersion {
        /// The requested version.
        version: i64,
        /// The migration group.
        group: String,
    },

    /// A migration name does not start with a version number.
    #[error("Migration name '{0}' does not start with a version number")]
    InvalidName(String),

    /// The up or down logic of a migration failed.
    #[error("Migration {version} failed: {source}")]
    MigrationFailed {
        /// The failing migration.
        version: i64,
        /// What went wrong.
        #[source]
        source: strata_core::Error,
    },

    /// Reading or writing the version table failed.
    #[error("Database error: {0}")]
    Client(#[from] strata_core::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;

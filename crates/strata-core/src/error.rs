//! Error types for SQL generation and execution.

use std::fmt;

use crate::parameter::Parameter;

/// The broad category of a failure reported by an execution backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseErrorKind {
    /// The object being created (table, index, constraint...) already exists.
    AlreadyExists,
    /// The connection was closed before the call.
    Closed,
    /// Anything else.
    Other,
}

/// A failure reported by a [`Database`](crate::database::Database) implementation.
#[derive(Debug)]
pub struct DatabaseError {
    kind: DatabaseErrorKind,
    message: String,
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl DatabaseError {
    /// Creates a new error of kind [`DatabaseErrorKind::Other`].
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            kind: DatabaseErrorKind::Other,
            message: message.into(),
            source: None,
        }
    }

    /// Creates an error for a call made on a closed connection.
    #[must_use]
    pub fn closed() -> Self {
        Self::new("connection is closed").with_kind(DatabaseErrorKind::Closed)
    }

    /// Sets the error kind.
    #[must_use]
    pub fn with_kind(mut self, kind: DatabaseErrorKind) -> Self {
        self.kind = kind;
        self
    }

    /// Attaches the underlying driver error.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns the error kind.
    #[must_use]
    pub fn kind(&self) -> DatabaseErrorKind {
        self.kind
    }

    /// Returns the error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns true when the failure means the object already exists.
    #[must_use]
    pub fn is_already_exists(&self) -> bool {
        self.kind == DatabaseErrorKind::AlreadyExists
    }
}

impl fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for DatabaseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Errors raised while rendering or executing statements.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The active dialect has no rendering for the requested statement shape.
    #[error("{operation} is not supported by the {dialect} dialect")]
    UnsupportedOperation {
        /// Dialect name.
        dialect: &'static str,
        /// Description of the rejected operation.
        operation: String,
    },

    /// The backend failed to execute a statement.
    #[error("failed to execute `{sql}` with {} parameter(s): {source}", .parameters.len())]
    SqlExecution {
        /// The statement text.
        sql: String,
        /// The parameters bound to the statement.
        parameters: Vec<Parameter>,
        /// The backend failure.
        #[source]
        source: DatabaseError,
    },

    /// Placeholders and bound values disagree in count.
    #[error("statement has {placeholders} placeholder(s) but {values} value(s)")]
    ParameterMismatch {
        /// Number of placeholders rendered.
        placeholders: usize,
        /// Number of values extracted.
        values: usize,
    },

    /// The caller passed arguments that cannot form a statement.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    /// Shorthand for [`Error::UnsupportedOperation`].
    #[must_use]
    pub fn unsupported(dialect: &'static str, operation: impl Into<String>) -> Self {
        Self::UnsupportedOperation {
            dialect,
            operation: operation.into(),
        }
    }

    /// Returns true when the backend reported that the object already exists.
    #[must_use]
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::SqlExecution { source, .. } if source.is_already_exists())
    }
}

/// Result type for statement generation and execution.
pub type Result<T> = std::result::Result<T, Error>;

//! The execution contract.
//!
//! A [`Database`] runs statement text against a live connection. It knows
//! nothing about dialects; [`DataClient`](crate::client::DataClient) renders
//! the SQL and hands it over together with its parameters, where position `i`
//! of the parameter slice binds placeholder `i`.
//!
//! Calls are blocking. Implementations own their connection and any
//! transaction that is open on it; nothing here begins a transaction.

use crate::error::DatabaseError;
use crate::parameter::Parameter;
use crate::value::{ResultSet, SqlValue};

/// Result type for execution backends.
pub type DbResult<T> = std::result::Result<T, DatabaseError>;

/// A connection able to execute SQL.
pub trait Database: Send {
    /// Executes a statement without parameters, returning affected rows.
    ///
    /// # Errors
    ///
    /// Returns the backend failure.
    fn execute(&mut self, sql: &str) -> DbResult<u64> {
        self.execute_with(sql, &[])
    }

    /// Executes a statement with parameters, returning affected rows.
    ///
    /// # Errors
    ///
    /// Returns the backend failure.
    fn execute_with(&mut self, sql: &str, parameters: &[Parameter]) -> DbResult<u64>;

    /// Executes a statement carrying exactly one [`Parameter::Out`] slot and
    /// returns the value the database wrote into it.
    ///
    /// # Errors
    ///
    /// Returns the backend failure, or an error when no value was produced.
    fn execute_returning(&mut self, sql: &str, parameters: &[Parameter]) -> DbResult<SqlValue>;

    /// Runs a query without parameters.
    ///
    /// # Errors
    ///
    /// Returns the backend failure.
    fn query(&mut self, sql: &str) -> DbResult<ResultSet> {
        self.query_with(sql, &[])
    }

    /// Runs a query with parameters.
    ///
    /// # Errors
    ///
    /// Returns the backend failure.
    fn query_with(&mut self, sql: &str, parameters: &[Parameter]) -> DbResult<ResultSet>;

    /// Runs a query and returns the first column of the first row, or
    /// [`SqlValue::Null`] for an empty result.
    ///
    /// # Errors
    ///
    /// Returns the backend failure.
    fn query_scalar(&mut self, sql: &str) -> DbResult<SqlValue> {
        self.query_scalar_with(sql, &[])
    }

    /// Parameterized form of [`Database::query_scalar`].
    ///
    /// # Errors
    ///
    /// Returns the backend failure.
    fn query_scalar_with(&mut self, sql: &str, parameters: &[Parameter]) -> DbResult<SqlValue> {
        let rows = self.query_with(sql, parameters)?;
        Ok(rows.value(0, 0).cloned().unwrap_or(SqlValue::Null))
    }

    /// Commits the open transaction, if any.
    ///
    /// # Errors
    ///
    /// Returns the backend failure.
    fn commit(&mut self) -> DbResult<()>;

    /// Rolls back the open transaction, if any.
    ///
    /// # Errors
    ///
    /// Returns the backend failure.
    fn rollback(&mut self) -> DbResult<()>;

    /// Closes the connection. Later calls fail with
    /// [`DatabaseErrorKind::Closed`](crate::error::DatabaseErrorKind::Closed).
    ///
    /// # Errors
    ///
    /// Returns the backend failure.
    fn close(&mut self) -> DbResult<()>;
}

//! [`Database`] implementation over a single sqlx SQLite connection.
//!
//! sqlx is async; the execution contract is blocking. Each `SqliteDatabase`
//! owns a current-thread tokio runtime and blocks on it for every call, so it
//! must not be used from inside another tokio runtime.

use std::str::FromStr;

use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqliteConnection, SqliteRow};
use sqlx::{Column as _, Connection, Row, Sqlite, TypeInfo, ValueRef};
use strata_core::database::{Database, DbResult};
use strata_core::error::{DatabaseError, DatabaseErrorKind};
use strata_core::parameter::Parameter;
use strata_core::value::{ResultSet, SqlValue};
use tokio::runtime::Runtime;
use tracing::debug;

/// Connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqliteOptions {
    /// Connection URL, e.g. `sqlite://app.db` or `sqlite::memory:`.
    pub url: String,
    /// When true, the first statement opens a transaction that stays open
    /// until [`Database::commit`] or [`Database::rollback`].
    pub transactional: bool,
}

impl SqliteOptions {
    /// Options for `url` in autocommit mode.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            transactional: false,
        }
    }

    /// Options for a private in-memory database.
    #[must_use]
    pub fn memory() -> Self {
        Self::new("sqlite::memory:")
    }

    /// Sets transactional mode.
    #[must_use]
    pub fn transactional(mut self, transactional: bool) -> Self {
        self.transactional = transactional;
        self
    }
}

/// A blocking SQLite connection.
pub struct SqliteDatabase {
    runtime: Runtime,
    conn: Option<SqliteConnection>,
    transactional: bool,
    in_transaction: bool,
}

impl std::fmt::Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteDatabase")
            .field("open", &self.conn.is_some())
            .field("transactional", &self.transactional)
            .field("in_transaction", &self.in_transaction)
            .finish_non_exhaustive()
    }
}

impl SqliteDatabase {
    /// Opens a connection, creating the database file if needed.
    ///
    /// # Errors
    ///
    /// Fails when the URL is invalid or the database cannot be opened.
    pub fn open(options: &SqliteOptions) -> DbResult<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| {
                DatabaseError::new(format!("failed to start runtime: {e}")).with_source(e)
            })?;
        let connect = SqliteConnectOptions::from_str(&options.url)
            .map_err(database_error)?
            .create_if_missing(true);
        let conn = runtime
            .block_on(SqliteConnection::connect_with(&connect))
            .map_err(database_error)?;
        debug!(url = %options.url, "Opened SQLite connection");
        Ok(Self {
            runtime,
            conn: Some(conn),
            transactional: options.transactional,
            in_transaction: false,
        })
    }

    /// Opens a private in-memory database in autocommit mode.
    ///
    /// # Errors
    ///
    /// Fails when SQLite cannot be opened.
    pub fn memory() -> DbResult<Self> {
        Self::open(&SqliteOptions::memory())
    }

    /// Returns true while a transaction is open.
    #[must_use]
    pub fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    fn begin_if_needed(&mut self) -> DbResult<()> {
        if !self.transactional || self.in_transaction {
            return Ok(());
        }
        self.run_plain("BEGIN")?;
        self.in_transaction = true;
        Ok(())
    }

    fn run_plain(&mut self, sql: &str) -> DbResult<()> {
        let conn = self.conn.as_mut().ok_or_else(DatabaseError::closed)?;
        self.runtime
            .block_on(sqlx::query(sql).execute(&mut *conn))
            .map_err(database_error)?;
        Ok(())
    }

    fn fetch_all(&mut self, sql: &str, parameters: &[Parameter]) -> DbResult<Vec<SqliteRow>> {
        self.begin_if_needed()?;
        let conn = self.conn.as_mut().ok_or_else(DatabaseError::closed)?;
        let query = bind_all(sqlx::query(sql), parameters);
        self.runtime
            .block_on(query.fetch_all(&mut *conn))
            .map_err(database_error)
    }
}

impl Database for SqliteDatabase {
    fn execute_with(&mut self, sql: &str, parameters: &[Parameter]) -> DbResult<u64> {
        self.begin_if_needed()?;
        let conn = self.conn.as_mut().ok_or_else(DatabaseError::closed)?;
        let query = bind_all(sqlx::query(sql), parameters);
        let result = self
            .runtime
            .block_on(query.execute(&mut *conn))
            .map_err(database_error)?;
        Ok(result.rows_affected())
    }

    fn execute_returning(&mut self, sql: &str, parameters: &[Parameter]) -> DbResult<SqlValue> {
        let out = parameters
            .iter()
            .find_map(|p| match p {
                Parameter::Out(out) => Some(out.name.clone()),
                Parameter::In(_) => None,
            })
            .ok_or_else(|| DatabaseError::new("statement has no output parameter"))?;
        let rows = self.fetch_all(sql, parameters)?;
        let row = rows
            .first()
            .ok_or_else(|| DatabaseError::new(format!("no value returned for {out}")))?;
        decode(row, 0)
    }

    fn query_with(&mut self, sql: &str, parameters: &[Parameter]) -> DbResult<ResultSet> {
        let rows = self.fetch_all(sql, parameters)?;
        let columns = rows
            .first()
            .map(|row| row.columns().iter().map(|c| c.name().to_string()).collect())
            .unwrap_or_default();
        let values = rows
            .iter()
            .map(|row| (0..row.len()).map(|i| decode(row, i)).collect())
            .collect::<DbResult<Vec<Vec<SqlValue>>>>()?;
        Ok(ResultSet::new(columns, values))
    }

    fn commit(&mut self) -> DbResult<()> {
        if self.in_transaction {
            self.run_plain("COMMIT")?;
            self.in_transaction = false;
        }
        Ok(())
    }

    fn rollback(&mut self) -> DbResult<()> {
        if self.in_transaction {
            self.run_plain("ROLLBACK")?;
            self.in_transaction = false;
        }
        Ok(())
    }

    fn close(&mut self) -> DbResult<()> {
        // An open transaction is discarded by SQLite when the connection closes.
        if let Some(conn) = self.conn.take() {
            self.in_transaction = false;
            self.runtime.block_on(conn.close()).map_err(database_error)?;
            debug!("Closed SQLite connection");
        }
        Ok(())
    }
}

/// Binds the input parameters in order; output slots bind nothing.
fn bind_all<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    parameters: &[Parameter],
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for parameter in parameters {
        if let Parameter::In(p) = parameter {
            query = bind_value(query, p.value.clone());
        }
    }
    query
}

fn bind_value<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: SqlValue,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        SqlValue::Null => query.bind(Option::<i64>::None),
        SqlValue::Bool(b) => query.bind(b),
        SqlValue::Int(i) => query.bind(i),
        SqlValue::Float(f) => query.bind(f),
        SqlValue::Text(s) => query.bind(s),
        SqlValue::Blob(b) => query.bind(b),
    }
}

/// Decodes one cell by the storage class SQLite reports for it.
fn decode(row: &SqliteRow, index: usize) -> DbResult<SqlValue> {
    let raw = row.try_get_raw(index).map_err(database_error)?;
    if raw.is_null() {
        return Ok(SqlValue::Null);
    }
    let storage = raw.type_info().name().to_string();
    let value = match storage.as_str() {
        "REAL" => SqlValue::Float(row.try_get_unchecked(index).map_err(database_error)?),
        "TEXT" | "DATE" | "TIME" | "DATETIME" => {
            SqlValue::Text(row.try_get_unchecked(index).map_err(database_error)?)
        }
        "BLOB" => SqlValue::Blob(row.try_get_unchecked(index).map_err(database_error)?),
        "BOOLEAN" => SqlValue::Bool(row.try_get_unchecked(index).map_err(database_error)?),
        _ => SqlValue::Int(row.try_get_unchecked(index).map_err(database_error)?),
    };
    Ok(value)
}

/// SQLite messages that mean the created object is already there.
const ALREADY_EXISTS: [&str; 2] = ["already exists", "duplicate column name"];

fn database_error(error: sqlx::Error) -> DatabaseError {
    let message = error.to_string();
    let kind = if ALREADY_EXISTS.iter().any(|m| message.contains(m)) {
        DatabaseErrorKind::AlreadyExists
    } else {
        DatabaseErrorKind::Other
    };
    DatabaseError::new(message).with_kind(kind).with_source(error)
}

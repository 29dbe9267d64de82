//! Statement orchestration.
//!
//! [`DataClient`] turns schema and data operations into dialect SQL and runs
//! it on a [`Database`]. Operations that need several statements run them in
//! order and stop at the first failure; the remaining statements are never
//! sent. Every operation runs inside whatever transaction the connection has
//! open, and none of them commits.

use tracing::{debug, warn};

use crate::database::Database;
use crate::dialect::Dialect;
use crate::error::{DatabaseError, Error, Result};
use crate::filter::Filter;
use crate::parameter::{inputs, InParameter, OutParameter, Parameter, ReturningInsert};
use crate::schema::{primary_key_name, qualify, Column, ForeignKey, Table};
use crate::select::SelectQuery;
use crate::value::{ResultSet, SqlValue};

/// Client behaviour settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Schema applied to unqualified table names when the client is built
    /// without an explicit schema.
    pub default_schema: Option<String>,
    /// When false, create-style operations that fail because the object
    /// already exists log a warning instead of returning the error.
    pub strict: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            default_schema: None,
            strict: true,
        }
    }
}

impl ClientConfig {
    /// Creates the default configuration: no schema, strict.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default schema.
    #[must_use]
    pub fn default_schema(mut self, schema: impl Into<String>) -> Self {
        self.default_schema = Some(schema.into());
        self
    }

    /// Sets strict mode.
    #[must_use]
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

/// Executes schema and data operations through a dialect.
pub struct DataClient {
    database: Box<dyn Database>,
    dialect: Box<dyn Dialect>,
    schema: Option<String>,
    config: ClientConfig,
}

impl std::fmt::Debug for DataClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataClient")
            .field("dialect", &self.dialect.name())
            .field("schema", &self.schema)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl DataClient {
    /// Creates a client. Without an explicit `schema` the configured default
    /// schema, if any, applies.
    #[must_use]
    pub fn new(
        database: Box<dyn Database>,
        dialect: Box<dyn Dialect>,
        schema: Option<String>,
        config: ClientConfig,
    ) -> Self {
        let schema = schema.or_else(|| config.default_schema.clone());
        Self {
            database,
            dialect,
            schema,
            config,
        }
    }

    /// Schema applied to unqualified table names.
    #[must_use]
    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    /// The active dialect.
    #[must_use]
    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    /// The client configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Qualifies `name` with the client schema unless it already names one.
    #[must_use]
    pub fn table_name(&self, name: &str) -> String {
        if name.contains('.') {
            name.to_string()
        } else {
            qualify(self.schema.as_deref(), name)
        }
    }

    // ---- execution ----

    fn failure(sql: &str, parameters: &[Parameter], source: DatabaseError) -> Error {
        Error::SqlExecution {
            sql: sql.to_string(),
            parameters: parameters.to_vec(),
            source,
        }
    }

    /// Executes one statement.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SqlExecution`] with the statement and its parameters.
    pub fn execute(&mut self, sql: &str, parameters: &[Parameter]) -> Result<u64> {
        debug!(sql = %sql, parameters = parameters.len(), "Executing SQL");
        self.database
            .execute_with(sql, parameters)
            .map_err(|e| Self::failure(sql, parameters, e))
    }

    /// Executes statements in order, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SqlExecution`] for the first failing statement.
    pub fn execute_all(&mut self, sqls: &[String]) -> Result<u64> {
        let mut affected = 0;
        for sql in sqls {
            affected += self.execute(sql, &[])?;
        }
        Ok(affected)
    }

    fn query(&mut self, sql: &str, parameters: &[Parameter]) -> Result<ResultSet> {
        debug!(sql = %sql, parameters = parameters.len(), "Running query");
        let result = if parameters.is_empty() {
            self.database.query(sql)
        } else {
            self.database.query_with(sql, parameters)
        };
        result.map_err(|e| Self::failure(sql, parameters, e))
    }

    fn query_scalar(&mut self, sql: &str, parameters: &[Parameter]) -> Result<SqlValue> {
        debug!(sql = %sql, parameters = parameters.len(), "Running scalar query");
        let result = if parameters.is_empty() {
            self.database.query_scalar(sql)
        } else {
            self.database.query_scalar_with(sql, parameters)
        };
        result.map_err(|e| Self::failure(sql, parameters, e))
    }

    /// Runs a create-style batch, honouring lenient mode.
    fn create(&mut self, what: &str, sqls: &[String]) -> Result<()> {
        match self.execute_all(sqls) {
            Ok(_) => Ok(()),
            Err(e) if !self.config.strict && e.is_already_exists() => {
                warn!(object = %what, error = %e, "Object already exists, skipping");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    // ---- schema operations ----

    /// Creates a table.
    ///
    /// # Errors
    ///
    /// Fails on rendering or execution errors.
    pub fn add_table(&mut self, name: &str, columns: Vec<Column>) -> Result<()> {
        let table = Table {
            name: self.table_name(name),
            columns,
        };
        let sqls = self.dialect.create_table_sqls(&table)?;
        self.create(&table.name, &sqls)
    }

    /// Drops a table.
    ///
    /// # Errors
    ///
    /// Fails on execution errors.
    pub fn remove_table(&mut self, name: &str) -> Result<()> {
        let sqls = self.dialect.drop_table_sqls(&self.table_name(name));
        self.execute_all(&sqls).map(drop)
    }

    /// Adds a primary key named `pk_<table>`.
    ///
    /// # Errors
    ///
    /// Fails on rendering or execution errors.
    pub fn add_primary_key<S: AsRef<str>>(&mut self, table: &str, columns: &[S]) -> Result<()> {
        self.add_named_primary_key(table, &primary_key_name(table), columns)
    }

    /// Adds a primary key with an explicit constraint name.
    ///
    /// # Errors
    ///
    /// Fails on rendering or execution errors.
    pub fn add_named_primary_key<S: AsRef<str>>(
        &mut self,
        table: &str,
        name: &str,
        columns: &[S],
    ) -> Result<()> {
        let sql = self
            .dialect
            .primary_key_sql(&self.table_name(table), name, &owned(columns))?;
        self.create(name, &[sql])
    }

    /// Drops the primary key named `pk_<table>`.
    ///
    /// # Errors
    ///
    /// Fails on rendering or execution errors.
    pub fn remove_primary_key(&mut self, table: &str) -> Result<()> {
        self.remove_named_primary_key(table, &primary_key_name(table))
    }

    /// Drops a named primary key.
    ///
    /// # Errors
    ///
    /// Fails on rendering or execution errors.
    pub fn remove_named_primary_key(&mut self, table: &str, name: &str) -> Result<()> {
        let sql = self.dialect.drop_primary_key_sql(&self.table_name(table), name)?;
        self.execute(&sql, &[]).map(drop)
    }

    /// Adds a foreign key.
    ///
    /// # Errors
    ///
    /// Fails on rendering or execution errors.
    pub fn add_foreign_key(&mut self, fk: &ForeignKey) -> Result<()> {
        let qualified = ForeignKey {
            table: self.table_name(&fk.table),
            referenced_table: self.table_name(&fk.referenced_table),
            ..fk.clone()
        };
        let sql = self.dialect.foreign_key_sql(&qualified)?;
        self.create(&fk.name, &[sql])
    }

    /// Drops a foreign key.
    ///
    /// # Errors
    ///
    /// Fails on rendering or execution errors.
    pub fn remove_foreign_key(&mut self, name: &str, table: &str) -> Result<()> {
        let sql = self.dialect.drop_foreign_key_sql(name, &self.table_name(table))?;
        self.execute(&sql, &[]).map(drop)
    }

    /// Adds a unique key.
    ///
    /// # Errors
    ///
    /// Fails on rendering or execution errors.
    pub fn add_unique_key<S: AsRef<str>>(
        &mut self,
        name: &str,
        table: &str,
        columns: &[S],
    ) -> Result<()> {
        let sql = self
            .dialect
            .unique_key_sql(name, &self.table_name(table), &owned(columns))?;
        self.create(name, &[sql])
    }

    /// Drops a unique key.
    ///
    /// # Errors
    ///
    /// Fails on rendering or execution errors.
    pub fn remove_unique_key(&mut self, name: &str, table: &str) -> Result<()> {
        let sql = self.dialect.drop_unique_key_sql(name, &self.table_name(table))?;
        self.execute(&sql, &[]).map(drop)
    }

    /// Creates an index.
    ///
    /// # Errors
    ///
    /// Fails on execution errors.
    pub fn add_index<S: AsRef<str>>(
        &mut self,
        name: &str,
        table: &str,
        columns: &[S],
    ) -> Result<()> {
        let sql = self
            .dialect
            .create_index_sql(name, &self.table_name(table), &owned(columns));
        self.create(name, &[sql])
    }

    /// Drops an index.
    ///
    /// # Errors
    ///
    /// Fails on execution errors.
    pub fn remove_index(&mut self, name: &str, table: &str) -> Result<()> {
        let sql = self.dialect.drop_index_sql(name, &self.table_name(table));
        self.execute(&sql, &[]).map(drop)
    }

    /// Adds a column.
    ///
    /// # Errors
    ///
    /// Fails on execution errors.
    pub fn add_column(&mut self, table: &str, column: &Column) -> Result<()> {
        let sql = self.dialect.add_column_sql(&self.table_name(table), column);
        self.create(&column.name, &[sql])
    }

    /// Drops a column, together with any constraint the dialect must drop first.
    ///
    /// # Errors
    ///
    /// Fails on execution errors.
    pub fn remove_column(&mut self, table: &str, column: &str) -> Result<()> {
        let sqls = self.dialect.drop_column_sqls(&self.table_name(table), column);
        self.execute_all(&sqls).map(drop)
    }

    /// Sets a table comment.
    ///
    /// # Errors
    ///
    /// Fails on rendering or execution errors.
    pub fn add_table_comment(&mut self, table: &str, comment: &str) -> Result<()> {
        let sql = self
            .dialect
            .add_table_comment_sql(&self.table_name(table), comment)?;
        self.execute(&sql, &[]).map(drop)
    }

    /// Removes a table comment.
    ///
    /// # Errors
    ///
    /// Fails on rendering or execution errors.
    pub fn remove_table_comment(&mut self, table: &str) -> Result<()> {
        let sql = self.dialect.remove_table_comment_sql(&self.table_name(table))?;
        self.execute(&sql, &[]).map(drop)
    }

    /// Sets a column comment.
    ///
    /// # Errors
    ///
    /// Fails on rendering or execution errors.
    pub fn add_column_comment(&mut self, table: &str, column: &str, comment: &str) -> Result<()> {
        let sql = self
            .dialect
            .add_column_comment_sql(&self.table_name(table), column, comment)?;
        self.execute(&sql, &[]).map(drop)
    }

    /// Removes a column comment.
    ///
    /// # Errors
    ///
    /// Fails on rendering or execution errors.
    pub fn remove_column_comment(&mut self, table: &str, column: &str) -> Result<()> {
        let sql = self
            .dialect
            .remove_column_comment_sql(&self.table_name(table), column)?;
        self.execute(&sql, &[]).map(drop)
    }

    /// Renames a table within its schema.
    ///
    /// # Errors
    ///
    /// Fails on execution errors.
    pub fn rename_table(&mut self, table: &str, new_name: &str) -> Result<()> {
        let sql = self.dialect.rename_table_sql(&self.table_name(table), new_name);
        self.execute(&sql, &[]).map(drop)
    }

    /// Renames a column.
    ///
    /// # Errors
    ///
    /// Fails on execution errors.
    pub fn rename_column(&mut self, table: &str, column: &str, new_name: &str) -> Result<()> {
        let sql = self
            .dialect
            .rename_column_sql(&self.table_name(table), column, new_name);
        self.execute(&sql, &[]).map(drop)
    }

    /// Changes a column to `definition`.
    ///
    /// # Errors
    ///
    /// Fails on rendering or execution errors.
    pub fn modify_column(&mut self, table: &str, column: &str, definition: &Column) -> Result<()> {
        let sqls = self
            .dialect
            .modify_column_sqls(&self.table_name(table), column, definition)?;
        self.execute_all(&sqls).map(drop)
    }

    /// Returns whether `table` exists.
    ///
    /// # Errors
    ///
    /// Fails on execution errors.
    pub fn table_exists(&mut self, table: &str) -> Result<bool> {
        let sql = self.dialect.table_exists_sql(&self.table_name(table));
        let value = self.query_scalar(&sql, &[])?;
        Ok(value.as_i64().unwrap_or(0) > 0)
    }

    // ---- data operations ----

    fn where_clause(
        &self,
        filter: Option<&Filter>,
        offset: usize,
    ) -> Result<(String, Vec<InParameter>)> {
        match filter {
            Some(f) => {
                let clause = self.dialect.where_sql(f, offset)?;
                Ok((format!(" {}", clause.sql), clause.parameters))
            }
            None => Ok((String::new(), Vec::new())),
        }
    }

    /// Runs a select.
    ///
    /// # Errors
    ///
    /// Fails on rendering or execution errors.
    pub fn select(&mut self, query: &SelectQuery) -> Result<ResultSet> {
        let mut query = query.clone();
        query.tables = query.tables.iter().map(|t| self.table_name(t)).collect();
        let built = query.build(self.dialect.as_ref())?;
        let parameters = if built.has_filter {
            inputs(built.parameters)
        } else {
            Vec::new()
        };
        self.query(&built.sql, &parameters)
    }

    /// Checks `values` against `columns`, substituting nulls when absent.
    fn row_values(columns: usize, values: Option<Vec<SqlValue>>) -> Result<Vec<SqlValue>> {
        match values {
            None => Ok(vec![SqlValue::Null; columns]),
            Some(v) if v.len() == columns => Ok(v),
            Some(v) => Err(Error::ParameterMismatch {
                placeholders: columns,
                values: v.len(),
            }),
        }
    }

    /// Inserts one row. Without `values` every column receives NULL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParameterMismatch`] when `values` and `columns`
    /// differ in length, or an execution error.
    pub fn insert<S: AsRef<str>>(
        &mut self,
        table: &str,
        columns: &[S],
        values: Option<Vec<SqlValue>>,
    ) -> Result<u64> {
        let values = Self::row_values(columns.len(), values)?;
        let sql = self.dialect.insert_sql(&self.table_name(table), &owned(columns));
        let parameters = inputs(self.dialect.convert_to_named_parameters(&values));
        self.execute(&sql, &parameters)
    }

    /// Renders an insert that reads `returning_column` back.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedOperation`] or [`Error::ParameterMismatch`].
    pub fn insert_returning_statement<S: AsRef<str>>(
        &self,
        table: &str,
        returning_column: &str,
        columns: &[S],
        values: Option<Vec<SqlValue>>,
    ) -> Result<ReturningInsert> {
        let values = Self::row_values(columns.len(), values)?;
        let out = OutParameter::returning(returning_column);
        let sql = self.dialect.insert_returning_sql(
            &self.table_name(table),
            &owned(columns),
            returning_column,
            &out,
        )?;
        Ok(ReturningInsert {
            sql,
            parameters: self.dialect.convert_to_named_parameters(&values),
            out,
        })
    }

    /// Inserts one row and returns the value of `returning_column`.
    ///
    /// # Errors
    ///
    /// Fails on rendering or execution errors.
    pub fn insert_returning<S: AsRef<str>>(
        &mut self,
        table: &str,
        returning_column: &str,
        columns: &[S],
        values: Option<Vec<SqlValue>>,
    ) -> Result<SqlValue> {
        let statement = self.insert_returning_statement(table, returning_column, columns, values)?;
        let parameters = statement.bound_parameters();
        debug!(sql = %statement.sql, parameters = parameters.len(), "Executing SQL");
        self.database
            .execute_returning(&statement.sql, &parameters)
            .map_err(|e| Self::failure(&statement.sql, &parameters, e))
    }

    /// Updates rows. SET values bind placeholders `0..k`, the filter's
    /// values follow from `k`.
    ///
    /// # Errors
    ///
    /// Fails on rendering or execution errors.
    pub fn update<S: AsRef<str>>(
        &mut self,
        table: &str,
        columns: &[S],
        values: Option<Vec<SqlValue>>,
        filter: Option<&Filter>,
    ) -> Result<u64> {
        if columns.is_empty() {
            return Err(Error::InvalidArgument(format!(
                "update of {table} sets no columns"
            )));
        }
        let values = Self::row_values(columns.len(), values)?;
        let mut sql = self.dialect.update_sql(&self.table_name(table), &owned(columns));
        let mut parameters = self.dialect.convert_to_named_parameters(&values);
        let (clause, filter_parameters) = self.where_clause(filter, parameters.len())?;
        sql.push_str(&clause);
        parameters.extend(filter_parameters);
        self.execute(&sql, &inputs(parameters))
    }

    /// Deletes rows matching `filter`, or every row without one.
    ///
    /// # Errors
    ///
    /// Fails on rendering or execution errors.
    pub fn delete(&mut self, table: &str, filter: Option<&Filter>) -> Result<u64> {
        let mut sql = self.dialect.delete_sql(&self.table_name(table));
        let (clause, parameters) = self.where_clause(filter, 0)?;
        sql.push_str(&clause);
        self.execute(&sql, &inputs(parameters))
    }

    /// Counts rows matching `filter`.
    ///
    /// # Errors
    ///
    /// Fails on rendering or execution errors.
    pub fn count(&mut self, table: &str, filter: Option<&Filter>) -> Result<i64> {
        let mut sql = self.dialect.count_sql(&self.table_name(table));
        let (clause, parameters) = self.where_clause(filter, 0)?;
        sql.push_str(&clause);
        let value = self.query_scalar(&sql, &inputs(parameters))?;
        Ok(value.as_i64().unwrap_or(0))
    }

    /// Returns whether any row matches `filter`.
    ///
    /// # Errors
    ///
    /// Fails on rendering or execution errors.
    pub fn exists(&mut self, table: &str, filter: Option<&Filter>) -> Result<bool> {
        let clause = filter.map(|f| self.dialect.where_sql(f, 0)).transpose()?;
        let sql = self.dialect.exists_sql(
            &self.table_name(table),
            clause.as_ref().map(|c| c.sql.as_str()),
        );
        let parameters = clause.map(|c| inputs(c.parameters)).unwrap_or_default();
        let value = self.query_scalar(&sql, &parameters)?;
        Ok(value.as_i64().unwrap_or(0) > 0)
    }

    // ---- lifecycle ----

    /// Commits the open transaction.
    ///
    /// # Errors
    ///
    /// Fails when the backend does.
    pub fn commit(&mut self) -> Result<()> {
        debug!("Committing");
        self.database
            .commit()
            .map_err(|e| Self::failure("COMMIT", &[], e))
    }

    /// Rolls back the open transaction.
    ///
    /// # Errors
    ///
    /// Fails when the backend does.
    pub fn rollback(&mut self) -> Result<()> {
        debug!("Rolling back");
        self.database
            .rollback()
            .map_err(|e| Self::failure("ROLLBACK", &[], e))
    }

    /// Closes the connection.
    ///
    /// # Errors
    ///
    /// Fails when the backend does.
    pub fn close(&mut self) -> Result<()> {
        self.database
            .close()
            .map_err(|e| Self::failure("CLOSE", &[], e))
    }
}

fn owned<S: AsRef<str>>(items: &[S]) -> Vec<String> {
    items.iter().map(|s| s.as_ref().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::database::DbResult;
    use crate::dialect::{PostgresDialect, SqlServerDialect, SqliteDialect};
    use crate::error::DatabaseErrorKind;

    /// Statement log shared between the fake and the test.
    type Log = Arc<Mutex<Vec<(String, Vec<Parameter>)>>>;

    /// Records statements; fails those containing `fail_on`.
    #[derive(Default)]
    struct Recorder {
        log: Log,
        fail_on: Option<(String, DatabaseErrorKind)>,
        scalar: Option<SqlValue>,
    }

    impl Recorder {
        fn record(&self, sql: &str, parameters: &[Parameter]) -> DbResult<()> {
            self.log
                .lock()
                .unwrap()
                .push((sql.to_string(), parameters.to_vec()));
            match self.fail_on {
                Some((ref needle, kind)) if sql.contains(needle.as_str()) => {
                    Err(DatabaseError::new("boom").with_kind(kind))
                }
                _ => Ok(()),
            }
        }
    }

    impl Database for Recorder {
        fn execute_with(&mut self, sql: &str, parameters: &[Parameter]) -> DbResult<u64> {
            self.record(sql, parameters).map(|()| 1)
        }

        fn execute_returning(&mut self, sql: &str, parameters: &[Parameter]) -> DbResult<SqlValue> {
            self.record(sql, parameters).map(|()| SqlValue::Int(7))
        }

        fn query_with(&mut self, sql: &str, parameters: &[Parameter]) -> DbResult<ResultSet> {
            self.record(sql, parameters)?;
            let value = self.scalar.clone().unwrap_or(SqlValue::Int(0));
            Ok(ResultSet::new(vec!["value".into()], vec![vec![value]]))
        }

        fn commit(&mut self) -> DbResult<()> {
            self.record("COMMIT", &[])
        }

        fn rollback(&mut self) -> DbResult<()> {
            self.record("ROLLBACK", &[])
        }

        fn close(&mut self) -> DbResult<()> {
            Ok(())
        }
    }

    fn client_with(dialect: Box<dyn Dialect>, recorder: Recorder) -> (DataClient, Log) {
        let log = Arc::clone(&recorder.log);
        let client = DataClient::new(Box::new(recorder), dialect, None, ClientConfig::default());
        (client, log)
    }

    fn sqlite() -> (DataClient, Log) {
        client_with(Box::new(SqliteDialect::new()), Recorder::default())
    }

    fn values(params: &[Parameter]) -> Vec<Option<SqlValue>> {
        params.iter().map(|p| p.value().cloned()).collect()
    }

    #[test]
    fn test_update_threads_offset_past_set_clause() {
        let (mut client, log) = client_with(Box::new(PostgresDialect::new()), Recorder::default());
        let filter = Filter::is_null("deleted_at").and(Filter::eq("id", 5));
        client
            .update(
                "users",
                &["name", "age"],
                Some(vec!["Bob".into(), SqlValue::Int(31)]),
                Some(&filter),
            )
            .unwrap();

        let log = log.lock().unwrap();
        let (sql, params) = &log[0];
        assert_eq!(
            sql,
            "UPDATE \"users\" SET \"name\" = $1, \"age\" = $2 \
             WHERE (\"deleted_at\" IS NULL) AND (\"id\" = $3)"
        );
        let names: Vec<&str> = params.iter().map(Parameter::name).collect();
        assert_eq!(names, vec!["par0", "par1", "par2"]);
        assert_eq!(params[2].value(), Some(&SqlValue::Int(5)));
    }

    #[test]
    fn test_insert_without_values_binds_nulls() {
        let (mut client, log) = sqlite();
        client.insert("t", &["a", "b"], None).unwrap();
        let log = log.lock().unwrap();
        assert_eq!(log[0].0, "INSERT INTO \"t\" (\"a\", \"b\") VALUES (?1, ?2)");
        assert_eq!(
            values(&log[0].1),
            vec![Some(SqlValue::Null), Some(SqlValue::Null)]
        );
    }

    #[test]
    fn test_insert_length_mismatch() {
        let (mut client, log) = sqlite();
        let err = client
            .insert("t", &["a", "b"], Some(vec![SqlValue::Int(1)]))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::ParameterMismatch {
                placeholders: 2,
                values: 1
            }
        ));
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_multi_statement_batch_stops_at_first_failure() {
        let recorder = Recorder {
            fail_on: Some(("sys.default_constraints".into(), DatabaseErrorKind::Other)),
            ..Recorder::default()
        };
        let (mut client, log) = client_with(Box::new(SqlServerDialect::new()), recorder);
        let err = client.remove_column("users", "age").unwrap_err();

        match err {
            Error::SqlExecution { ref sql, .. } => assert!(sql.contains("sys.default_constraints")),
            ref other => panic!("unexpected error: {other}"),
        }
        // The DROP COLUMN was never sent.
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_lenient_mode_suppresses_already_exists() {
        let failing = || Recorder {
            fail_on: Some(("CREATE TABLE".into(), DatabaseErrorKind::AlreadyExists)),
            ..Recorder::default()
        };
        let columns = || vec![Column::integer("id")];

        let mut strict = DataClient::new(
            Box::new(failing()),
            Box::new(SqliteDialect::new()),
            None,
            ClientConfig::default(),
        );
        assert!(strict.add_table("t", columns()).unwrap_err().is_already_exists());

        let mut lenient = DataClient::new(
            Box::new(failing()),
            Box::new(SqliteDialect::new()),
            None,
            ClientConfig::new().strict(false),
        );
        lenient.add_table("t", columns()).unwrap();
    }

    #[test]
    fn test_lenient_mode_keeps_other_failures() {
        let recorder = Recorder {
            fail_on: Some(("DROP TABLE".into(), DatabaseErrorKind::AlreadyExists)),
            ..Recorder::default()
        };
        let mut client = DataClient::new(
            Box::new(recorder),
            Box::new(SqliteDialect::new()),
            None,
            ClientConfig::new().strict(false),
        );
        assert!(client.remove_table("t").is_err());
    }

    #[test]
    fn test_default_schema_flows_into_client() {
        // The configured default fills in a missing schema, not the other way round.
        let client = DataClient::new(
            Box::new(Recorder::default()),
            Box::new(PostgresDialect::new()),
            None,
            ClientConfig::new().default_schema("app"),
        );
        assert_eq!(client.schema(), Some("app"));
        assert_eq!(client.config().default_schema.as_deref(), Some("app"));
        assert_eq!(client.table_name("users"), "app.users");
        assert_eq!(client.table_name("other.users"), "other.users");

        let explicit = DataClient::new(
            Box::new(Recorder::default()),
            Box::new(PostgresDialect::new()),
            Some("tenant".into()),
            ClientConfig::new().default_schema("app"),
        );
        assert_eq!(explicit.schema(), Some("tenant"));
    }

    #[test]
    fn test_select_without_filter_passes_no_parameters() {
        let (mut client, log) = sqlite();
        client.select(&SelectQuery::from("t")).unwrap();
        client
            .select(&SelectQuery::from("t").filter(Filter::eq("a", 1)))
            .unwrap();
        let log = log.lock().unwrap();
        assert!(log[0].1.is_empty());
        assert_eq!(log[1].1.len(), 1);
    }

    #[test]
    fn test_delete_and_count_start_at_zero() {
        let recorder = Recorder {
            scalar: Some(SqlValue::Int(3)),
            ..Recorder::default()
        };
        let (mut client, log) = client_with(Box::new(PostgresDialect::new()), recorder);
        let filter = Filter::eq("name", "Alice");
        client.delete("users", Some(&filter)).unwrap();
        assert_eq!(client.count("users", Some(&filter)).unwrap(), 3);

        let log = log.lock().unwrap();
        assert_eq!(log[0].0, "DELETE FROM \"users\" WHERE \"name\" = $1");
        assert_eq!(log[1].0, "SELECT COUNT(*) FROM \"users\" WHERE \"name\" = $1");
        assert_eq!(log[1].1[0].name(), "par0");
    }

    #[test]
    fn test_exists_and_table_exists() {
        let recorder = Recorder {
            scalar: Some(SqlValue::Int(1)),
            ..Recorder::default()
        };
        let (mut client, log) = client_with(Box::new(SqliteDialect::new()), recorder);
        assert!(client.exists("t", Some(&Filter::eq("a", 1))).unwrap());
        assert!(client.table_exists("t").unwrap());
        let log = log.lock().unwrap();
        assert!(log[0].0.starts_with("SELECT CASE WHEN EXISTS"));
        assert!(log[1].0.contains("sqlite_master"));
    }

    #[test]
    fn test_insert_returning_binds_out_slot_last() {
        let (mut client, log) = client_with(Box::new(SqlServerDialect::new()), Recorder::default());
        let id = client
            .insert_returning("users", "id", &["name"], Some(vec!["Ann".into()]))
            .unwrap();
        assert_eq!(id, SqlValue::Int(7));

        let log = log.lock().unwrap();
        assert_eq!(
            log[0].0,
            "INSERT INTO [users] ([name]) OUTPUT INSERTED.[id] VALUES (@par0)"
        );
        assert_eq!(log[0].1.len(), 2);
        assert!(matches!(log[0].1[1], Parameter::Out(ref out) if out.name == "returning_id"));
    }

    #[test]
    fn test_unsupported_operation_issues_nothing() {
        let (mut client, log) = sqlite();
        let err = client.add_table_comment("t", "x").unwrap_err();
        assert!(matches!(err, Error::UnsupportedOperation { .. }));
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_auto_named_primary_key() {
        let (mut client, log) = client_with(Box::new(PostgresDialect::new()), Recorder::default());
        client.add_primary_key("orders", &["id"]).unwrap();
        client.remove_primary_key("orders").unwrap();
        let log = log.lock().unwrap();
        assert_eq!(
            log[0].0,
            "ALTER TABLE \"orders\" ADD CONSTRAINT \"pk_orders\" PRIMARY KEY (\"id\")"
        );
        assert_eq!(log[1].0, "ALTER TABLE \"orders\" DROP CONSTRAINT \"pk_orders\"");
    }

    #[test]
    fn test_lifecycle_is_forwarded() {
        let (mut client, log) = sqlite();
        client.commit().unwrap();
        client.rollback().unwrap();
        let log = log.lock().unwrap();
        assert_eq!(log[0].0, "COMMIT");
        assert_eq!(log[1].0, "ROLLBACK");
    }
}

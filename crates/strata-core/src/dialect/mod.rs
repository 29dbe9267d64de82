//! Database dialect implementations.
//!
//! A [`Dialect`] renders DDL and DML text for one RDBMS. It holds no state and
//! never executes anything. Operations that some databases cannot express
//! atomically return several statements in execution order, and shapes a
//! database cannot express at all fail with
//! [`Error::UnsupportedOperation`](crate::error::Error::UnsupportedOperation).
//!
//! Everything that differs between databases lives here, including
//! pagination syntax, so callers never branch on which database they talk to.

mod postgres;
mod sqlite;
mod sqlserver;

pub use postgres::PostgresDialect;
pub use sqlite::SqliteDialect;
pub use sqlserver::SqlServerDialect;

use crate::error::{Error, Result};
use crate::filter::{Filter, WhereClause};
use crate::parameter::{InParameter, OutParameter};
use crate::schema::{
    primary_key_name, split_qualified, Column, DefaultValue, ForeignKey, OnDelete, Table,
};
use crate::select::SelectQuery;
use crate::value::SqlValue;

/// Trait for database-specific SQL generation.
pub trait Dialect: Send + Sync {
    /// Returns the dialect name.
    fn name(&self) -> &'static str;

    /// Quotes a single identifier.
    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    /// Quotes a possibly schema-qualified table name part by part.
    fn quote_table(&self, name: &str) -> String {
        name.split('.')
            .map(|part| self.quote_identifier(part))
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Quotes a column reference. `*` and expressions pass through unchanged.
    fn quote_column(&self, column: &str) -> String {
        if column == "*" || column.contains(['(', ' ']) {
            return column.to_string();
        }
        column
            .split('.')
            .map(|part| {
                if part == "*" {
                    part.to_string()
                } else {
                    self.quote_identifier(part)
                }
            })
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Renders a string literal.
    fn quote_literal(&self, text: &str) -> String {
        format!("'{}'", text.replace('\'', "''"))
    }

    /// Placeholder text for the zero-based parameter `index`.
    fn placeholder(&self, index: usize) -> String;

    /// Name of the zero-based parameter `index`.
    fn parameter_name(&self, index: usize) -> String {
        format!("par{index}")
    }

    /// Names `values` from index zero.
    fn convert_to_named_parameters(&self, values: &[SqlValue]) -> Vec<InParameter> {
        self.convert_to_named_parameters_from(0, values)
    }

    /// Names `values` sequentially starting at `offset`, so fragments built
    /// independently never reuse an index.
    fn convert_to_named_parameters_from(
        &self,
        offset: usize,
        values: &[SqlValue],
    ) -> Vec<InParameter> {
        values
            .iter()
            .enumerate()
            .map(|(i, value)| InParameter {
                name: self.parameter_name(offset + i),
                index: offset + i,
                value: value.clone(),
            })
            .collect()
    }

    /// Maps a column's logical type to the SQL type.
    fn type_name(&self, column: &Column) -> String;

    /// Type text used in a column definition, including any auto-increment
    /// type or keyword the dialect attaches to the type.
    fn column_type(&self, column: &Column) -> String {
        self.type_name(column)
    }

    /// Suffix declaring a single-column primary key inline.
    fn inline_primary_key(&self, _column: &Column) -> String {
        " PRIMARY KEY".to_string()
    }

    /// Renders a default value.
    fn render_default(&self, default: &DefaultValue) -> String {
        default.to_sql()
    }

    /// Referential action keyword.
    fn on_delete_sql(&self, action: OnDelete) -> &'static str {
        action.to_sql()
    }

    /// Generates column definition SQL.
    fn column_definition(&self, column: &Column, inline_primary_key: bool) -> String {
        let mut sql = format!(
            "{} {}",
            self.quote_identifier(&column.name),
            self.column_type(column)
        );
        if !column.nullable {
            sql.push_str(" NOT NULL");
        }
        if let Some(ref default) = column.default {
            sql.push_str(" DEFAULT ");
            sql.push_str(&self.render_default(default));
        }
        if inline_primary_key {
            sql.push_str(&self.inline_primary_key(column));
        }
        if column.unique && !column.primary_key {
            sql.push_str(" UNIQUE");
        }
        sql
    }

    /// Generates the statements creating `table`.
    ///
    /// A single primary key column is declared inline; a composite key becomes
    /// a `pk_<table>` table constraint. Column comments follow as separate
    /// statements where the dialect supports them.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for a table without columns.
    fn create_table_sqls(&self, table: &Table) -> Result<Vec<String>> {
        if table.columns.is_empty() {
            return Err(Error::InvalidArgument(format!(
                "table {} has no columns",
                table.name
            )));
        }
        let pk: Vec<&Column> = table.primary_key_columns().collect();
        let inline = pk.len() == 1;

        let mut defs: Vec<String> = table
            .columns
            .iter()
            .map(|c| self.column_definition(c, inline && c.primary_key))
            .collect();
        if pk.len() > 1 {
            let cols: Vec<String> = pk.iter().map(|c| self.quote_identifier(&c.name)).collect();
            defs.push(format!(
                "CONSTRAINT {} PRIMARY KEY ({})",
                self.quote_identifier(&primary_key_name(&table.name)),
                cols.join(", ")
            ));
        }

        let mut sqls = vec![format!(
            "CREATE TABLE {} (\n  {}\n)",
            self.quote_table(&table.name),
            defs.join(",\n  ")
        )];
        for column in &table.columns {
            if let Some(ref comment) = column.comment {
                if let Ok(sql) = self.add_column_comment_sql(&table.name, &column.name, comment) {
                    sqls.push(sql);
                }
            }
        }
        Ok(sqls)
    }

    /// Generates the statements dropping `table`.
    fn drop_table_sqls(&self, table: &str) -> Vec<String> {
        vec![format!("DROP TABLE {}", self.quote_table(table))]
    }

    /// Generates SQL adding a primary key constraint.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedOperation`] where constraints cannot be added later.
    fn primary_key_sql(&self, table: &str, name: &str, columns: &[String]) -> Result<String> {
        let cols: Vec<String> = columns.iter().map(|c| self.quote_identifier(c)).collect();
        Ok(format!(
            "ALTER TABLE {} ADD CONSTRAINT {} PRIMARY KEY ({})",
            self.quote_table(table),
            self.quote_identifier(name),
            cols.join(", ")
        ))
    }

    /// Generates SQL dropping a primary key constraint.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedOperation`] where constraints cannot be dropped.
    fn drop_primary_key_sql(&self, table: &str, name: &str) -> Result<String> {
        self.drop_constraint_sql(table, name)
    }

    /// Generates SQL adding a foreign key constraint.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedOperation`] where constraints cannot be added later.
    fn foreign_key_sql(&self, fk: &ForeignKey) -> Result<String> {
        Ok(format!(
            "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({}) ON DELETE {}",
            self.quote_table(&fk.table),
            self.quote_identifier(&fk.name),
            self.quote_identifier(&fk.column),
            self.quote_table(&fk.referenced_table),
            self.quote_identifier(&fk.referenced_column),
            self.on_delete_sql(fk.on_delete)
        ))
    }

    /// Generates SQL dropping a foreign key constraint.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedOperation`] where constraints cannot be dropped.
    fn drop_foreign_key_sql(&self, name: &str, table: &str) -> Result<String> {
        self.drop_constraint_sql(table, name)
    }

    /// Generates SQL adding a unique constraint.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedOperation`] where constraints cannot be added later.
    fn unique_key_sql(&self, name: &str, table: &str, columns: &[String]) -> Result<String> {
        let cols: Vec<String> = columns.iter().map(|c| self.quote_identifier(c)).collect();
        Ok(format!(
            "ALTER TABLE {} ADD CONSTRAINT {} UNIQUE ({})",
            self.quote_table(table),
            self.quote_identifier(name),
            cols.join(", ")
        ))
    }

    /// Generates SQL dropping a unique constraint.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedOperation`] where constraints cannot be dropped.
    fn drop_unique_key_sql(&self, name: &str, table: &str) -> Result<String> {
        self.drop_constraint_sql(table, name)
    }

    /// `ALTER TABLE ... DROP CONSTRAINT ...`
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedOperation`] where constraints cannot be dropped.
    fn drop_constraint_sql(&self, table: &str, name: &str) -> Result<String> {
        Ok(format!(
            "ALTER TABLE {} DROP CONSTRAINT {}",
            self.quote_table(table),
            self.quote_identifier(name)
        ))
    }

    /// Generates SQL creating an index.
    fn create_index_sql(&self, name: &str, table: &str, columns: &[String]) -> String {
        let cols: Vec<String> = columns.iter().map(|c| self.quote_identifier(c)).collect();
        format!(
            "CREATE INDEX {} ON {} ({})",
            self.quote_identifier(name),
            self.quote_table(table),
            cols.join(", ")
        )
    }

    /// Generates SQL dropping an index. The index lives in the table's schema.
    fn drop_index_sql(&self, name: &str, table: &str) -> String {
        let index = match split_qualified(table) {
            (Some(schema), _) => format!(
                "{}.{}",
                self.quote_identifier(schema),
                self.quote_identifier(name)
            ),
            (None, _) => self.quote_identifier(name),
        };
        format!("DROP INDEX {index}")
    }

    /// Generates SQL adding a column.
    fn add_column_sql(&self, table: &str, column: &Column) -> String {
        format!(
            "ALTER TABLE {} ADD COLUMN {}",
            self.quote_table(table),
            self.column_definition(column, false)
        )
    }

    /// Generates the statements dropping a column, constraint cleanup first.
    fn drop_column_sqls(&self, table: &str, column: &str) -> Vec<String> {
        vec![format!(
            "ALTER TABLE {} DROP COLUMN {}",
            self.quote_table(table),
            self.quote_identifier(column)
        )]
    }

    /// Generates SQL setting a table comment.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedOperation`] where comments are not supported.
    fn add_table_comment_sql(&self, table: &str, comment: &str) -> Result<String> {
        Ok(format!(
            "COMMENT ON TABLE {} IS {}",
            self.quote_table(table),
            self.quote_literal(comment)
        ))
    }

    /// Generates SQL setting a column comment.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedOperation`] where comments are not supported.
    fn add_column_comment_sql(&self, table: &str, column: &str, comment: &str) -> Result<String> {
        Ok(format!(
            "COMMENT ON COLUMN {}.{} IS {}",
            self.quote_table(table),
            self.quote_identifier(column),
            self.quote_literal(comment)
        ))
    }

    /// Generates SQL removing a table comment.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedOperation`] where comments are not supported.
    fn remove_table_comment_sql(&self, table: &str) -> Result<String> {
        Ok(format!("COMMENT ON TABLE {} IS NULL", self.quote_table(table)))
    }

    /// Generates SQL removing a column comment.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedOperation`] where comments are not supported.
    fn remove_column_comment_sql(&self, table: &str, column: &str) -> Result<String> {
        Ok(format!(
            "COMMENT ON COLUMN {}.{} IS NULL",
            self.quote_table(table),
            self.quote_identifier(column)
        ))
    }

    /// Generates SQL renaming a table. The new name stays in the same schema.
    fn rename_table_sql(&self, table: &str, new_name: &str) -> String {
        let (_, bare) = split_qualified(new_name);
        format!(
            "ALTER TABLE {} RENAME TO {}",
            self.quote_table(table),
            self.quote_identifier(bare)
        )
    }

    /// Generates SQL renaming a column.
    fn rename_column_sql(&self, table: &str, column: &str, new_name: &str) -> String {
        format!(
            "ALTER TABLE {} RENAME COLUMN {} TO {}",
            self.quote_table(table),
            self.quote_identifier(column),
            self.quote_identifier(new_name)
        )
    }

    /// Generates the statements changing a column to `definition`.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedOperation`] unless the dialect overrides it.
    fn modify_column_sqls(
        &self,
        table: &str,
        column: &str,
        _definition: &Column,
    ) -> Result<Vec<String>> {
        Err(Error::unsupported(
            self.name(),
            format!("modifying column {table}.{column}"),
        ))
    }

    /// Query returning a positive count when `table` exists.
    fn table_exists_sql(&self, table: &str) -> String;

    /// Generates an INSERT binding one placeholder per column, from index zero.
    fn insert_sql(&self, table: &str, columns: &[String]) -> String {
        if columns.is_empty() {
            return format!("INSERT INTO {} DEFAULT VALUES", self.quote_table(table));
        }
        let cols: Vec<String> = columns.iter().map(|c| self.quote_identifier(c)).collect();
        let placeholders: Vec<String> = (0..columns.len()).map(|i| self.placeholder(i)).collect();
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.quote_table(table),
            cols.join(", "),
            placeholders.join(", ")
        )
    }

    /// Generates an INSERT that hands `returning_column` back through `out`.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedOperation`] unless the dialect overrides it.
    fn insert_returning_sql(
        &self,
        table: &str,
        _columns: &[String],
        returning_column: &str,
        _out: &OutParameter,
    ) -> Result<String> {
        Err(Error::unsupported(
            self.name(),
            format!("returning {returning_column} from an insert into {table}"),
        ))
    }

    /// Generates an UPDATE whose SET list binds placeholders `0..columns.len()`.
    fn update_sql(&self, table: &str, columns: &[String]) -> String {
        let sets: Vec<String> = columns
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{} = {}", self.quote_identifier(c), self.placeholder(i)))
            .collect();
        format!("UPDATE {} SET {}", self.quote_table(table), sets.join(", "))
    }

    /// Generates an unconditional DELETE.
    fn delete_sql(&self, table: &str) -> String {
        format!("DELETE FROM {}", self.quote_table(table))
    }

    /// Generates an unconditional row count.
    fn count_sql(&self, table: &str) -> String {
        format!("SELECT COUNT(*) FROM {}", self.quote_table(table))
    }

    /// Query returning 1 when a row matching `where_sql` exists, else 0.
    fn exists_sql(&self, table: &str, where_sql: Option<&str>) -> String {
        let mut inner = format!("SELECT 1 FROM {}", self.quote_table(table));
        if let Some(clause) = where_sql {
            inner.push(' ');
            inner.push_str(clause);
        }
        format!("SELECT CASE WHEN EXISTS ({inner}) THEN 1 ELSE 0 END")
    }

    /// Compiles `filter` into a WHERE clause with placeholders from `offset`.
    ///
    /// # Errors
    ///
    /// See [`Filter::compile`].
    fn where_sql(&self, filter: &Filter, offset: usize) -> Result<WhereClause> {
        filter.compile(self, offset)
    }

    /// Renders a SELECT around an already compiled WHERE clause.
    fn select_sql(&self, query: &SelectQuery, where_sql: Option<&str>) -> String {
        let projection = if query.columns.is_empty() {
            "*".to_string()
        } else {
            query
                .columns
                .iter()
                .map(|c| self.quote_column(c))
                .collect::<Vec<_>>()
                .join(", ")
        };
        let tables: Vec<String> = query.tables.iter().map(|t| self.quote_table(t)).collect();
        let mut sql = format!("SELECT {projection} FROM {}", tables.join(", "));
        if let Some(clause) = where_sql {
            sql.push(' ');
            sql.push_str(clause);
        }
        if !query.order_by.is_empty() {
            let terms: Vec<String> = query
                .order_by
                .iter()
                .map(|o| format!("{} {}", self.quote_column(&o.column), o.direction.to_sql()))
                .collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&terms.join(", "));
        }
        self.paginate(sql, !query.order_by.is_empty(), query.skip, query.take)
    }

    /// Appends pagination to a complete SELECT. `ordered` tells whether the
    /// statement already has an ORDER BY.
    fn paginate(
        &self,
        mut sql: String,
        _ordered: bool,
        skip: Option<u64>,
        take: Option<u64>,
    ) -> String {
        if let Some(take) = take {
            sql.push_str(&format!(" LIMIT {take}"));
        }
        if let Some(skip) = skip {
            sql.push_str(&format!(" OFFSET {skip}"));
        }
        sql
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::DbType;

    #[test]
    fn test_named_parameters_from_offset() {
        let d = SqliteDialect::new();
        let params = d.convert_to_named_parameters_from(
            2,
            &[SqlValue::Int(10), SqlValue::Text("x".into())],
        );
        let names: Vec<&str> = params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["par2", "par3"]);
        assert_eq!(params[0].index, 2);
        assert_eq!(params[1].value, SqlValue::Text("x".into()));
    }

    #[test]
    fn test_named_parameters_default_offset() {
        let d = PostgresDialect::new();
        let params = d.convert_to_named_parameters(&[SqlValue::Null]);
        assert_eq!(params[0].name, "par0");
        assert_eq!(params[0].index, 0);
    }

    #[test]
    fn test_quote_helpers() {
        let d = PostgresDialect::new();
        assert_eq!(d.quote_table("app.users"), "\"app\".\"users\"");
        assert_eq!(d.quote_identifier("we\"ird"), "\"we\"\"ird\"");
        assert_eq!(d.quote_column("u.*"), "\"u\".*");
        assert_eq!(d.quote_column("COUNT(*)"), "COUNT(*)");
        assert_eq!(d.quote_literal("it's"), "'it''s'");
    }

    #[test]
    fn test_composite_primary_key_becomes_constraint() {
        let table = Table::new("order_lines")
            .column(Column::integer("order_id").primary_key())
            .column(Column::integer("line").primary_key())
            .column(Column::new("qty", DbType::Integer));
        let sqls = PostgresDialect::new().create_table_sqls(&table).unwrap();
        assert_eq!(sqls.len(), 1);
        assert!(sqls[0]
            .contains("CONSTRAINT \"pk_order_lines\" PRIMARY KEY (\"order_id\", \"line\")"));
        assert!(!sqls[0].contains("\"order_id\" INTEGER NOT NULL PRIMARY KEY"));
    }

    #[test]
    fn test_create_table_without_columns_is_rejected() {
        let err = SqliteDialect::new()
            .create_table_sqls(&Table::new("empty"))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_exists_sql_wraps_where() {
        let d = SqliteDialect::new();
        assert_eq!(
            d.exists_sql("t", Some("WHERE \"a\" = ?1")),
            "SELECT CASE WHEN EXISTS (SELECT 1 FROM \"t\" WHERE \"a\" = ?1) THEN 1 ELSE 0 END"
        );
    }
}

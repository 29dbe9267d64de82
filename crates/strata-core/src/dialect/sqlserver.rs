//! SQL Server dialect.
//!
//! Renames go through `sp_rename`, comments are `MS_Description` extended
//! properties, and defaults are named constraints that must be dropped before
//! the column they belong to can be dropped or changed.

use super::Dialect;
use crate::error::Result;
use crate::parameter::OutParameter;
use crate::schema::{split_qualified, Column, DbType, OnDelete};

/// Schema assumed for unqualified names in extended-property calls.
const DEFAULT_SCHEMA: &str = "dbo";

/// SQL Server dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlServerDialect;

impl SqlServerDialect {
    /// Creates a new SQL Server dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Batch dropping the default constraint of `column`, if it has one.
    fn drop_default_constraint_sql(&self, table: &str, column: &str) -> String {
        let alter = format!("ALTER TABLE {} DROP CONSTRAINT ", self.quote_table(table));
        format!(
            "DECLARE @sql NVARCHAR(MAX); \
             SELECT @sql = {} + QUOTENAME(dc.name) \
             FROM sys.default_constraints dc \
             JOIN sys.columns c ON c.object_id = dc.parent_object_id \
             AND c.column_id = dc.parent_column_id \
             WHERE dc.parent_object_id = OBJECT_ID({}) AND c.name = {}; \
             IF @sql IS NOT NULL EXEC sp_executesql @sql",
            self.quote_literal(&alter),
            self.quote_literal(&self.quote_table(table)),
            self.quote_literal(column)
        )
    }

    /// `@level0`/`@level1` arguments addressing a table.
    fn table_property_target(&self, table: &str) -> String {
        let (schema, bare) = split_qualified(table);
        format!(
            "@level0type = N'SCHEMA', @level0name = {}, @level1type = N'TABLE', @level1name = {}",
            self.quote_literal(schema.unwrap_or(DEFAULT_SCHEMA)),
            self.quote_literal(bare)
        )
    }

    fn column_property_target(&self, table: &str, column: &str) -> String {
        format!(
            "{}, @level2type = N'COLUMN', @level2name = {}",
            self.table_property_target(table),
            self.quote_literal(column)
        )
    }
}

impl Dialect for SqlServerDialect {
    fn name(&self) -> &'static str {
        "sqlserver"
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("[{}]", name.replace(']', "]]"))
    }

    fn quote_literal(&self, text: &str) -> String {
        format!("N'{}'", text.replace('\'', "''"))
    }

    fn placeholder(&self, index: usize) -> String {
        format!("@{}", self.parameter_name(index))
    }

    fn type_name(&self, column: &Column) -> String {
        match column.db_type {
            DbType::SmallInt => "SMALLINT".to_string(),
            DbType::Integer => "INT".to_string(),
            DbType::BigInt => "BIGINT".to_string(),
            DbType::String => format!("NVARCHAR({})", column.string_size()),
            DbType::FixedString => format!("NCHAR({})", column.string_size()),
            DbType::Text => "NVARCHAR(MAX)".to_string(),
            DbType::Boolean => "BIT".to_string(),
            DbType::Date => "DATE".to_string(),
            DbType::Time => "TIME".to_string(),
            DbType::DateTime => "DATETIME2".to_string(),
            DbType::Real => "REAL".to_string(),
            DbType::Double => "FLOAT".to_string(),
            DbType::Decimal => {
                let (p, s) = column.decimal_precision();
                format!("DECIMAL({p}, {s})")
            }
            DbType::Binary => match column.size {
                Some(n) => format!("VARBINARY({n})"),
                None => "VARBINARY(MAX)".to_string(),
            },
            DbType::Guid => "UNIQUEIDENTIFIER".to_string(),
        }
    }

    fn column_type(&self, column: &Column) -> String {
        if column.auto_increment {
            format!("{} IDENTITY(1,1)", self.type_name(column))
        } else {
            self.type_name(column)
        }
    }

    fn on_delete_sql(&self, action: OnDelete) -> &'static str {
        match action {
            // No RESTRICT; NO ACTION is checked immediately anyway.
            OnDelete::Restrict => OnDelete::NoAction.to_sql(),
            other => other.to_sql(),
        }
    }

    fn drop_index_sql(&self, name: &str, table: &str) -> String {
        format!(
            "DROP INDEX {} ON {}",
            self.quote_identifier(name),
            self.quote_table(table)
        )
    }

    fn add_column_sql(&self, table: &str, column: &Column) -> String {
        format!(
            "ALTER TABLE {} ADD {}",
            self.quote_table(table),
            self.column_definition(column, false)
        )
    }

    fn drop_column_sqls(&self, table: &str, column: &str) -> Vec<String> {
        vec![
            self.drop_default_constraint_sql(table, column),
            format!(
                "ALTER TABLE {} DROP COLUMN {}",
                self.quote_table(table),
                self.quote_identifier(column)
            ),
        ]
    }

    fn add_table_comment_sql(&self, table: &str, comment: &str) -> Result<String> {
        Ok(format!(
            "EXEC sp_addextendedproperty @name = N'MS_Description', @value = {}, {}",
            self.quote_literal(comment),
            self.table_property_target(table)
        ))
    }

    fn add_column_comment_sql(&self, table: &str, column: &str, comment: &str) -> Result<String> {
        Ok(format!(
            "EXEC sp_addextendedproperty @name = N'MS_Description', @value = {}, {}",
            self.quote_literal(comment),
            self.column_property_target(table, column)
        ))
    }

    fn remove_table_comment_sql(&self, table: &str) -> Result<String> {
        Ok(format!(
            "EXEC sp_dropextendedproperty @name = N'MS_Description', {}",
            self.table_property_target(table)
        ))
    }

    fn remove_column_comment_sql(&self, table: &str, column: &str) -> Result<String> {
        Ok(format!(
            "EXEC sp_dropextendedproperty @name = N'MS_Description', {}",
            self.column_property_target(table, column)
        ))
    }

    fn rename_table_sql(&self, table: &str, new_name: &str) -> String {
        let (_, bare) = split_qualified(new_name);
        format!(
            "EXEC sp_rename {}, {}",
            self.quote_literal(table),
            self.quote_literal(bare)
        )
    }

    fn rename_column_sql(&self, table: &str, column: &str, new_name: &str) -> String {
        format!(
            "EXEC sp_rename {}, {}, N'COLUMN'",
            self.quote_literal(&format!("{table}.{column}")),
            self.quote_literal(new_name)
        )
    }

    fn modify_column_sqls(
        &self,
        table: &str,
        column: &str,
        definition: &Column,
    ) -> Result<Vec<String>> {
        let target = self.quote_table(table);
        let col = self.quote_identifier(column);
        let null = if definition.nullable { "NULL" } else { "NOT NULL" };
        let mut sqls = vec![
            self.drop_default_constraint_sql(table, column),
            format!(
                "ALTER TABLE {target} ALTER COLUMN {col} {} {null}",
                self.type_name(definition)
            ),
        ];
        if let Some(ref default) = definition.default {
            sqls.push(format!(
                "ALTER TABLE {target} ADD DEFAULT {} FOR {col}",
                self.render_default(default)
            ));
        }
        Ok(sqls)
    }

    fn table_exists_sql(&self, table: &str) -> String {
        let (schema, bare) = split_qualified(table);
        let schema = schema.map_or_else(|| "SCHEMA_NAME()".to_string(), |s| self.quote_literal(s));
        format!(
            "SELECT COUNT(*) FROM INFORMATION_SCHEMA.TABLES \
             WHERE TABLE_SCHEMA = {schema} AND TABLE_NAME = {}",
            self.quote_literal(bare)
        )
    }

    fn insert_returning_sql(
        &self,
        table: &str,
        columns: &[String],
        returning_column: &str,
        _out: &OutParameter,
    ) -> Result<String> {
        let output = format!("OUTPUT INSERTED.{}", self.quote_identifier(returning_column));
        if columns.is_empty() {
            return Ok(format!(
                "INSERT INTO {} {output} DEFAULT VALUES",
                self.quote_table(table)
            ));
        }
        let cols: Vec<String> = columns.iter().map(|c| self.quote_identifier(c)).collect();
        let placeholders: Vec<String> = (0..columns.len()).map(|i| self.placeholder(i)).collect();
        Ok(format!(
            "INSERT INTO {} ({}) {output} VALUES ({})",
            self.quote_table(table),
            cols.join(", "),
            placeholders.join(", ")
        ))
    }

    fn paginate(
        &self,
        mut sql: String,
        ordered: bool,
        skip: Option<u64>,
        take: Option<u64>,
    ) -> String {
        if skip.is_none() && take.is_none() {
            return sql;
        }
        // OFFSET/FETCH is part of ORDER BY.
        if !ordered {
            sql.push_str(" ORDER BY (SELECT NULL)");
        }
        sql.push_str(&format!(" OFFSET {} ROWS", skip.unwrap_or(0)));
        if let Some(take) = take {
            sql.push_str(&format!(" FETCH NEXT {take} ROWS ONLY"));
        }
        sql
    }
}

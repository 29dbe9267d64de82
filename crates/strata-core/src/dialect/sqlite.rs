//! SQLite dialect.
//!
//! SQLite has limited ALTER TABLE support: constraints exist only as part of
//! CREATE TABLE, columns cannot change type, and there are no comments.
//! Unique keys are emulated with unique indexes.

use super::Dialect;
use crate::error::{Error, Result};
use crate::parameter::OutParameter;
use crate::schema::{split_qualified, Column, DbType, ForeignKey};

/// SQLite dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl SqliteDialect {
    /// Creates a new SQLite dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn unsupported<T>(&self, operation: String) -> Result<T> {
        Err(Error::unsupported(self.name(), operation))
    }

    /// Indexes are created in the table's schema and name the bare table.
    fn index_sql(&self, create: &str, name: &str, table: &str, columns: &[String]) -> String {
        let (schema, bare) = split_qualified(table);
        let cols: Vec<String> = columns.iter().map(|c| self.quote_identifier(c)).collect();
        let index = match schema {
            Some(s) => format!("{}.{}", self.quote_identifier(s), self.quote_identifier(name)),
            None => self.quote_identifier(name),
        };
        format!(
            "{create} {index} ON {} ({})",
            self.quote_identifier(bare),
            cols.join(", ")
        )
    }
}

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn placeholder(&self, index: usize) -> String {
        format!("?{}", index + 1)
    }

    fn type_name(&self, column: &Column) -> String {
        match column.db_type {
            DbType::SmallInt | DbType::Integer | DbType::BigInt => "INTEGER".to_string(),
            DbType::String => format!("VARCHAR({})", column.string_size()),
            DbType::FixedString => format!("CHAR({})", column.string_size()),
            DbType::Text | DbType::Guid => "TEXT".to_string(),
            DbType::Boolean => "BOOLEAN".to_string(),
            DbType::Date => "DATE".to_string(),
            DbType::Time => "TIME".to_string(),
            DbType::DateTime => "DATETIME".to_string(),
            DbType::Real | DbType::Double => "REAL".to_string(),
            DbType::Decimal => {
                let (p, s) = column.decimal_precision();
                format!("DECIMAL({p}, {s})")
            }
            DbType::Binary => "BLOB".to_string(),
        }
    }

    fn inline_primary_key(&self, column: &Column) -> String {
        // AUTOINCREMENT is only valid on an INTEGER PRIMARY KEY.
        if column.auto_increment {
            " PRIMARY KEY AUTOINCREMENT".to_string()
        } else {
            " PRIMARY KEY".to_string()
        }
    }

    fn primary_key_sql(&self, table: &str, _name: &str, _columns: &[String]) -> Result<String> {
        self.unsupported(format!("adding a primary key to existing table {table}"))
    }

    fn drop_primary_key_sql(&self, table: &str, _name: &str) -> Result<String> {
        self.unsupported(format!("dropping the primary key of {table}"))
    }

    fn foreign_key_sql(&self, fk: &ForeignKey) -> Result<String> {
        self.unsupported(format!("adding foreign key {} to {}", fk.name, fk.table))
    }

    fn drop_foreign_key_sql(&self, name: &str, table: &str) -> Result<String> {
        self.unsupported(format!("dropping foreign key {name} from {table}"))
    }

    fn unique_key_sql(&self, name: &str, table: &str, columns: &[String]) -> Result<String> {
        Ok(self.index_sql("CREATE UNIQUE INDEX", name, table, columns))
    }

    fn drop_unique_key_sql(&self, name: &str, table: &str) -> Result<String> {
        Ok(self.drop_index_sql(name, table))
    }

    fn drop_constraint_sql(&self, table: &str, name: &str) -> Result<String> {
        self.unsupported(format!("dropping constraint {name} from {table}"))
    }

    fn create_index_sql(&self, name: &str, table: &str, columns: &[String]) -> String {
        self.index_sql("CREATE INDEX", name, table, columns)
    }

    fn add_table_comment_sql(&self, table: &str, _comment: &str) -> Result<String> {
        self.unsupported(format!("commenting table {table}"))
    }

    fn add_column_comment_sql(&self, table: &str, column: &str, _comment: &str) -> Result<String> {
        self.unsupported(format!("commenting column {table}.{column}"))
    }

    fn remove_table_comment_sql(&self, table: &str) -> Result<String> {
        self.unsupported(format!("removing the comment of table {table}"))
    }

    fn remove_column_comment_sql(&self, table: &str, column: &str) -> Result<String> {
        self.unsupported(format!("removing the comment of column {table}.{column}"))
    }

    fn table_exists_sql(&self, table: &str) -> String {
        let (schema, bare) = split_qualified(table);
        let master = match schema {
            Some(s) => format!("{}.sqlite_master", self.quote_identifier(s)),
            None => "sqlite_master".to_string(),
        };
        format!(
            "SELECT COUNT(*) FROM {master} WHERE type = 'table' AND name = {}",
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
        Ok(format!(
            "{} RETURNING {}",
            self.insert_sql(table, columns),
            self.quote_identifier(returning_column)
        ))
    }

    fn paginate(
        &self,
        mut sql: String,
        _ordered: bool,
        skip: Option<u64>,
        take: Option<u64>,
    ) -> String {
        match (skip, take) {
            (None, None) => {}
            (None, Some(take)) => sql.push_str(&format!(" LIMIT {take}")),
            // OFFSET is only valid after LIMIT; -1 means no limit.
            (Some(skip), None) => sql.push_str(&format!(" LIMIT -1 OFFSET {skip}")),
            (Some(skip), Some(take)) => sql.push_str(&format!(" LIMIT {take} OFFSET {skip}")),
        }
        sql
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Table;

    #[test]
    fn test_create_table_with_autoincrement() {
        let table = Table::new("users")
            .column(Column::big_int("id").primary_key().auto_increment())
            .column(Column::string("name").size(100).not_null())
            .column(Column::string("email").unique());
        let sqls = SqliteDialect::new().create_table_sqls(&table).unwrap();
        assert_eq!(
            sqls,
            vec![
                "CREATE TABLE \"users\" (\n  \
                 \"id\" INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,\n  \
                 \"name\" VARCHAR(100) NOT NULL,\n  \
                 \"email\" VARCHAR(255) UNIQUE\n)"
                    .to_string()
            ]
        );
    }

    #[test]
    fn test_column_comments_are_skipped_on_create() {
        let table = Table::new("t").column(Column::integer("a").comment("ignored"));
        let sqls = SqliteDialect::new().create_table_sqls(&table).unwrap();
        assert_eq!(sqls.len(), 1);
    }

    #[test]
    fn test_placeholders_are_one_based() {
        let d = SqliteDialect::new();
        assert_eq!(d.placeholder(0), "?1");
        assert_eq!(
            d.insert_sql("users", &["name".into(), "age".into()]),
            "INSERT INTO \"users\" (\"name\", \"age\") VALUES (?1, ?2)"
        );
        assert_eq!(
            d.update_sql("users", &["name".into(), "age".into()]),
            "UPDATE \"users\" SET \"name\" = ?1, \"age\" = ?2"
        );
    }

    #[test]
    fn test_constraints_after_creation_are_unsupported() {
        let d = SqliteDialect::new();
        let fk = ForeignKey::new("fk_a_b", "a", "b_id", "b", "id");
        assert!(matches!(
            d.foreign_key_sql(&fk),
            Err(Error::UnsupportedOperation { dialect: "sqlite", .. })
        ));
        assert!(d.primary_key_sql("a", "pk_a", &["id".into()]).is_err());
        assert!(d.modify_column_sqls("a", "b", &Column::integer("b")).is_err());
        assert!(d.add_table_comment_sql("a", "x").is_err());
    }

    #[test]
    fn test_unique_key_is_a_unique_index() {
        let d = SqliteDialect::new();
        assert_eq!(
            d.unique_key_sql("uk_email", "users", &["email".into()]).unwrap(),
            "CREATE UNIQUE INDEX \"uk_email\" ON \"users\" (\"email\")"
        );
        assert_eq!(
            d.drop_unique_key_sql("uk_email", "users").unwrap(),
            "DROP INDEX \"uk_email\""
        );
    }

    #[test]
    fn test_schema_qualified_names() {
        let d = SqliteDialect::new();
        assert_eq!(
            d.table_exists_sql("aux.users"),
            "SELECT COUNT(*) FROM \"aux\".sqlite_master WHERE type = 'table' AND name = 'users'"
        );
        assert_eq!(
            d.create_index_sql("ix_name", "aux.users", &["name".into()]),
            "CREATE INDEX \"aux\".\"ix_name\" ON \"users\" (\"name\")"
        );
        assert_eq!(d.drop_index_sql("ix_name", "aux.users"), "DROP INDEX \"aux\".\"ix_name\"");
    }

    #[test]
    fn test_schema_qualified_unique_key() {
        let d = SqliteDialect::new();
        assert_eq!(
            d.unique_key_sql("uk", "main.t", &["a".into(), "b".into()]).unwrap(),
            "CREATE UNIQUE INDEX \"main\".\"uk\" ON \"t\" (\"a\", \"b\")"
        );
        assert_eq!(d.drop_unique_key_sql("uk", "main.t").unwrap(), "DROP INDEX \"main\".\"uk\"");
    }

    #[test]
    fn test_insert_returning() {
        let d = SqliteDialect::new();
        let sql = d
            .insert_returning_sql("users", &["name".into()], "id", &OutParameter::returning("id"))
            .unwrap();
        assert_eq!(sql, "INSERT INTO \"users\" (\"name\") VALUES (?1) RETURNING \"id\"");
    }

    #[test]
    fn test_renames() {
        let d = SqliteDialect::new();
        assert_eq!(d.rename_table_sql("rev", "revbar"), "ALTER TABLE \"rev\" RENAME TO \"revbar\"");
        assert_eq!(
            d.rename_column_sql("t", "a", "b"),
            "ALTER TABLE \"t\" RENAME COLUMN \"a\" TO \"b\""
        );
        assert_eq!(d.drop_column_sqls("t", "a"), vec!["ALTER TABLE \"t\" DROP COLUMN \"a\""]);
    }
}

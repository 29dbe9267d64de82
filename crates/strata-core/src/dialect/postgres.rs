//! PostgreSQL dialect.

use super::Dialect;
use crate::error::Result;
use crate::parameter::OutParameter;
use crate::schema::{split_qualified, Column, DbType, DefaultValue};

/// PostgreSQL dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl PostgresDialect {
    /// Creates a new PostgreSQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgresql"
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${}", index + 1)
    }

    fn type_name(&self, column: &Column) -> String {
        match column.db_type {
            DbType::SmallInt => "SMALLINT".to_string(),
            DbType::Integer => "INTEGER".to_string(),
            DbType::BigInt => "BIGINT".to_string(),
            DbType::String => format!("VARCHAR({})", column.string_size()),
            DbType::FixedString => format!("CHAR({})", column.string_size()),
            DbType::Text => "TEXT".to_string(),
            DbType::Boolean => "BOOLEAN".to_string(),
            DbType::Date => "DATE".to_string(),
            DbType::Time => "TIME".to_string(),
            DbType::DateTime => "TIMESTAMP".to_string(),
            DbType::Real => "REAL".to_string(),
            DbType::Double => "DOUBLE PRECISION".to_string(),
            DbType::Decimal => {
                let (p, s) = column.decimal_precision();
                format!("NUMERIC({p}, {s})")
            }
            DbType::Binary => "BYTEA".to_string(),
            DbType::Guid => "UUID".to_string(),
        }
    }

    fn column_type(&self, column: &Column) -> String {
        if !column.auto_increment {
            return self.type_name(column);
        }
        match column.db_type {
            DbType::BigInt => "BIGSERIAL".to_string(),
            DbType::SmallInt => "SMALLSERIAL".to_string(),
            _ => "SERIAL".to_string(),
        }
    }

    fn render_default(&self, default: &DefaultValue) -> String {
        match default {
            DefaultValue::Bool(true) => "TRUE".to_string(),
            DefaultValue::Bool(false) => "FALSE".to_string(),
            other => other.to_sql(),
        }
    }

    fn modify_column_sqls(
        &self,
        table: &str,
        column: &str,
        definition: &Column,
    ) -> Result<Vec<String>> {
        let col = self.quote_identifier(column);
        let mut changes = vec![format!(
            "ALTER COLUMN {col} TYPE {}",
            self.type_name(definition)
        )];
        changes.push(if definition.nullable {
            format!("ALTER COLUMN {col} DROP NOT NULL")
        } else {
            format!("ALTER COLUMN {col} SET NOT NULL")
        });
        changes.push(match definition.default {
            Some(ref default) => format!(
                "ALTER COLUMN {col} SET DEFAULT {}",
                self.render_default(default)
            ),
            None => format!("ALTER COLUMN {col} DROP DEFAULT"),
        });
        Ok(vec![format!(
            "ALTER TABLE {} {}",
            self.quote_table(table),
            changes.join(", ")
        )])
    }

    fn table_exists_sql(&self, table: &str) -> String {
        let schema = match split_qualified(table) {
            (Some(s), _) => self.quote_literal(s),
            (None, _) => "current_schema()".to_string(),
        };
        let (_, bare) = split_qualified(table);
        format!(
            "SELECT COUNT(*) FROM information_schema.tables \
             WHERE table_schema = {schema} AND table_name = {}",
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ForeignKey, OnDelete, Table};

    #[test]
    fn test_create_table_serial_and_comments() {
        let table = Table::new("app.users")
            .column(Column::big_int("id").primary_key().auto_increment())
            .column(Column::new("active", DbType::Boolean).default_value(DefaultValue::Bool(true)))
            .column(Column::string("name").comment("display name"));
        let sqls = PostgresDialect::new().create_table_sqls(&table).unwrap();
        assert_eq!(sqls.len(), 2);
        assert_eq!(
            sqls[0],
            "CREATE TABLE \"app\".\"users\" (\n  \
             \"id\" BIGSERIAL NOT NULL PRIMARY KEY,\n  \
             \"active\" BOOLEAN DEFAULT TRUE,\n  \
             \"name\" VARCHAR(255)\n)"
        );
        assert_eq!(
            sqls[1],
            "COMMENT ON COLUMN \"app\".\"users\".\"name\" IS 'display name'"
        );
    }

    #[test]
    fn test_keys() {
        let d = PostgresDialect::new();
        assert_eq!(
            d.primary_key_sql("t", "pk_t", &["a".into(), "b".into()]).unwrap(),
            "ALTER TABLE \"t\" ADD CONSTRAINT \"pk_t\" PRIMARY KEY (\"a\", \"b\")"
        );
        let fk = ForeignKey::new("fk_post_user", "posts", "user_id", "users", "id")
            .on_delete(OnDelete::Cascade);
        assert_eq!(
            d.foreign_key_sql(&fk).unwrap(),
            "ALTER TABLE \"posts\" ADD CONSTRAINT \"fk_post_user\" FOREIGN KEY (\"user_id\") \
             REFERENCES \"users\" (\"id\") ON DELETE CASCADE"
        );
        assert_eq!(
            d.drop_foreign_key_sql("fk_post_user", "posts").unwrap(),
            "ALTER TABLE \"posts\" DROP CONSTRAINT \"fk_post_user\""
        );
        assert_eq!(
            d.unique_key_sql("uk_email", "users", &["email".into()]).unwrap(),
            "ALTER TABLE \"users\" ADD CONSTRAINT \"uk_email\" UNIQUE (\"email\")"
        );
    }

    #[test]
    fn test_modify_column_is_one_statement() {
        let d = PostgresDialect::new();
        let sqls = d
            .modify_column_sqls("t", "name", &Column::string("name").size(50).not_null())
            .unwrap();
        assert_eq!(
            sqls,
            vec![
                "ALTER TABLE \"t\" ALTER COLUMN \"name\" TYPE VARCHAR(50), \
                 ALTER COLUMN \"name\" SET NOT NULL, ALTER COLUMN \"name\" DROP DEFAULT"
                    .to_string()
            ]
        );
    }

    #[test]
    fn test_table_exists_schema_fallback() {
        let d = PostgresDialect::new();
        assert!(d.table_exists_sql("users").contains("table_schema = current_schema()"));
        assert!(d.table_exists_sql("app.users").contains("table_schema = 'app'"));
    }

    #[test]
    fn test_comments() {
        let d = PostgresDialect::new();
        assert_eq!(
            d.add_table_comment_sql("t", "it's").unwrap(),
            "COMMENT ON TABLE \"t\" IS 'it''s'"
        );
        assert_eq!(
            d.remove_column_comment_sql("t", "c").unwrap(),
            "COMMENT ON COLUMN \"t\".\"c\" IS NULL"
        );
    }

    #[test]
    fn test_insert_returning_and_empty_insert() {
        let d = PostgresDialect::new();
        assert_eq!(
            d.insert_returning_sql(
                "t",
                &["a".into(), "b".into()],
                "id",
                &OutParameter::returning("id")
            )
            .unwrap(),
            "INSERT INTO \"t\" (\"a\", \"b\") VALUES ($1, $2) RETURNING \"id\""
        );
        assert_eq!(d.insert_sql("t", &[]), "INSERT INTO \"t\" DEFAULT VALUES");
    }
}

//! Schema representation types.
//!
//! These are plain values describing tables, columns and constraints. A
//! [`Table`] owns its columns; dialects only read them while rendering DDL.

use serde::{Deserialize, Serialize};

/// Logical column types, mapped to concrete SQL types by each dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DbType {
    /// 16-bit integer.
    SmallInt,
    /// 32-bit integer.
    Integer,
    /// 64-bit integer.
    BigInt,
    /// Variable-length string, bounded by the column size.
    String,
    /// Fixed-length string of the column size.
    FixedString,
    /// Unbounded text.
    Text,
    /// Boolean.
    Boolean,
    /// Date only.
    Date,
    /// Time only.
    Time,
    /// Date and time.
    DateTime,
    /// Single precision floating point.
    Real,
    /// Double precision floating point.
    Double,
    /// Exact numeric with the column precision and scale.
    Decimal,
    /// Binary data, bounded by the column size when one is given.
    Binary,
    /// UUID / GUID.
    Guid,
}

/// Default size for [`DbType::String`] columns declared without one.
pub const DEFAULT_STRING_SIZE: u32 = 255;

/// Default precision and scale for [`DbType::Decimal`] columns.
pub const DEFAULT_DECIMAL: (u8, u8) = (18, 2);

/// Default value for a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DefaultValue {
    /// NULL default.
    Null,
    /// Boolean default.
    Bool(bool),
    /// Integer default.
    Integer(i64),
    /// Float default.
    Float(f64),
    /// String default.
    String(String),
    /// SQL expression (e.g., "CURRENT_TIMESTAMP").
    Expression(String),
}

impl DefaultValue {
    /// Returns the portable SQL representation of this default value.
    ///
    /// Booleans render as `1`/`0`, which every supported dialect accepts.
    #[must_use]
    pub fn to_sql(&self) -> String {
        match self {
            Self::Null => "NULL".to_string(),
            Self::Bool(b) => if *b { "1" } else { "0" }.to_string(),
            Self::Integer(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::String(s) => format!("'{}'", s.replace('\'', "''")),
            Self::Expression(expr) => expr.clone(),
        }
    }
}

/// Referential action applied when a referenced row is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OnDelete {
    /// Delete referencing rows.
    Cascade,
    /// Set the referencing column to NULL.
    SetNull,
    /// Error if referencing rows exist (checked at end of statement).
    #[default]
    NoAction,
    /// Error if referencing rows exist (checked immediately).
    Restrict,
}

impl OnDelete {
    /// Returns the SQL representation of this action.
    #[must_use]
    pub fn to_sql(&self) -> &'static str {
        match self {
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::NoAction => "NO ACTION",
            Self::Restrict => "RESTRICT",
        }
    }
}

/// Definition of a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Column name.
    pub name: String,
    /// Logical type.
    pub db_type: DbType,
    /// Whether the column allows NULL values.
    pub nullable: bool,
    /// Default value.
    pub default: Option<DefaultValue>,
    /// Length for strings and binaries.
    pub size: Option<u32>,
    /// Precision for decimals.
    pub precision: Option<u8>,
    /// Scale for decimals.
    pub scale: Option<u8>,
    /// Whether this column is part of the primary key.
    pub primary_key: bool,
    /// Whether this column auto-increments.
    pub auto_increment: bool,
    /// Whether this column has a UNIQUE constraint.
    pub unique: bool,
    /// Column comment, emitted where the dialect supports comments.
    pub comment: Option<String>,
}

impl Column {
    /// Creates a nullable column of the given type.
    #[must_use]
    pub fn new(name: impl Into<String>, db_type: DbType) -> Self {
        Self {
            name: name.into(),
            db_type,
            nullable: true,
            default: None,
            size: None,
            precision: None,
            scale: None,
            primary_key: false,
            auto_increment: false,
            unique: false,
            comment: None,
        }
    }

    /// Shorthand for a 32-bit integer column.
    #[must_use]
    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, DbType::Integer)
    }

    /// Shorthand for a 64-bit integer column.
    #[must_use]
    pub fn big_int(name: impl Into<String>) -> Self {
        Self::new(name, DbType::BigInt)
    }

    /// Shorthand for a variable-length string column.
    #[must_use]
    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, DbType::String)
    }

    /// Sets the column as NOT NULL.
    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Sets the column as nullable.
    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default_value(mut self, value: DefaultValue) -> Self {
        self.default = Some(value);
        self
    }

    /// Sets the size of string and binary columns.
    #[must_use]
    pub fn size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    /// Sets precision and scale of decimal columns.
    #[must_use]
    pub fn precision(mut self, precision: u8, scale: u8) -> Self {
        self.precision = Some(precision);
        self.scale = Some(scale);
        self
    }

    /// Sets the column as the primary key.
    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    /// Sets the column to auto-increment.
    #[must_use]
    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    /// Sets the column as unique.
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Sets the column comment.
    #[must_use]
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// String length, falling back to [`DEFAULT_STRING_SIZE`].
    #[must_use]
    pub fn string_size(&self) -> u32 {
        self.size.unwrap_or(DEFAULT_STRING_SIZE)
    }

    /// Decimal precision and scale, falling back to [`DEFAULT_DECIMAL`].
    #[must_use]
    pub fn decimal_precision(&self) -> (u8, u8) {
        (
            self.precision.unwrap_or(DEFAULT_DECIMAL.0),
            self.scale.unwrap_or(DEFAULT_DECIMAL.1),
        )
    }
}

/// Definition of a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Table name, optionally schema-qualified (`schema.table`).
    pub name: String,
    /// Column definitions in declaration order.
    pub columns: Vec<Column>,
}

impl Table {
    /// Creates a table without columns.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    /// Adds a column to the table.
    #[must_use]
    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Gets a column by name.
    #[must_use]
    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Columns flagged as primary key, in declaration order.
    pub fn primary_key_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.primary_key)
    }
}

/// Definition of a foreign key constraint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForeignKey {
    /// Constraint name.
    pub name: String,
    /// Referencing table.
    pub table: String,
    /// Referencing column.
    pub column: String,
    /// Referenced table.
    pub referenced_table: String,
    /// Referenced column.
    pub referenced_column: String,
    /// Action on delete.
    pub on_delete: OnDelete,
}

impl ForeignKey {
    /// Creates a foreign key with [`OnDelete::NoAction`].
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        table: impl Into<String>,
        column: impl Into<String>,
        referenced_table: impl Into<String>,
        referenced_column: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            column: column.into(),
            referenced_table: referenced_table.into(),
            referenced_column: referenced_column.into(),
            on_delete: OnDelete::NoAction,
        }
    }

    /// Sets the delete action.
    #[must_use]
    pub fn on_delete(mut self, action: OnDelete) -> Self {
        self.on_delete = action;
        self
    }
}

/// Splits `schema.table` into its parts.
#[must_use]
pub fn split_qualified(name: &str) -> (Option<&str>, &str) {
    match name.rsplit_once('.') {
        Some((schema, table)) => (Some(schema), table),
        None => (None, name),
    }
}

/// Builds a possibly schema-qualified name.
#[must_use]
pub fn qualify(schema: Option<&str>, name: &str) -> String {
    match schema {
        Some(s) if !s.is_empty() => format!("{s}.{name}"),
        _ => name.to_string(),
    }
}

/// Default primary key constraint name for a table.
#[must_use]
pub fn primary_key_name(table: &str) -> String {
    let (_, bare) = split_qualified(table);
    format!("pk_{bare}")
}

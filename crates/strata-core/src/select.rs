//! SELECT statement description.

use serde::{Deserialize, Serialize};

use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::filter::Filter;
use crate::parameter::InParameter;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    /// Ascending.
    #[default]
    Asc,
    /// Descending.
    Desc,
}

impl Direction {
    /// SQL keyword.
    #[must_use]
    pub fn to_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// One ORDER BY term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    /// Column reference.
    pub column: String,
    /// Sort direction.
    pub direction: Direction,
}

impl OrderBy {
    /// Ascending order on `column`.
    #[must_use]
    pub fn asc(column: &str) -> Self {
        Self {
            column: column.to_string(),
            direction: Direction::Asc,
        }
    }

    /// Descending order on `column`.
    #[must_use]
    pub fn desc(column: &str) -> Self {
        Self {
            column: column.to_string(),
            direction: Direction::Desc,
        }
    }
}

/// A SELECT over one or more tables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectQuery {
    /// Tables in the FROM list.
    pub tables: Vec<String>,
    /// Projected columns; empty means `*`.
    pub columns: Vec<String>,
    /// Optional predicate.
    pub filter: Option<Filter>,
    /// Sort terms, most significant first.
    pub order_by: Vec<OrderBy>,
    /// Rows to skip.
    pub skip: Option<u64>,
    /// Maximum rows to return.
    pub take: Option<u64>,
}

impl SelectQuery {
    /// Selects from a single table.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn from(table: &str) -> Self {
        Self {
            tables: vec![table.to_string()],
            ..Self::default()
        }
    }

    /// Adds another table to the FROM list.
    #[must_use]
    pub fn join_table(mut self, table: &str) -> Self {
        self.tables.push(table.to_string());
        self
    }

    /// Sets the projected columns.
    #[must_use]
    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(ToString::to_string).collect();
        self
    }

    /// Sets the predicate.
    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Appends a sort term.
    #[must_use]
    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by.push(order);
        self
    }

    /// Skips `n` rows.
    #[must_use]
    pub fn skip(mut self, n: u64) -> Self {
        self.skip = Some(n);
        self
    }

    /// Returns at most `n` rows.
    #[must_use]
    pub fn take(mut self, n: u64) -> Self {
        self.take = Some(n);
        self
    }

    /// Renders the statement for `dialect`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] without tables, or any error from
    /// compiling the filter.
    pub fn build<D: Dialect + ?Sized>(&self, dialect: &D) -> Result<BuiltSelect> {
        if self.tables.is_empty() {
            return Err(Error::InvalidArgument(
                "a select needs at least one table".to_string(),
            ));
        }
        let clause = self
            .filter
            .as_ref()
            .map(|f| f.compile(dialect, 0))
            .transpose()?;
        let sql = dialect.select_sql(self, clause.as_ref().map(|c| c.sql.as_str()));
        Ok(BuiltSelect {
            sql,
            has_filter: clause.is_some(),
            parameters: clause.map(|c| c.parameters).unwrap_or_default(),
        })
    }
}

/// A rendered SELECT.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltSelect {
    /// Statement text.
    pub sql: String,
    /// Parameters bound by the WHERE clause.
    pub parameters: Vec<InParameter>,
    /// Whether a WHERE clause was rendered; without one the statement is
    /// executed with no parameter set at all.
    pub has_filter: bool,
}

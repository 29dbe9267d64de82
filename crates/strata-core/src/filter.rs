//! Predicate trees compiled to parameterized WHERE clauses.
//!
//! A [`Filter`] is compiled in a single depth-first, left-to-right walk. Each
//! leaf emits its placeholders and pushes its values in declaration order
//! (`low` before `high`, list items first to last) through the same call, so
//! the rendered text and the extracted values cannot drift apart.
//!
//! Null values never take a placeholder: `= NULL` renders as `IS NULL`,
//! `<> NULL` as `IS NOT NULL`, and any other null operand is written inline as
//! the `NULL` literal. They are absent from the extracted values.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::parameter::InParameter;
use crate::value::{SqlValue, ToSqlValue};

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    /// Equal (=)
    Eq,
    /// Not equal (<>)
    Ne,
    /// Greater than (>)
    Gt,
    /// Greater than or equal (>=)
    Ge,
    /// Less than (<)
    Lt,
    /// Less than or equal (<=)
    Le,
    /// Pattern match (LIKE)
    Like,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eq => write!(f, "="),
            Self::Ne => write!(f, "<>"),
            Self::Gt => write!(f, ">"),
            Self::Ge => write!(f, ">="),
            Self::Lt => write!(f, "<"),
            Self::Le => write!(f, "<="),
            Self::Like => write!(f, "LIKE"),
        }
    }
}

/// A predicate expression tree.
///
/// # Example
///
/// ```
/// use strata_core::dialect::SqliteDialect;
/// use strata_core::filter::Filter;
///
/// let filter = Filter::eq("status", "active")
///     .and(Filter::gt("age", 18).or(Filter::is_null("deleted_at")));
/// let clause = filter.compile(&SqliteDialect::new(), 0).unwrap();
/// assert_eq!(
///     clause.sql,
///     "WHERE (\"status\" = ?1) AND ((\"age\" > ?2) OR (\"deleted_at\" IS NULL))"
/// );
/// assert_eq!(clause.parameters.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Filter {
    /// `column op value`
    Compare {
        /// Column reference.
        column: String,
        /// Operator.
        op: CompareOp,
        /// Operand.
        value: SqlValue,
    },
    /// `column BETWEEN low AND high`
    Between {
        /// Column reference.
        column: String,
        /// Lower bound.
        low: SqlValue,
        /// Upper bound.
        high: SqlValue,
    },
    /// `column IN (values...)`, or `NOT IN` when `negated`.
    In {
        /// Column reference.
        column: String,
        /// Candidate values.
        values: Vec<SqlValue>,
        /// Whether this is `NOT IN`.
        negated: bool,
    },
    /// Both sides hold.
    And(Box<Filter>, Box<Filter>),
    /// Either side holds.
    Or(Box<Filter>, Box<Filter>),
    /// Negation.
    Not(Box<Filter>),
}

impl Filter {
    fn compare<V: ToSqlValue>(column: &str, op: CompareOp, value: V) -> Self {
        Self::Compare {
            column: column.to_string(),
            op,
            value: value.to_sql_value(),
        }
    }

    /// `column = value`
    #[must_use]
    pub fn eq<V: ToSqlValue>(column: &str, value: V) -> Self {
        Self::compare(column, CompareOp::Eq, value)
    }

    /// `column <> value`
    #[must_use]
    pub fn ne<V: ToSqlValue>(column: &str, value: V) -> Self {
        Self::compare(column, CompareOp::Ne, value)
    }

    /// `column > value`
    #[must_use]
    pub fn gt<V: ToSqlValue>(column: &str, value: V) -> Self {
        Self::compare(column, CompareOp::Gt, value)
    }

    /// `column >= value`
    #[must_use]
    pub fn ge<V: ToSqlValue>(column: &str, value: V) -> Self {
        Self::compare(column, CompareOp::Ge, value)
    }

    /// `column < value`
    #[must_use]
    pub fn lt<V: ToSqlValue>(column: &str, value: V) -> Self {
        Self::compare(column, CompareOp::Lt, value)
    }

    /// `column <= value`
    #[must_use]
    pub fn le<V: ToSqlValue>(column: &str, value: V) -> Self {
        Self::compare(column, CompareOp::Le, value)
    }

    /// `column LIKE pattern`; use `%` for wildcards.
    #[must_use]
    pub fn like(column: &str, pattern: &str) -> Self {
        Self::compare(column, CompareOp::Like, pattern)
    }

    /// `column IS NULL`
    #[must_use]
    pub fn is_null(column: &str) -> Self {
        Self::compare(column, CompareOp::Eq, SqlValue::Null)
    }

    /// `column IS NOT NULL`
    #[must_use]
    pub fn is_not_null(column: &str) -> Self {
        Self::compare(column, CompareOp::Ne, SqlValue::Null)
    }

    /// `column BETWEEN low AND high`
    #[must_use]
    pub fn between<V: ToSqlValue>(column: &str, low: V, high: V) -> Self {
        Self::Between {
            column: column.to_string(),
            low: low.to_sql_value(),
            high: high.to_sql_value(),
        }
    }

    /// `column IN (values...)`
    #[must_use]
    pub fn in_list<V: ToSqlValue>(column: &str, values: Vec<V>) -> Self {
        Self::In {
            column: column.to_string(),
            values: values.into_iter().map(ToSqlValue::to_sql_value).collect(),
            negated: false,
        }
    }

    /// `column NOT IN (values...)`
    #[must_use]
    pub fn not_in_list<V: ToSqlValue>(column: &str, values: Vec<V>) -> Self {
        Self::In {
            column: column.to_string(),
            values: values.into_iter().map(ToSqlValue::to_sql_value).collect(),
            negated: true,
        }
    }

    /// Combines this filter with another using AND.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        Self::And(Box::new(self), Box::new(other))
    }

    /// Combines this filter with another using OR.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self::Or(Box::new(self), Box::new(other))
    }

    /// Negates this filter.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Compiles the filter into a WHERE clause whose placeholders start at
    /// `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParameterMismatch`] if the number of placeholders
    /// written differs from the number of values collected.
    pub fn compile<D: Dialect + ?Sized>(&self, dialect: &D, offset: usize) -> Result<WhereClause> {
        let mut compiler = Compiler {
            quote: &|c: &str| dialect.quote_column(c),
            placeholder: &|i: usize| dialect.placeholder(i),
            offset,
            placeholders: 0,
            values: Vec::new(),
        };
        let body = compiler.walk(self);
        compiler.finish()?;
        let parameters = compiler
            .values
            .into_iter()
            .enumerate()
            .map(|(i, value)| InParameter {
                name: dialect.parameter_name(offset + i),
                index: offset + i,
                value,
            })
            .collect();
        Ok(WhereClause {
            sql: format!("WHERE {body}"),
            parameters,
        })
    }

    /// Renders only the WHERE clause text. See [`Filter::compile`].
    ///
    /// # Errors
    ///
    /// Same as [`Filter::compile`].
    pub fn render<D: Dialect + ?Sized>(&self, dialect: &D, offset: usize) -> Result<String> {
        self.compile(dialect, offset).map(|clause| clause.sql)
    }

    /// Values bound by the filter, in placeholder order, nulls excluded.
    #[must_use]
    pub fn extract_values(&self) -> Vec<SqlValue> {
        let mut compiler = Compiler {
            quote: &str::to_string,
            placeholder: &|_: usize| String::new(),
            offset: 0,
            placeholders: 0,
            values: Vec::new(),
        };
        compiler.walk(self);
        compiler.values
    }
}

/// A compiled WHERE clause and the parameters it binds.
#[derive(Debug, Clone, PartialEq)]
pub struct WhereClause {
    /// Clause text, starting with `WHERE`.
    pub sql: String,
    /// Parameters numbered from the requested offset.
    pub parameters: Vec<InParameter>,
}

struct Compiler<'a> {
    quote: &'a dyn Fn(&str) -> String,
    placeholder: &'a dyn Fn(usize) -> String,
    offset: usize,
    placeholders: usize,
    values: Vec<SqlValue>,
}

impl Compiler<'_> {
    /// Writes a placeholder for a non-null value, or the inline literal for null.
    fn operand(&mut self, value: &SqlValue) -> String {
        if value.is_null() {
            return "NULL".to_string();
        }
        let text = (self.placeholder)(self.offset + self.placeholders);
        self.placeholders += 1;
        self.values.push(value.clone());
        text
    }

    fn walk(&mut self, filter: &Filter) -> String {
        match filter {
            Filter::Compare { column, op, value } => {
                let column = (self.quote)(column);
                match (op, value.is_null()) {
                    (CompareOp::Eq, true) => format!("{column} IS NULL"),
                    (CompareOp::Ne, true) => format!("{column} IS NOT NULL"),
                    _ => {
                        let operand = self.operand(value);
                        format!("{column} {op} {operand}")
                    }
                }
            }
            Filter::Between { column, low, high } => {
                let column = (self.quote)(column);
                let low = self.operand(low);
                let high = self.operand(high);
                format!("{column} BETWEEN {low} AND {high}")
            }
            Filter::In {
                column,
                values,
                negated,
            } => {
                if values.is_empty() {
                    return if *negated { "1 = 1" } else { "1 = 0" }.to_string();
                }
                let column = (self.quote)(column);
                let items: Vec<String> = values.iter().map(|v| self.operand(v)).collect();
                let keyword = if *negated { "NOT IN" } else { "IN" };
                format!("{column} {keyword} ({})", items.join(", "))
            }
            Filter::And(left, right) => {
                let left = self.walk(left);
                let right = self.walk(right);
                format!("({left}) AND ({right})")
            }
            Filter::Or(left, right) => {
                let left = self.walk(left);
                let right = self.walk(right);
                format!("({left}) OR ({right})")
            }
            Filter::Not(inner) => {
                let inner = self.walk(inner);
                format!("NOT ({inner})")
            }
        }
    }

    fn finish(&self) -> Result<()> {
        if self.placeholders == self.values.len() {
            Ok(())
        } else {
            Err(Error::ParameterMismatch {
                placeholders: self.placeholders,
                values: self.values.len(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{PostgresDialect, SqliteDialect};

    fn count_placeholders(sql: &str) -> usize {
        sql.matches('$').count()
    }

    #[test]
    fn test_simple_eq() {
        let clause = Filter::eq("status", "active")
            .compile(&SqliteDialect::new(), 0)
            .unwrap();
        assert_eq!(clause.sql, "WHERE \"status\" = ?1");
        assert_eq!(clause.parameters.len(), 1);
        assert_eq!(clause.parameters[0].name, "par0");
    }

    #[test]
    fn test_offset_shifts_placeholders_and_names() {
        let clause = Filter::eq("a", 1)
            .and(Filter::eq("b", 2))
            .compile(&PostgresDialect::new(), 3)
            .unwrap();
        assert_eq!(clause.sql, "WHERE (\"a\" = $4) AND (\"b\" = $5)");
        let names: Vec<&str> = clause.parameters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["par3", "par4"]);
        assert_eq!(clause.parameters[1].index, 4);
    }

    #[test]
    fn test_null_does_not_consume_placeholder() {
        let filter = Filter::eq("deleted_at", SqlValue::Null).and(Filter::eq("name", "x"));
        let clause = filter.compile(&SqliteDialect::new(), 0).unwrap();
        assert_eq!(
            clause.sql,
            "WHERE (\"deleted_at\" IS NULL) AND (\"name\" = ?1)"
        );
        assert_eq!(clause.parameters.len(), 1);
        assert_eq!(filter.extract_values(), vec![SqlValue::Text("x".into())]);
    }

    #[test]
    fn test_ne_null_and_inline_null_operand() {
        let clause = Filter::is_not_null("a")
            .or(Filter::gt("b", SqlValue::Null))
            .compile(&SqliteDialect::new(), 0)
            .unwrap();
        assert_eq!(clause.sql, "WHERE (\"a\" IS NOT NULL) OR (\"b\" > NULL)");
        assert!(clause.parameters.is_empty());
    }

    #[test]
    fn test_between_orders_low_before_high() {
        let filter = Filter::between("age", 18, 65);
        let clause = filter.compile(&PostgresDialect::new(), 0).unwrap();
        assert_eq!(clause.sql, "WHERE \"age\" BETWEEN $1 AND $2");
        assert_eq!(
            filter.extract_values(),
            vec![SqlValue::Int(18), SqlValue::Int(65)]
        );
    }

    #[test]
    fn test_in_list_with_null_item() {
        let filter = Filter::in_list(
            "status",
            vec![
                SqlValue::Text("a".into()),
                SqlValue::Null,
                SqlValue::Text("b".into()),
            ],
        );
        let clause = filter.compile(&PostgresDialect::new(), 0).unwrap();
        assert_eq!(clause.sql, "WHERE \"status\" IN ($1, NULL, $2)");
        assert_eq!(clause.parameters.len(), 2);
    }

    #[test]
    fn test_empty_in_lists() {
        let d = SqliteDialect::new();
        let empty: Vec<i64> = Vec::new();
        assert_eq!(
            Filter::in_list("a", empty.clone()).render(&d, 0).unwrap(),
            "WHERE 1 = 0"
        );
        assert_eq!(
            Filter::not_in_list("a", empty).render(&d, 0).unwrap(),
            "WHERE 1 = 1"
        );
    }

    #[test]
    fn test_not_and_like() {
        let clause = Filter::like("name", "A%")
            .not()
            .compile(&SqliteDialect::new(), 0)
            .unwrap();
        assert_eq!(clause.sql, "WHERE NOT (\"name\" LIKE ?1)");
    }

    #[test]
    fn test_qualified_column_is_quoted_per_part() {
        let sql = Filter::eq("u.id", 1)
            .render(&SqliteDialect::new(), 0)
            .unwrap();
        assert_eq!(sql, "WHERE \"u\".\"id\" = ?1");
    }

    #[test]
    fn test_render_and_extract_agree_for_nested_trees() {
        let filters = vec![
            Filter::eq("a", 1),
            Filter::eq("a", SqlValue::Null)
                .or(Filter::between("b", SqlValue::Int(1), SqlValue::Null)),
            Filter::in_list("c", vec![1, 2, 3])
                .and(Filter::ne("d", "x").not())
                .or(Filter::is_null("e").and(Filter::le("f", 2.5))),
            Filter::not_in_list("g", vec![SqlValue::Null, SqlValue::Int(4)]),
        ];
        let dialect = PostgresDialect::new();
        for offset in [0, 2, 7] {
            for filter in &filters {
                let sql = filter.render(&dialect, offset).unwrap();
                assert_eq!(count_placeholders(&sql), filter.extract_values().len());
            }
        }
    }
}

//! Named statement parameters.
//!
//! Every parameter carries the zero-based index of the placeholder it binds.
//! Statements assembled from several fragments (an UPDATE's SET list followed
//! by a WHERE clause) keep indexes unique by threading an offset from one
//! fragment into the next, so position `i` of a statement's parameter list
//! always binds placeholder `i`.

use crate::value::SqlValue;

/// Default buffer size requested for output parameters.
pub const DEFAULT_OUT_SIZE: usize = 4000;

/// An input value bound to a numbered placeholder.
#[derive(Debug, Clone, PartialEq)]
pub struct InParameter {
    /// Parameter name (e.g. `par3`).
    pub name: String,
    /// Zero-based placeholder index.
    pub index: usize,
    /// Bound value.
    pub value: SqlValue,
}

/// An output slot populated by the database after execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutParameter {
    /// Parameter name (e.g. `returning_id`).
    pub name: String,
    /// Requested buffer size for drivers that need one.
    pub size: usize,
}

impl OutParameter {
    /// Creates the output slot used to return `column` from an insert.
    #[must_use]
    pub fn returning(column: &str) -> Self {
        Self {
            name: format!("returning_{column}"),
            size: DEFAULT_OUT_SIZE,
        }
    }
}

/// A statement parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Parameter {
    /// Input value.
    In(InParameter),
    /// Output slot.
    Out(OutParameter),
}

impl Parameter {
    /// Parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::In(p) => &p.name,
            Self::Out(p) => &p.name,
        }
    }

    /// The bound input value, `None` for output slots.
    #[must_use]
    pub fn value(&self) -> Option<&SqlValue> {
        match self {
            Self::In(p) => Some(&p.value),
            Self::Out(_) => None,
        }
    }
}

impl From<InParameter> for Parameter {
    fn from(p: InParameter) -> Self {
        Self::In(p)
    }
}

/// Converts a list of input parameters into statement parameters.
#[must_use]
pub fn inputs(parameters: Vec<InParameter>) -> Vec<Parameter> {
    parameters.into_iter().map(Parameter::In).collect()
}

/// An insert whose generated column value is read back after execution.
///
/// The output slot is part of the statement description rather than a
/// mutable parameter: the executing backend returns the slot's value.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturningInsert {
    /// Statement text.
    pub sql: String,
    /// Input parameters, numbered from zero.
    pub parameters: Vec<InParameter>,
    /// The slot receiving the returned column.
    pub out: OutParameter,
}

impl ReturningInsert {
    /// Input parameters followed by the output slot, in binding order.
    #[must_use]
    pub fn bound_parameters(&self) -> Vec<Parameter> {
        let mut all = inputs(self.parameters.clone());
        all.push(Parameter::Out(self.out.clone()));
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_returning_insert_binds_out_last() {
        let stmt = ReturningInsert {
            sql: "INSERT INTO \"t\" (\"a\") VALUES (?1) RETURNING \"id\"".to_string(),
            parameters: vec![InParameter {
                name: "par0".to_string(),
                index: 0,
                value: SqlValue::Int(1),
            }],
            out: OutParameter::returning("id"),
        };
        let bound = stmt.bound_parameters();
        assert_eq!(bound.len(), 2);
        assert_eq!(bound[0].name(), "par0");
        assert_eq!(bound[1].name(), "returning_id");
        assert!(bound[1].value().is_none());
    }
}

//! Migration operations.
//!
//! [`SchemaOperation`] is the vocabulary a migration is written in. Each
//! operation applies itself through a [`DataClient`], and most can produce
//! their own inverse, which is how a list of operations becomes a reversible
//! migration without hand-written down logic.

use serde::{Deserialize, Serialize};
use strata_core::client::DataClient;
use strata_core::filter::Filter;
use strata_core::schema::{Column, ForeignKey, Table};
use strata_core::value::SqlValue;

/// A single schema or data change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SchemaOperation {
    /// Create a new table.
    CreateTable {
        /// Table definition.
        table: Table,
    },

    /// Drop a table.
    DropTable {
        /// Table name.
        name: String,
    },

    /// Rename a table.
    RenameTable {
        /// Old table name.
        old_name: String,
        /// New table name.
        new_name: String,
    },

    /// Add a column to a table.
    AddColumn {
        /// Table name.
        table: String,
        /// Column definition.
        column: Column,
    },

    /// Drop a column from a table.
    DropColumn {
        /// Table name.
        table: String,
        /// Column name.
        column_name: String,
    },

    /// Rename a column.
    RenameColumn {
        /// Table name.
        table: String,
        /// Old column name.
        old_name: String,
        /// New column name.
        new_name: String,
    },

    /// Change a column definition.
    ModifyColumn {
        /// Table name.
        table: String,
        /// Column name.
        column_name: String,
        /// New definition.
        column: Column,
        /// Original definition (for reversal).
        original: Option<Column>,
    },

    /// Add a primary key; `None` names it `pk_<table>`.
    AddPrimaryKey {
        /// Table name.
        table: String,
        /// Constraint name.
        name: Option<String>,
        /// Key columns.
        columns: Vec<String>,
    },

    /// Drop a primary key; `None` means `pk_<table>`.
    DropPrimaryKey {
        /// Table name.
        table: String,
        /// Constraint name.
        name: Option<String>,
    },

    /// Add a foreign key.
    AddForeignKey {
        /// Foreign key definition.
        foreign_key: ForeignKey,
    },

    /// Drop a foreign key.
    DropForeignKey {
        /// Table name.
        table: String,
        /// Constraint name.
        name: String,
    },

    /// Add a unique key.
    AddUniqueKey {
        /// Table name.
        table: String,
        /// Constraint name.
        name: String,
        /// Key columns.
        columns: Vec<String>,
    },

    /// Drop a unique key.
    DropUniqueKey {
        /// Table name.
        table: String,
        /// Constraint name.
        name: String,
    },

    /// Create an index.
    AddIndex {
        /// Table name.
        table: String,
        /// Index name.
        name: String,
        /// Indexed columns.
        columns: Vec<String>,
    },

    /// Drop an index.
    DropIndex {
        /// Table name.
        table: String,
        /// Index name.
        name: String,
    },

    /// Set a table comment.
    AddTableComment {
        /// Table name.
        table: String,
        /// Comment text.
        comment: String,
    },

    /// Remove a table comment.
    RemoveTableComment {
        /// Table name.
        table: String,
    },

    /// Set a column comment.
    AddColumnComment {
        /// Table name.
        table: String,
        /// Column name.
        column: String,
        /// Comment text.
        comment: String,
    },

    /// Remove a column comment.
    RemoveColumnComment {
        /// Table name.
        table: String,
        /// Column name.
        column: String,
    },

    /// Insert one row.
    Insert {
        /// Table name.
        table: String,
        /// Target columns.
        columns: Vec<String>,
        /// Row values, one per column.
        values: Vec<SqlValue>,
    },

    /// Update rows.
    Update {
        /// Table name.
        table: String,
        /// Assigned columns.
        columns: Vec<String>,
        /// Assigned values, one per column.
        values: Vec<SqlValue>,
        /// Rows to update; all rows when absent.
        filter: Option<Filter>,
    },

    /// Delete rows.
    Delete {
        /// Table name.
        table: String,
        /// Rows to delete; all rows when absent.
        filter: Option<Filter>,
    },

    /// Run raw SQL.
    RunSql {
        /// SQL to run forward.
        forward: String,
        /// SQL to run backward (for reversal).
        backward: Option<String>,
    },
}

impl SchemaOperation {
    /// Creates a `CreateTable` operation.
    #[must_use]
    pub fn create_table(table: Table) -> Self {
        Self::CreateTable { table }
    }

    /// Creates a `DropTable` operation.
    #[must_use]
    pub fn drop_table(name: impl Into<String>) -> Self {
        Self::DropTable { name: name.into() }
    }

    /// Creates a `RenameTable` operation.
    #[must_use]
    pub fn rename_table(old_name: impl Into<String>, new_name: impl Into<String>) -> Self {
        Self::RenameTable {
            old_name: old_name.into(),
            new_name: new_name.into(),
        }
    }

    /// Creates an `AddColumn` operation.
    #[must_use]
    pub fn add_column(table: impl Into<String>, column: Column) -> Self {
        Self::AddColumn {
            table: table.into(),
            column,
        }
    }

    /// Creates a `DropColumn` operation.
    #[must_use]
    pub fn drop_column(table: impl Into<String>, column_name: impl Into<String>) -> Self {
        Self::DropColumn {
            table: table.into(),
            column_name: column_name.into(),
        }
    }

    /// Creates a `RenameColumn` operation.
    pub fn rename_column(
        table: impl Into<String>,
        old_name: impl Into<String>,
        new_name: impl Into<String>,
    ) -> Self {
        Self::RenameColumn {
            table: table.into(),
            old_name: old_name.into(),
            new_name: new_name.into(),
        }
    }

    /// Creates an `AddIndex` operation.
    #[must_use]
    pub fn add_index(table: impl Into<String>, name: impl Into<String>, columns: &[&str]) -> Self {
        Self::AddIndex {
            table: table.into(),
            name: name.into(),
            columns: columns.iter().map(ToString::to_string).collect(),
        }
    }

    /// Creates an `Insert` operation.
    #[must_use]
    pub fn insert(table: impl Into<String>, columns: &[&str], values: Vec<SqlValue>) -> Self {
        Self::Insert {
            table: table.into(),
            columns: columns.iter().map(ToString::to_string).collect(),
            values,
        }
    }

    /// Creates a `RunSql` operation.
    #[must_use]
    pub fn run_sql(forward: impl Into<String>, backward: Option<String>) -> Self {
        Self::RunSql {
            forward: forward.into(),
            backward,
        }
    }

    /// Applies the operation.
    ///
    /// # Errors
    ///
    /// Returns whatever the client reports.
    pub fn apply(&self, client: &mut DataClient) -> strata_core::Result<()> {
        match self {
            Self::CreateTable { table } => client.add_table(&table.name, table.columns.clone()),
            Self::DropTable { name } => client.remove_table(name),
            Self::RenameTable { old_name, new_name } => client.rename_table(old_name, new_name),
            Self::AddColumn { table, column } => client.add_column(table, column),
            Self::DropColumn { table, column_name } => client.remove_column(table, column_name),
            Self::RenameColumn {
                table,
                old_name,
                new_name,
            } => client.rename_column(table, old_name, new_name),
            Self::ModifyColumn {
                table,
                column_name,
                column,
                ..
            } => client.modify_column(table, column_name, column),
            Self::AddPrimaryKey {
                table,
                name: Some(name),
                columns,
            } => client.add_named_primary_key(table, name, columns),
            Self::AddPrimaryKey {
                table,
                name: None,
                columns,
            } => client.add_primary_key(table, columns),
            Self::DropPrimaryKey {
                table,
                name: Some(name),
            } => client.remove_named_primary_key(table, name),
            Self::DropPrimaryKey { table, name: None } => client.remove_primary_key(table),
            Self::AddForeignKey { foreign_key } => client.add_foreign_key(foreign_key),
            Self::DropForeignKey { table, name } => client.remove_foreign_key(name, table),
            Self::AddUniqueKey {
                table,
                name,
                columns,
            } => client.add_unique_key(name, table, columns),
            Self::DropUniqueKey { table, name } => client.remove_unique_key(name, table),
            Self::AddIndex {
                table,
                name,
                columns,
            } => client.add_index(name, table, columns),
            Self::DropIndex { table, name } => client.remove_index(name, table),
            Self::AddTableComment { table, comment } => client.add_table_comment(table, comment),
            Self::RemoveTableComment { table } => client.remove_table_comment(table),
            Self::AddColumnComment {
                table,
                column,
                comment,
            } => client.add_column_comment(table, column, comment),
            Self::RemoveColumnComment { table, column } => {
                client.remove_column_comment(table, column)
            }
            Self::Insert {
                table,
                columns,
                values,
            } => client
                .insert(table, columns, Some(values.clone()))
                .map(drop),
            Self::Update {
                table,
                columns,
                values,
                filter,
            } => client
                .update(table, columns, Some(values.clone()), filter.as_ref())
                .map(drop),
            Self::Delete { table, filter } => client.delete(table, filter.as_ref()).map(drop),
            Self::RunSql { forward, .. } => client.execute(forward, &[]).map(drop),
        }
    }

    /// Short human-readable description, used in logs.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::CreateTable { table } => format!("Create table {}", table.name),
            Self::DropTable { name } => format!("Drop table {name}"),
            Self::RenameTable { old_name, new_name } => {
                format!("Rename table {old_name} to {new_name}")
            }
            Self::AddColumn { table, column } => format!("Add column {} to {table}", column.name),
            Self::DropColumn { table, column_name } => {
                format!("Drop column {column_name} from {table}")
            }
            Self::RenameColumn {
                table,
                old_name,
                new_name,
            } => format!("Rename column {table}.{old_name} to {new_name}"),
            Self::ModifyColumn {
                table, column_name, ..
            } => format!("Modify column {table}.{column_name}"),
            Self::AddPrimaryKey { table, .. } => format!("Add primary key to {table}"),
            Self::DropPrimaryKey { table, .. } => format!("Drop primary key of {table}"),
            Self::AddForeignKey { foreign_key } => {
                format!("Add foreign key {} to {}", foreign_key.name, foreign_key.table)
            }
            Self::DropForeignKey { table, name } => format!("Drop foreign key {name} from {table}"),
            Self::AddUniqueKey { table, name, .. } => format!("Add unique key {name} to {table}"),
            Self::DropUniqueKey { table, name } => format!("Drop unique key {name} from {table}"),
            Self::AddIndex { table, name, .. } => format!("Create index {name} on {table}"),
            Self::DropIndex { table, name } => format!("Drop index {name} on {table}"),
            Self::AddTableComment { table, .. } => format!("Comment table {table}"),
            Self::RemoveTableComment { table } => format!("Remove comment of table {table}"),
            Self::AddColumnComment { table, column, .. } => {
                format!("Comment column {table}.{column}")
            }
            Self::RemoveColumnComment { table, column } => {
                format!("Remove comment of column {table}.{column}")
            }
            Self::Insert { table, .. } => format!("Insert into {table}"),
            Self::Update { table, .. } => format!("Update {table}"),
            Self::Delete { table, .. } => format!("Delete from {table}"),
            Self::RunSql { .. } => "Run SQL".to_string(),
        }
    }

    /// Returns whether the operation can be inverted.
    #[must_use]
    pub fn is_reversible(&self) -> bool {
        self.reverse().is_some()
    }

    /// Returns the inverse operation, when it can be derived from this one.
    #[must_use]
    pub fn reverse(&self) -> Option<Self> {
        match self {
            Self::CreateTable { table } => Some(Self::drop_table(table.name.clone())),

            Self::RenameTable { old_name, new_name } => {
                Some(Self::rename_table(new_name.clone(), old_name.clone()))
            }

            Self::AddColumn { table, column } => {
                Some(Self::drop_column(table.clone(), column.name.clone()))
            }

            Self::RenameColumn {
                table,
                old_name,
                new_name,
            } => Some(Self::rename_column(
                table.clone(),
                new_name.clone(),
                old_name.clone(),
            )),

            Self::ModifyColumn {
                table,
                column_name,
                column,
                original,
            } => original.as_ref().map(|orig| Self::ModifyColumn {
                table: table.clone(),
                column_name: column_name.clone(),
                column: orig.clone(),
                original: Some(column.clone()),
            }),

            Self::AddPrimaryKey { table, name, .. } => Some(Self::DropPrimaryKey {
                table: table.clone(),
                name: name.clone(),
            }),

            Self::AddForeignKey { foreign_key } => Some(Self::DropForeignKey {
                table: foreign_key.table.clone(),
                name: foreign_key.name.clone(),
            }),

            Self::AddUniqueKey { table, name, .. } => Some(Self::DropUniqueKey {
                table: table.clone(),
                name: name.clone(),
            }),

            Self::AddIndex { table, name, .. } => Some(Self::DropIndex {
                table: table.clone(),
                name: name.clone(),
            }),

            Self::AddTableComment { table, .. } => Some(Self::RemoveTableComment {
                table: table.clone(),
            }),

            Self::AddColumnComment { table, column, .. } => Some(Self::RemoveColumnComment {
                table: table.clone(),
                column: column.clone(),
            }),

            // Deletes the inserted row by matching every inserted value.
            Self::Insert {
                table,
                columns,
                values,
            } => columns
                .iter()
                .zip(values)
                .map(|(c, v)| Filter::eq(c, v))
                .reduce(Filter::and)
                .map(|filter| Self::Delete {
                    table: table.clone(),
                    filter: Some(filter),
                }),

            Self::RunSql { forward, backward } => backward.as_ref().map(|bwd| Self::RunSql {
                forward: bwd.clone(),
                backward: Some(forward.clone()),
            }),

            // Dropping loses the definition needed to recreate it.
            Self::DropTable { .. }
            | Self::DropColumn { .. }
            | Self::DropPrimaryKey { .. }
            | Self::DropForeignKey { .. }
            | Self::DropUniqueKey { .. }
            | Self::DropIndex { .. }
            | Self::RemoveTableComment { .. }
            | Self::RemoveColumnComment { .. }
            | Self::Update { .. }
            | Self::Delete { .. } => None,
        }
    }
}

/// Inverts a list of operations: each one reversed, in reverse order.
/// `None` if any operation cannot be reversed.
#[must_use]
pub fn reverse_all(operations: &[SchemaOperation]) -> Option<Vec<SchemaOperation>> {
    operations.iter().rev().map(SchemaOperation::reverse).collect()
}

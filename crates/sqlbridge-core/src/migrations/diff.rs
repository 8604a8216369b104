//! Schema reconciliation.
//!
//! Compares a declared [`ModelSchema`] with the columns and indexes a live
//! table reports and produces a [`TableDiff`]: the changes a dialect needs
//! to render as DDL to bring the table in line with the model.

use crate::dialect::SqlDialect;
use crate::schema::{ColumnMetadata, IndexMetadata, ModelSchema, PropertyDescriptor};

/// A column-level change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnChange {
    /// Declared property missing from the table.
    Add {
        /// Column name.
        name: String,
        /// Declaration to create it with.
        descriptor: PropertyDescriptor,
    },
    /// Column whose type or nullability differs from the declaration.
    Change {
        /// Column name.
        name: String,
        /// Declaration to change it to.
        descriptor: PropertyDescriptor,
    },
    /// Live column the model does not declare.
    Drop {
        /// Column name.
        name: String,
    },
}

/// An index-level change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexChange {
    /// Create `<model>_<column>`.
    Create {
        /// Index name.
        name: String,
        /// Indexed column.
        column: String,
        /// Whether the index is unique.
        unique: bool,
    },
    /// Drop an index.
    Drop {
        /// Index name.
        name: String,
    },
}

/// Everything that separates a live table from its model.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableDiff {
    /// The table does not exist yet.
    pub create_table: bool,
    /// Column changes, declared-order additions and changes first, then
    /// drops in live order.
    pub columns: Vec<ColumnChange>,
    /// Index changes.
    pub indexes: Vec<IndexChange>,
    /// Live columns that survive the change, in live order.
    pub retained: Vec<String>,
}

impl TableDiff {
    /// The diff of a model against a missing table: create the table and
    /// every declared index.
    #[must_use]
    pub fn create(model: &ModelSchema) -> Self {
        Self {
            create_table: true,
            columns: Vec::new(),
            indexes: model
                .columns()
                .filter(|(_, d)| d.wants_index())
                .map(|(name, d)| IndexChange::Create {
                    name: model.index_name(name),
                    column: name.to_string(),
                    unique: d.unique,
                })
                .collect(),
            retained: Vec::new(),
        }
    }

    /// Returns `true` if the table already matches the model.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.create_table && self.columns.is_empty() && self.indexes.is_empty()
    }

    /// Returns `true` if any existing column must be altered in place.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        self.columns
            .iter()
            .any(|c| matches!(c, ColumnChange::Change { .. }))
    }
}

fn normalize_type(sql_type: &str) -> String {
    sql_type
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase()
}

fn column_differs<D: SqlDialect + ?Sized>(
    dialect: &D,
    live: &ColumnMetadata,
    declared: &PropertyDescriptor,
) -> bool {
    live.nullable != declared.allow_null
        || normalize_type(&live.sql_type) != normalize_type(&dialect.column_type(declared))
}

/// Diffs `model` against the live table described by `columns` and
/// `indexes`. An empty column list means the table does not exist.
#[must_use]
pub fn reconcile<D: SqlDialect + ?Sized>(
    dialect: &D,
    model: &ModelSchema,
    columns: &[ColumnMetadata],
    indexes: &[IndexMetadata],
) -> TableDiff {
    if columns.is_empty() {
        return TableDiff::create(model);
    }
    let mut diff = TableDiff::default();

    for (name, declared) in model.columns() {
        match columns.iter().find(|c| c.name == name) {
            None => diff.columns.push(ColumnChange::Add {
                name: name.to_string(),
                descriptor: declared.clone(),
            }),
            Some(live) if column_differs(dialect, live, declared) => {
                diff.columns.push(ColumnChange::Change {
                    name: name.to_string(),
                    descriptor: declared.clone(),
                });
            }
            Some(_) => {}
        }
    }
    for live in columns {
        if live.name == "id" || model.get(&live.name).is_some() {
            diff.retained.push(live.name.clone());
        } else {
            diff.columns.push(ColumnChange::Drop {
                name: live.name.clone(),
            });
        }
    }

    for (name, declared) in model.columns() {
        let index_name = model.index_name(name);
        let live = indexes.iter().find(|i| i.name == index_name);
        let create = IndexChange::Create {
            name: index_name.clone(),
            column: name.to_string(),
            unique: declared.unique,
        };
        match (declared.wants_index(), live) {
            (true, None) => diff.indexes.push(create),
            (true, Some(live)) if live.unique != declared.unique => {
                diff.indexes.push(IndexChange::Drop { name: index_name });
                diff.indexes.push(create);
            }
            (false, Some(_)) => diff.indexes.push(IndexChange::Drop { name: index_name }),
            _ => {}
        }
    }
    // Indexes left behind by properties that are no longer declared.
    let prefix = format!("{}_", model.name);
    for live in indexes {
        let orphan = live.name.strip_prefix(&prefix).is_some_and(|property| {
            property != "id"
                && model.get(property).is_none()
                && columns.iter().any(|c| c.name == property)
        });
        if orphan {
            diff.indexes.push(IndexChange::Drop {
                name: live.name.clone(),
            });
        }
    }

    diff
}

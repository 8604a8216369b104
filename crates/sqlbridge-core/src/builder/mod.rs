//! Statement builder.
//!
//! A [`QueryBuilder`] binds a dialect to one registered model and assembles
//! the SELECT/INSERT/UPDATE/DELETE/COUNT statements of the adapter. INSERTs
//! use `?` placeholders and return their parameters; every other statement
//! inlines marshalled literals.
//!
//! # Example
//!
//! ```rust
//! use sqlbridge_core::builder::QueryBuilder;
//! use sqlbridge_core::dialect::GenericDialect;
//! use sqlbridge_core::query::{Filter, Where};
//! use sqlbridge_core::schema::{ModelSchema, PropertyDescriptor};
//!
//! let model = ModelSchema::new("User")
//!     .property("name", PropertyDescriptor::string())
//!     .property("age", PropertyDescriptor::number());
//! let dialect = GenericDialect::new();
//!
//! let sql = QueryBuilder::new(&dialect, &model)
//!     .select(&Filter::new().where_clause(Where::new().between("age", 20, 40)))
//!     .unwrap();
//!
//! assert_eq!(sql, "SELECT * FROM `User` WHERE `age` BETWEEN 20 AND 40");
//! ```

mod delete;
mod insert;
mod select;
mod update;

use crate::dialect::SqlDialect;
use crate::error::Result;
use crate::query::{OrMode, Where, WhereCompiler};
use crate::schema::ModelSchema;

/// Builds the statements of one model.
#[derive(Debug, Clone, Copy)]
pub struct QueryBuilder<'a, D: ?Sized> {
    dialect: &'a D,
    model: &'a ModelSchema,
    or_mode: OrMode,
}

impl<'a, D: SqlDialect + ?Sized> QueryBuilder<'a, D> {
    /// Creates a builder for `model`.
    #[must_use]
    pub const fn new(dialect: &'a D, model: &'a ModelSchema) -> Self {
        Self {
            dialect,
            model,
            or_mode: OrMode::Grouped,
        }
    }

    /// Selects how `or` branches are combined.
    #[must_use]
    pub const fn or_mode(mut self, or_mode: OrMode) -> Self {
        self.or_mode = or_mode;
        self
    }

    /// Returns the escaped table name.
    #[must_use]
    pub fn table(&self) -> String {
        self.dialect.quote_identifier(self.model.table_name())
    }

    fn id_column(&self) -> String {
        self.dialect.quote_identifier("id")
    }

    /// Compiles a condition tree against this model.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidCondition`](crate::QueryError::InvalidCondition)
    /// for malformed operator values.
    pub fn compile_where(&self, tree: &Where) -> Result<String> {
        WhereCompiler::new(self.dialect, self.model)
            .or_mode(self.or_mode)
            .compile(tree)
    }
}

/// Appends ` <clause>` when the clause is not empty.
fn push_clause(sql: &mut String, clause: &str) {
    if !clause.is_empty() {
        sql.push(' ');
        sql.push_str(clause);
    }
}

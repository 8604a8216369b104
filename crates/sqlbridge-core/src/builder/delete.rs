//! DELETE statements.
//!
//! A condition is required: `remove` without a `where` is a caller error.
//! Deleting every row needs either an explicitly empty tree or
//! [`QueryBuilder::delete_all`].

use super::{push_clause, QueryBuilder};
use crate::dialect::SqlDialect;
use crate::error::{QueryError, Result};
use crate::query::Where;

impl<D: SqlDialect + ?Sized> QueryBuilder<'_, D> {
    /// `DELETE FROM <table> WHERE ...`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::MissingWhere`] when `tree` is `None`, or an
    /// error if the tree does not compile.
    pub fn delete(&self, tree: Option<&Where>) -> Result<String> {
        let tree = tree.ok_or(QueryError::MissingWhere)?;
        let mut sql = format!("DELETE FROM {}", self.table());
        push_clause(&mut sql, &self.compile_where(tree)?);
        Ok(sql)
    }

    /// `DELETE FROM <table> WHERE id = <id>`
    #[must_use]
    pub fn delete_by_id(&self, id: i64) -> String {
        format!("DELETE FROM {} WHERE {} = {id}", self.table(), self.id_column())
    }

    /// `DELETE FROM <table>`
    #[must_use]
    pub fn delete_all(&self) -> String {
        format!("DELETE FROM {}", self.table())
    }
}

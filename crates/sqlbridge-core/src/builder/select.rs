//! SELECT, lookup by id, existence and COUNT statements.

use super::{push_clause, QueryBuilder};
use crate::dialect::SqlDialect;
use crate::error::Result;
use crate::query::{Direction, Filter, Where};

impl<D: SqlDialect + ?Sized> QueryBuilder<'_, D> {
    /// `SELECT * FROM <table>` with the filter's condition, ordering and
    /// pagination.
    ///
    /// # Errors
    ///
    /// Returns an error if the condition tree does not compile.
    pub fn select(&self, filter: &Filter) -> Result<String> {
        let mut sql = format!("SELECT * FROM {}", self.table());
        push_clause(&mut sql, &self.compile_where(&filter.where_clause)?);
        if !filter.order.is_empty() {
            let terms: Vec<String> = filter
                .order
                .iter()
                .map(|o| {
                    let field = self.dialect.escape_field(&o.field);
                    match o.direction {
                        Direction::Asc => field,
                        Direction::Desc => format!("{field} DESC"),
                    }
                })
                .collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&terms.join(", "));
        }
        if let Some(limit) = self.dialect.limit_clause(filter.limit, filter.offset) {
            push_clause(&mut sql, &limit);
        }
        Ok(sql)
    }

    /// `SELECT * FROM <table> WHERE id = <id> LIMIT 1`
    #[must_use]
    pub fn find_by_id(&self, id: i64) -> String {
        format!(
            "SELECT * FROM {} WHERE {} = {id} LIMIT 1",
            self.table(),
            self.id_column()
        )
    }

    /// `SELECT 1 FROM <table> WHERE id = <id> LIMIT 1`
    #[must_use]
    pub fn exists(&self, id: i64) -> String {
        format!(
            "SELECT 1 FROM {} WHERE {} = {id} LIMIT 1",
            self.table(),
            self.id_column()
        )
    }

    /// `SELECT count(*) as cnt FROM <table>` with an optional condition.
    ///
    /// # Errors
    ///
    /// Returns an error if the condition tree does not compile.
    pub fn count(&self, tree: Option<&Where>) -> Result<String> {
        let mut sql = format!("SELECT count(*) as cnt FROM {}", self.table());
        if let Some(tree) = tree {
            push_clause(&mut sql, &self.compile_where(tree)?);
        }
        Ok(sql)
    }
}

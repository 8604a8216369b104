//! Schema introspection trait.
//!
//! The core crate never talks to a database. A dialect that implements
//! [`Introspect`] says which statements describe a live table and how to
//! read their rows; the adapter crate runs them through its driver.

use crate::dialect::SqlDialect;
use crate::schema::{ColumnMetadata, IndexMetadata};
use crate::value::StoredRow;

/// Reads the current shape of a table.
pub trait Introspect: SqlDialect {
    /// Statement listing the columns of `table`. Returns no row when the
    /// table does not exist.
    fn table_info_sql(&self, table: &str) -> String;

    /// Statement listing the indexes of `table`.
    fn index_list_sql(&self, table: &str) -> String;

    /// Parses one row of [`Introspect::table_info_sql`].
    fn column_from_row(&self, row: &StoredRow) -> Option<ColumnMetadata>;

    /// Parses one row of [`Introspect::index_list_sql`].
    fn index_from_row(&self, row: &StoredRow) -> Option<IndexMetadata>;

    /// Parses every column row, skipping rows that do not parse.
    fn columns_from_rows(&self, rows: &[StoredRow]) -> Vec<ColumnMetadata> {
        rows.iter().filter_map(|r| self.column_from_row(r)).collect()
    }

    /// Parses every index row. Engines listing one row per indexed column
    /// are collapsed to one entry per index name.
    fn indexes_from_rows(&self, rows: &[StoredRow]) -> Vec<IndexMetadata> {
        let mut out: Vec<IndexMetadata> = Vec::new();
        for index in rows.iter().filter_map(|r| self.index_from_row(r)) {
            if !out.iter().any(|i| i.name == index.name) {
                out.push(index);
            }
        }
        out
    }
}

//! Generic SQL dialect.

use super::SqlDialect;
use crate::migrations::Introspect;
use crate::schema::{ColumnMetadata, IndexMetadata};
use crate::value::{row_value, SqlValue, StoredRow};

/// The default rule table: backtick identifiers, double-quoted strings,
/// `CHANGE COLUMN` alterations and `SHOW` based introspection.
#[derive(Debug, Default, Clone, Copy)]
pub struct GenericDialect;

impl GenericDialect {
    /// Creates a new generic dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl SqlDialect for GenericDialect {
    fn name(&self) -> &'static str {
        "generic"
    }
}

impl Introspect for GenericDialect {
    fn table_info_sql(&self, table: &str) -> String {
        format!("SHOW FIELDS FROM {}", self.quote_identifier(table))
    }

    fn index_list_sql(&self, table: &str) -> String {
        format!("SHOW INDEXES FROM {}", self.quote_identifier(table))
    }

    fn column_from_row(&self, row: &StoredRow) -> Option<ColumnMetadata> {
        let name = row_value(row, "Field")?.as_str()?;
        let sql_type = row_value(row, "Type")?.as_str()?;
        let nullable = row_value(row, "Null").and_then(SqlValue::as_str) == Some("YES");
        let mut column = ColumnMetadata::new(name, sql_type, nullable);
        if row_value(row, "Key").and_then(SqlValue::as_str) == Some("PRI") {
            column = column.primary_key();
        }
        Some(column)
    }

    fn index_from_row(&self, row: &StoredRow) -> Option<IndexMetadata> {
        let name = row_value(row, "Key_name")?.as_str()?;
        let non_unique = row_value(row, "Non_unique")?.as_i64()?;
        Some(IndexMetadata::new(name, non_unique == 0))
    }
}

//! SQLite dialect implementation.

use sqlbridge_core::dialect::SqlDialect;
use sqlbridge_core::migrations::{ColumnChange, IndexChange, Introspect, TableDiff};
use sqlbridge_core::schema::{ColumnMetadata, IndexMetadata, ModelSchema};
use sqlbridge_core::value::{row_value, SqlValue, StoredRow};

/// Suffix of the shadow table used while rebuilding a table.
const REBUILD_SUFFIX: &str = "__rebuild";

/// SQLite dialect.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteDialect;

impl SqliteDialect {
    /// Creates a new SQLite dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Returns `true` if applying `diff` needs a table rebuild.
    #[must_use]
    pub fn needs_rebuild(diff: &TableDiff) -> bool {
        !diff.create_table
            && diff.columns.iter().any(|c| match c {
                ColumnChange::Change { .. } => true,
                ColumnChange::Add { descriptor, .. } => !descriptor.allow_null,
                ColumnChange::Drop { .. } => false,
            })
    }

    fn rebuild(&self, model: &ModelSchema, diff: &TableDiff) -> Vec<String> {
        let table = model.table_name();
        let shadow = format!("{table}{REBUILD_SUFFIX}");
        let mut statements = vec![
            self.drop_table(&shadow),
            self.create_table_named(&shadow, model),
        ];
        if !diff.retained.is_empty() {
            let columns = diff
                .retained
                .iter()
                .map(|c| self.quote_identifier(c))
                .collect::<Vec<_>>()
                .join(", ");
            statements.push(format!(
                "INSERT INTO {} ({columns}) SELECT {columns} FROM {}",
                self.quote_identifier(&shadow),
                self.quote_identifier(table)
            ));
        }
        statements.push(format!("DROP TABLE {}", self.quote_identifier(table)));
        statements.push(format!(
            "ALTER TABLE {} RENAME TO {}",
            self.quote_identifier(&shadow),
            self.quote_identifier(table)
        ));
        // The original indexes went away with the original table.
        statements.extend(
            TableDiff::create(model)
                .indexes
                .iter()
                .map(|c| self.index_statement(table, c)),
        );
        statements
    }
}

impl SqlDialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn string_quote(&self) -> char {
        '\''
    }

    fn backslash_escapes(&self) -> bool {
        false
    }

    fn date_function(&self) -> &'static str {
        "datetime"
    }

    fn replace_into(&self) -> &'static str {
        "INSERT OR REPLACE INTO"
    }

    fn default_values(&self) -> &'static str {
        "DEFAULT VALUES"
    }

    fn limit_clause(&self, limit: Option<u64>, offset: u64) -> Option<String> {
        match (limit, offset) {
            (Some(n), 0) => Some(format!("LIMIT {n}")),
            (Some(n), offset) => Some(format!("LIMIT {offset}, {n}")),
            (None, 0) => None,
            (None, offset) => Some(format!("LIMIT {offset}, -1")),
        }
    }

    fn drop_index(&self, _table: &str, name: &str) -> String {
        // Index names are global to the database, not per table.
        format!("DROP INDEX IF EXISTS {}", self.quote_identifier(name))
    }

    fn render_diff(&self, model: &ModelSchema, diff: &TableDiff) -> Vec<String> {
        if Self::needs_rebuild(diff) {
            return self.rebuild(model, diff);
        }
        let table = model.table_name();
        let mut statements = Vec::new();
        if diff.create_table {
            statements.push(self.create_table(model));
        }
        statements.extend(
            diff.indexes
                .iter()
                .filter(|c| matches!(c, IndexChange::Drop { .. }))
                .map(|c| self.index_statement(table, c)),
        );
        statements.extend(diff.columns.iter().map(|c| {
            format!(
                "ALTER TABLE {} {}",
                self.quote_identifier(table),
                self.alter_specification(c)
            )
        }));
        statements.extend(
            diff.indexes
                .iter()
                .filter(|c| matches!(c, IndexChange::Create { .. }))
                .map(|c| self.index_statement(table, c)),
        );
        statements
    }
}

impl Introspect for SqliteDialect {
    fn table_info_sql(&self, table: &str) -> String {
        format!("PRAGMA table_info({})", self.quote_string(table))
    }

    fn index_list_sql(&self, table: &str) -> String {
        format!("PRAGMA index_list({})", self.quote_string(table))
    }

    fn column_from_row(&self, row: &StoredRow) -> Option<ColumnMetadata> {
        let name = row_value(row, "name")?.as_str()?;
        let sql_type = row_value(row, "type").and_then(SqlValue::as_str).unwrap_or("");
        let not_null = row_value(row, "notnull").and_then(SqlValue::as_i64).unwrap_or(0);
        let pk = row_value(row, "pk").and_then(SqlValue::as_i64).unwrap_or(0);
        let column = ColumnMetadata::new(name, sql_type, not_null == 0);
        Some(if pk > 0 { column.primary_key() } else { column })
    }

    fn index_from_row(&self, row: &StoredRow) -> Option<IndexMetadata> {
        let name = row_value(row, "name")?.as_str()?;
        let unique = row_value(row, "unique").and_then(SqlValue::as_i64).unwrap_or(0);
        Some(IndexMetadata::new(name, unique != 0))
    }
}

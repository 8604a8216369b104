//! SQL Dialect support.
//!
//! A dialect is the rule table of one database engine: how identifiers and
//! strings are quoted, how property types map to column types, and how a
//! [`TableDiff`] turns into DDL. Every rule has a default implementing the
//! MySQL-flavoured table the adapter was designed around; engines override
//! only what differs.

mod generic;

pub use generic::GenericDialect;

use crate::migrations::{ColumnChange, IndexChange, TableDiff};
use crate::schema::{ModelSchema, PropertyDescriptor, PropertyType};

/// Trait for SQL dialect-specific behavior.
pub trait SqlDialect {
    /// Returns the name of the dialect.
    fn name(&self) -> &'static str;

    /// Returns the identifier quote character.
    fn identifier_quote(&self) -> char {
        '`'
    }

    /// Returns the string literal quote character.
    fn string_quote(&self) -> char {
        '"'
    }

    /// Quotes an identifier, doubling any embedded quote character.
    fn quote_identifier(&self, name: &str) -> String {
        let quote = self.identifier_quote();
        let mut out = String::with_capacity(name.len() + 2);
        out.push(quote);
        for c in name.chars() {
            if c == quote {
                out.push(quote);
            }
            out.push(c);
        }
        out.push(quote);
        out
    }

    /// Escapes a (possibly qualified) field reference segment by segment.
    fn escape_field(&self, field: &str) -> String {
        field
            .split('.')
            .map(|segment| self.quote_identifier(segment))
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Returns `true` if a backslash starts an escape sequence inside
    /// string literals.
    fn backslash_escapes(&self) -> bool {
        true
    }

    /// Quotes a string literal. The quote character is doubled and NUL
    /// bytes are dropped. Where backslashes are escapes, backslashes and
    /// line breaks are escaped too.
    fn quote_string(&self, value: &str) -> String {
        let quote = self.string_quote();
        let escapes = self.backslash_escapes();
        let mut out = String::with_capacity(value.len() + 2);
        out.push(quote);
        for c in value.chars() {
            match c {
                '\0' => {}
                c if c == quote => {
                    out.push(quote);
                    out.push(quote);
                }
                '\\' if escapes => out.push_str("\\\\"),
                '\n' if escapes => out.push_str("\\n"),
                '\r' if escapes => out.push_str("\\r"),
                '\x1a' if escapes => out.push_str("\\Z"),
                c => out.push(c),
            }
        }
        out.push(quote);
        out
    }

    /// Function wrapped around each bound of a `BETWEEN` on a date field.
    fn date_function(&self) -> &'static str {
        "TIMESTAMP"
    }

    /// Statement prefix for insert-or-replace.
    fn replace_into(&self) -> &'static str {
        "REPLACE INTO"
    }

    /// Tail of an INSERT that provides no column at all.
    fn default_values(&self) -> &'static str {
        "() VALUES ()"
    }

    /// Renders the pagination clause, if any.
    fn limit_clause(&self, limit: Option<u64>, offset: u64) -> Option<String> {
        limit.map(|n| {
            if offset > 0 {
                format!("LIMIT {offset}, {n}")
            } else {
                format!("LIMIT {n}")
            }
        })
    }

    /// Maps a property declaration to a column type.
    fn column_type(&self, descriptor: &PropertyDescriptor) -> String {
        match descriptor.kind {
            PropertyType::String => format!("VARCHAR({})", descriptor.limit.unwrap_or(255)),
            PropertyType::Text | PropertyType::Json => String::from("TEXT"),
            PropertyType::Number => format!("INT({})", descriptor.limit.unwrap_or(11)),
            PropertyType::Date => String::from("DATETIME"),
            PropertyType::Boolean => String::from("TINYINT(1)"),
        }
    }

    /// Renders `<type> NULL|NOT NULL` for a property.
    fn column_settings(&self, descriptor: &PropertyDescriptor) -> String {
        let null = if descriptor.allow_null {
            "NULL"
        } else {
            "NOT NULL"
        };
        format!("{} {null}", self.column_type(descriptor))
    }

    /// Renders a full column definition.
    fn column_definition(&self, name: &str, descriptor: &PropertyDescriptor) -> String {
        format!(
            "{} {}",
            self.quote_identifier(name),
            self.column_settings(descriptor)
        )
    }

    /// Renders the primary key column definition.
    fn primary_key_definition(&self) -> String {
        format!("{} INTEGER PRIMARY KEY", self.quote_identifier("id"))
    }

    /// Generates CREATE TABLE for a model under an explicit table name.
    fn create_table_named(&self, table: &str, model: &ModelSchema) -> String {
        let mut columns = vec![self.primary_key_definition()];
        columns.extend(
            model
                .columns()
                .map(|(name, descriptor)| self.column_definition(name, descriptor)),
        );
        format!(
            "CREATE TABLE {} (\n  {}\n)",
            self.quote_identifier(table),
            columns.join(",\n  ")
        )
    }

    /// Generates CREATE TABLE for a model.
    fn create_table(&self, model: &ModelSchema) -> String {
        self.create_table_named(model.table_name(), model)
    }

    /// Generates DROP TABLE.
    fn drop_table(&self, table: &str) -> String {
        format!("DROP TABLE IF EXISTS {}", self.quote_identifier(table))
    }

    /// Generates CREATE INDEX on a single column.
    fn create_index(&self, table: &str, name: &str, column: &str, unique: bool) -> String {
        format!(
            "CREATE {}INDEX {} ON {} ({} ASC)",
            if unique { "UNIQUE " } else { "" },
            self.quote_identifier(name),
            self.quote_identifier(table),
            self.quote_identifier(column)
        )
    }

    /// Generates DROP INDEX.
    fn drop_index(&self, table: &str, name: &str) -> String {
        format!(
            "DROP INDEX {} ON {}",
            self.quote_identifier(name),
            self.quote_identifier(table)
        )
    }

    /// Renders one column change as an ALTER TABLE specification.
    fn alter_specification(&self, change: &ColumnChange) -> String {
        match change {
            ColumnChange::Add { name, descriptor } => {
                format!("ADD COLUMN {}", self.column_definition(name, descriptor))
            }
            ColumnChange::Change { name, descriptor } => format!(
                "CHANGE COLUMN {} {}",
                self.quote_identifier(name),
                self.column_definition(name, descriptor)
            ),
            ColumnChange::Drop { name } => {
                format!("DROP COLUMN {}", self.quote_identifier(name))
            }
        }
    }

    /// Renders an index change.
    fn index_statement(&self, table: &str, change: &IndexChange) -> String {
        match change {
            IndexChange::Create {
                name,
                column,
                unique,
            } => self.create_index(table, name, column, *unique),
            IndexChange::Drop { name } => self.drop_index(table, name),
        }
    }

    /// Turns a diff into the statements that apply it, in execution order.
    ///
    /// Index drops run first, then every column change in one comma-joined
    /// `ALTER TABLE`, then each index creation as its own statement.
    fn render_diff(&self, model: &ModelSchema, diff: &TableDiff) -> Vec<String> {
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
        if !diff.columns.is_empty() {
            let specs: Vec<String> = diff
                .columns
                .iter()
                .map(|c| self.alter_specification(c))
                .collect();
            statements.push(format!(
                "ALTER TABLE {} {}",
                self.quote_identifier(table),
                specs.join(", ")
            ));
        }
        statements.extend(
            diff.indexes
                .iter()
                .filter(|c| matches!(c, IndexChange::Create { .. }))
                .map(|c| self.index_statement(table, c)),
        );
        statements
    }
}

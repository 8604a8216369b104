//! INSERT and insert-or-replace statements.

use super::QueryBuilder;
use crate::dialect::SqlDialect;
use crate::marshal::{descriptor, to_storage};
use crate::value::{Record, SqlValue};

impl<D: SqlDialect + ?Sized> QueryBuilder<'_, D> {
    /// `INSERT INTO <table> (<keys>) VALUES (?, ...)`.
    ///
    /// Only the keys present in `data` are inserted, in their order.
    #[must_use]
    pub fn insert(&self, data: &Record) -> (String, Vec<SqlValue>) {
        self.insert_with("INSERT INTO", data)
    }

    /// Same as [`QueryBuilder::insert`], replacing any row with the same key.
    #[must_use]
    pub fn upsert(&self, data: &Record) -> (String, Vec<SqlValue>) {
        self.insert_with(self.dialect.replace_into(), data)
    }

    fn insert_with(&self, verb: &str, data: &Record) -> (String, Vec<SqlValue>) {
        if data.is_empty() {
            return (
                format!("{verb} {} {}", self.table(), self.dialect.default_values()),
                Vec::new(),
            );
        }
        let mut columns = Vec::with_capacity(data.len());
        let mut params = Vec::with_capacity(data.len());
        for (key, value) in data.iter() {
            columns.push(self.dialect.escape_field(key));
            params.push(to_storage(descriptor(self.model, key), value));
        }
        let placeholders = vec![SqlValue::placeholder(); params.len()].join(", ");
        (
            format!(
                "{verb} {} ({}) VALUES ({placeholders})",
                self.table(),
                columns.join(", ")
            ),
            params,
        )
    }
}

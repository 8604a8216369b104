//! UPDATE statements.

use super::QueryBuilder;
use crate::dialect::SqlDialect;
use crate::error::{QueryError, Result};
use crate::marshal::to_literal;
use crate::value::Record;

impl<D: SqlDialect + ?Sized> QueryBuilder<'_, D> {
    /// `UPDATE <table> SET ... WHERE id = <id>`.
    ///
    /// Keys the model does not declare are ignored, as is `id` itself.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::MissingId`] if `data` has no integer `id`, and
    /// [`QueryError::EmptyUpdate`] if no declared property is left to set.
    pub fn update(&self, data: &Record) -> Result<String> {
        let id = data.id().ok_or_else(|| QueryError::MissingId {
            model: self.model.name.clone(),
        })?;
        let assignments: Vec<String> = data
            .iter()
            .filter(|(key, _)| *key != "id")
            .filter_map(|(key, value)| {
                self.model.get(key).map(|declared| {
                    format!(
                        "{} = {}",
                        self.dialect.escape_field(key),
                        to_literal(self.dialect, Some(declared), value)
                    )
                })
            })
            .collect();
        if assignments.is_empty() {
            return Err(QueryError::EmptyUpdate {
                model: self.model.name.clone(),
            });
        }
        Ok(format!(
            "UPDATE {} SET {} WHERE {} = {id}",
            self.table(),
            assignments.join(", "),
            self.id_column()
        ))
    }
}

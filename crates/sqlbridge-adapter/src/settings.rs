//! Adapter configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use sqlbridge_core::OrMode;

/// Connection and behaviour settings for an [`Adapter`](crate::Adapter).
///
/// Deserializes from the usual settings object:
///
/// ```json
/// { "database": "app.sqlite3", "statementTimeoutMs": 5000, "orMode": "grouped" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdapterSettings {
    /// Database path, `sqlite:` URL or `:memory:`.
    pub database: String,
    /// Upper bound for a single statement, in milliseconds.
    pub statement_timeout_ms: Option<u64>,
    /// Upper bound for a whole migration batch, in milliseconds.
    pub migration_timeout_ms: Option<u64>,
    /// How `or` branches of a condition are combined.
    pub or_mode: OrMode,
}

impl Default for AdapterSettings {
    fn default() -> Self {
        Self {
            database: String::from(":memory:"),
            statement_timeout_ms: None,
            migration_timeout_ms: None,
            or_mode: OrMode::default(),
        }
    }
}

impl AdapterSettings {
    /// Settings for the given database and defaults otherwise.
    #[must_use]
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            ..Self::default()
        }
    }

    /// Sets the per-statement timeout.
    #[must_use]
    pub const fn with_statement_timeout_ms(mut self, millis: u64) -> Self {
        self.statement_timeout_ms = Some(millis);
        self
    }

    /// Sets the migration batch timeout.
    #[must_use]
    pub const fn with_migration_timeout_ms(mut self, millis: u64) -> Self {
        self.migration_timeout_ms = Some(millis);
        self
    }

    /// Sets the `or` combination mode.
    #[must_use]
    pub const fn with_or_mode(mut self, or_mode: OrMode) -> Self {
        self.or_mode = or_mode;
        self
    }

    /// Returns `true` if the database lives in memory and disappears with
    /// the connection.
    #[must_use]
    pub fn is_memory(&self) -> bool {
        let database = self
            .database
            .strip_prefix("sqlite://")
            .or_else(|| self.database.strip_prefix("sqlite:"))
            .unwrap_or(&self.database);
        database.is_empty() || database.starts_with(":memory:") || database.contains("mode=memory")
    }

    /// The per-statement timeout, if any.
    #[must_use]
    pub fn statement_timeout(&self) -> Option<Duration> {
        self.statement_timeout_ms.map(Duration::from_millis)
    }

    /// The migration batch timeout, if any.
    #[must_use]
    pub fn migration_timeout(&self) -> Option<Duration> {
        self.migration_timeout_ms.map(Duration::from_millis)
    }
}

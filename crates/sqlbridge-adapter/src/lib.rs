//! # sqlbridge-adapter
//!
//! An asynchronous ORM adapter over SQLite.
//!
//! This crate provides:
//! - [`Adapter`]: a model registry (`define`, `define_property`) and the
//!   CRUD surface (`create`, `save`, `find_by_id`, `all`, `count`, ...)
//! - Schema synchronization: `automigrate`, `autoupdate`, `plan` and
//!   `is_actual`
//! - The [`Driver`] boundary and [`SqliteDriver`], its `sqlx` implementation
//! - [`AdapterSettings`], deserializable from the usual settings object
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sqlbridge_adapter::{AdapterSettings, SqliteAdapter};
//! use sqlbridge_core::query::{Filter, Where};
//! use sqlbridge_core::{ModelSchema, PropertyDescriptor, Record};
//!
//! async fn example() -> sqlbridge_adapter::Result<()> {
//!     let user = ModelSchema::new("User")
//!         .property("name", PropertyDescriptor::string())
//!         .property("age", PropertyDescriptor::number().indexed());
//!
//!     // In-memory databases are migrated on startup.
//!     let adapter = SqliteAdapter::initialize(AdapterSettings::default(), [user]).await?;
//!
//!     let id = adapter
//!         .create("User", &Record::new().with("name", "Alice").with("age", 30))
//!         .await?;
//!     let alice = adapter.find_by_id("User", id).await?;
//!
//!     let adults = adapter
//!         .all("User", &Filter::new().where_clause(Where::new().gte("age", 18)))
//!         .await?;
//!
//!     adapter.disconnect().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Errors
//!
//! Driver errors are passed through unchanged as [`AdapterError::Database`]
//! and never retried. Caller mistakes, such as a `remove` without a
//! condition, fail before any statement is sent.

mod adapter;
pub mod driver;
pub mod error;
mod migrate;
pub mod settings;

pub use adapter::{Adapter, SqliteAdapter};
pub use driver::{Driver, RunResult, SqliteDriver};
pub use error::{AdapterError, ModelMigrationError, Result};
pub use migrate::MigrationPlan;
pub use settings::AdapterSettings;

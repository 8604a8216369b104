//! # sqlbridge-core
//!
//! The pure part of an ORM-to-SQL adapter: no IO, no driver.
//!
//! This crate provides:
//! - A value marshaller between application values, SQL literals and stored
//!   values ([`marshal`])
//! - A condition compiler turning filter objects into WHERE clauses
//!   ([`query`])
//! - A statement builder for the adapter's CRUD surface ([`builder`])
//! - A schema reconciler diffing a model against a live table
//!   ([`migrations`])
//! - The [`SqlDialect`] rule table those are parameterised over
//!
//! ## Compiling a filter
//!
//! ```rust
//! use sqlbridge_core::dialect::GenericDialect;
//! use sqlbridge_core::query::{Where, WhereCompiler};
//! use sqlbridge_core::schema::{ModelSchema, PropertyDescriptor};
//!
//! let model = ModelSchema::new("User")
//!     .property("name", PropertyDescriptor::string())
//!     .property("age", PropertyDescriptor::number());
//!
//! let tree = Where::try_from(&serde_json::json!({
//!     "name": "Bob",
//!     "age": {"gt": 30},
//! }))
//! .unwrap();
//!
//! let sql = WhereCompiler::new(&GenericDialect::new(), &model)
//!     .compile(&tree)
//!     .unwrap();
//! assert_eq!(sql, "WHERE `name` = \"Bob\" AND `age` > 30");
//! ```
//!
//! ## Injection safety
//!
//! Declared values are always escaped by the dialect. Values of fields the
//! model does not declare are inlined verbatim; never route untrusted input
//! to undeclared fields.

pub mod builder;
pub mod dialect;
pub mod error;
pub mod marshal;
pub mod migrations;
pub mod query;
pub mod schema;
pub mod value;

pub use builder::QueryBuilder;
pub use dialect::{GenericDialect, SqlDialect};
pub use error::QueryError;
pub use migrations::{reconcile, Introspect, TableDiff};
pub use query::{Filter, OrMode, Where};
pub use schema::{ColumnMetadata, IndexMetadata, ModelSchema, PropertyDescriptor, PropertyType};
pub use value::{Record, SqlValue, StoredRow, ToValue, Value};

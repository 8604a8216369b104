//! # sqlbridge-sqlite
//!
//! SQLite rule table for `sqlbridge-core`.
//!
//! # How SQLite differs from the generic rule table
//!
//! - **String literals** use single quotes. SQLite only treats a
//!   double-quoted token as a string when it does not name a column, so
//!   double quotes would silently compare a column with itself.
//! - **Dates** are bounded with [`datetime()`] in `BETWEEN`, since values
//!   are stored as `YYYY-MM-DD HH:MM:SS` text.
//! - **[UPSERT]**: insert-or-replace is `INSERT OR REPLACE INTO`.
//! - **Limited [ALTER TABLE]**: SQLite can `ADD COLUMN` and (since
//!   3.35.0) `DROP COLUMN`, one per statement, but cannot change a
//!   column's type or nullability. Those changes, and adding a `NOT NULL`
//!   column, rebuild the table: create a shadow table, copy the retained
//!   columns, drop the original and rename the shadow.
//! - **Introspection** goes through [`PRAGMA table_info`] and
//!   [`PRAGMA index_list`].
//!
//! [`datetime()`]: https://www.sqlite.org/lang_datefunc.html
//! [UPSERT]: https://www.sqlite.org/lang_insert.html
//! [ALTER TABLE]: https://www.sqlite.org/lang_altertable.html
//! [`PRAGMA table_info`]: https://www.sqlite.org/pragma.html#pragma_table_info
//! [`PRAGMA index_list`]: https://www.sqlite.org/pragma.html#pragma_index_list
//!
//! ## Example
//!
//! ```rust
//! use sqlbridge_core::dialect::SqlDialect;
//! use sqlbridge_core::migrations::reconcile;
//! use sqlbridge_core::schema::{ModelSchema, PropertyDescriptor};
//! use sqlbridge_sqlite::SqliteDialect;
//!
//! let model = ModelSchema::new("User")
//!     .property("name", PropertyDescriptor::string())
//!     .property("age", PropertyDescriptor::number().indexed());
//!
//! let dialect = SqliteDialect::new();
//! let diff = reconcile(&dialect, &model, &[], &[]);
//! let statements = dialect.render_diff(&model, &diff);
//!
//! assert_eq!(statements.len(), 2);
//! assert!(statements[1].starts_with("CREATE INDEX `User_age`"));
//! ```

mod dialect;

pub use dialect::SqliteDialect;

//! Schema synchronization.
//!
//! [`reconcile`] diffs a model against a live table; the dialect's
//! [`render_diff`](crate::dialect::SqlDialect::render_diff) turns the
//! resulting [`TableDiff`] into statements. [`Introspect`] tells the adapter
//! how to read the live table in the first place.

mod diff;
mod introspect;

pub use diff::{reconcile, ColumnChange, IndexChange, TableDiff};
pub use introspect::Introspect;

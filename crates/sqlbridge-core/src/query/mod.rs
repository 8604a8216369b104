//! Condition trees, filters and their compilation into WHERE clauses.

mod compile;
mod condition;
mod filter;

pub use compile::{OrMode, WhereCompiler};
pub use condition::{Condition, Operand, Operator, Where};
pub use filter::{Direction, Filter, OrderBy};

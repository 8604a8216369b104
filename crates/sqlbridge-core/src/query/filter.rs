//! Filters: condition, ordering and pagination of one query.

use super::condition::Where;
use crate::error::{QueryError, Result};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Ascending (the default).
    #[default]
    Asc,
    /// Descending.
    Desc,
}

/// One ORDER BY term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    /// Field name, possibly qualified.
    pub field: String,
    /// Direction.
    pub direction: Direction,
}

impl OrderBy {
    /// Ascending order on `field`.
    #[must_use]
    pub fn asc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            direction: Direction::Asc,
        }
    }

    /// Descending order on `field`.
    #[must_use]
    pub fn desc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            direction: Direction::Desc,
        }
    }

    /// Parses `"name"`, `"name DESC"`, `"-name"` or a comma-separated list
    /// of those.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidCondition`] for an empty term or an
    /// unknown direction.
    pub fn parse(spec: &str) -> Result<Vec<Self>> {
        spec.split(',').map(Self::parse_term).collect()
    }

    fn parse_term(term: &str) -> Result<Self> {
        let term = term.trim();
        if let Some(field) = term.strip_prefix('-') {
            if !field.is_empty() && !field.contains(char::is_whitespace) {
                return Ok(Self::desc(field));
            }
        }
        let mut parts = term.split_whitespace();
        let order = match (parts.next(), parts.next(), parts.next()) {
            (Some(field), None, _) => Self::asc(field),
            (Some(field), Some(dir), None) if dir.eq_ignore_ascii_case("asc") => Self::asc(field),
            (Some(field), Some(dir), None) if dir.eq_ignore_ascii_case("desc") => {
                Self::desc(field)
            }
            _ => {
                return Err(QueryError::InvalidCondition(format!(
                    "invalid order term `{term}`"
                )))
            }
        };
        Ok(order)
    }
}

/// A query filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    /// Condition tree.
    pub where_clause: Where,
    /// ORDER BY terms.
    pub order: Vec<OrderBy>,
    /// Maximum number of rows. `None` (or a parsed `0`) means no limit.
    pub limit: Option<u64>,
    /// Number of rows to skip.
    pub offset: u64,
}

impl Filter {
    /// Creates a filter matching every row.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the condition tree.
    #[must_use]
    pub fn where_clause(mut self, tree: Where) -> Self {
        self.where_clause = tree;
        self
    }

    /// Appends an ORDER BY term.
    #[must_use]
    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order.push(order);
        self
    }

    /// Sets the row limit. A limit of `0` removes it.
    #[must_use]
    pub const fn limit(mut self, limit: u64) -> Self {
        self.limit = if limit == 0 { None } else { Some(limit) };
        self
    }

    /// Sets the number of rows to skip.
    #[must_use]
    pub const fn offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }
}

fn as_count(key: &str, value: &serde_json::Value) -> Result<u64> {
    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
        .ok_or_else(|| {
            QueryError::InvalidCondition(format!("`{key}` must be a non-negative integer"))
        })
}

impl TryFrom<&serde_json::Value> for Filter {
    type Error = QueryError;

    /// Parses `{where, order, limit, offset|skip}`. `order` is a string or
    /// an array of strings.
    fn try_from(json: &serde_json::Value) -> Result<Self> {
        let map = match json {
            serde_json::Value::Null => return Ok(Self::new()),
            serde_json::Value::Object(map) => map,
            other => {
                return Err(QueryError::InvalidCondition(format!(
                    "expected a filter object, got {other}"
                )))
            }
        };
        let mut filter = Self::new();
        for (key, value) in map {
            match key.as_str() {
                "where" => filter.where_clause = Where::try_from(value)?,
                "order" => match value {
                    serde_json::Value::String(spec) => filter.order = OrderBy::parse(spec)?,
                    serde_json::Value::Array(items) => {
                        for item in items {
                            let spec = item.as_str().ok_or_else(|| {
                                QueryError::InvalidCondition(String::from(
                                    "`order` entries must be strings",
                                ))
                            })?;
                            filter.order.extend(OrderBy::parse(spec)?);
                        }
                    }
                    serde_json::Value::Null => {}
                    _ => {
                        return Err(QueryError::InvalidCondition(String::from(
                            "`order` must be a string or an array of strings",
                        )))
                    }
                },
                "limit" if !value.is_null() => filter = filter.limit(as_count(key, value)?),
                "offset" | "skip" if !value.is_null() => filter.offset = as_count(key, value)?,
                _ => {}
            }
        }
        Ok(filter)
    }
}

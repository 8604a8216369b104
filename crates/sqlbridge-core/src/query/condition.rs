//! Condition trees.
//!
//! A [`Where`] maps field names to [`Condition`]s, all combined with AND, plus
//! an ordered list of `or` branches combined with OR. Trees are either built
//! with the fluent methods or parsed from the JSON filter objects ORM layers
//! pass around:
//!
//! ```rust
//! use sqlbridge_core::query::Where;
//!
//! let parsed = Where::try_from(&serde_json::json!({
//!     "name": "Bob",
//!     "age": {"gt": 30},
//! }))
//! .unwrap();
//!
//! let built = Where::new().eq("name", "Bob").gt("age", 30);
//! assert_eq!(parsed, built);
//! ```

use crate::error::{QueryError, Result};
use crate::value::{ToValue, Value};

/// A comparison operator of an operator map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operator {
    /// `gt`
    Gt,
    /// `gte`
    Gte,
    /// `lt`
    Lt,
    /// `lte`
    Lte,
    /// `eq`
    Eq,
    /// `neq` / `ne`
    Neq,
    /// `between`
    Between,
    /// `in` / `inq`
    In,
    /// `nin`
    NotIn,
    /// `like`
    Like,
    /// `nlike`
    NotLike,
    /// `regex`
    Regex,
    /// Any other key. Only raw comparison operators such as `<>` or
    /// `GLOB` compile.
    Other(String),
}

impl Operator {
    /// Parses an operator map key.
    #[must_use]
    pub fn parse(key: &str) -> Self {
        match key {
            "gt" => Self::Gt,
            "gte" => Self::Gte,
            "lt" => Self::Lt,
            "lte" => Self::Lte,
            "eq" => Self::Eq,
            "neq" | "ne" => Self::Neq,
            "between" => Self::Between,
            "in" | "inq" => Self::In,
            "nin" => Self::NotIn,
            "like" => Self::Like,
            "nlike" => Self::NotLike,
            "regex" => Self::Regex,
            other => Self::Other(other.to_string()),
        }
    }

    /// Returns the SQL token of the operator.
    #[must_use]
    pub fn as_sql(&self) -> &str {
        match self {
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Eq => "=",
            Self::Neq => "!=",
            Self::Between => "BETWEEN",
            Self::In => "IN",
            Self::NotIn => "NOT IN",
            Self::Like => "LIKE",
            Self::NotLike => "NOT LIKE",
            Self::Regex => "REGEXP",
            Self::Other(text) => text,
        }
    }
}

/// The value side of an operator.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A single value.
    Value(Value),
    /// A sequence of values (`between`, `in`, `nin`).
    List(Vec<Value>),
}

/// What a single field is matched against.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `field IS NULL`
    Null,
    /// `field = value`
    Scalar(Value),
    /// `field REGEXP pattern`
    Regex(String),
    /// One clause per operator, combined with AND.
    Operators(Vec<(Operator, Operand)>),
}

/// A condition tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Where {
    fields: Vec<(String, Condition)>,
    or: Vec<Where>,
}

impl Where {
    /// Creates an empty tree.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            fields: Vec::new(),
            or: Vec::new(),
        }
    }

    /// Returns `true` if the tree holds no condition at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.or.iter().all(Self::is_empty)
    }

    /// The plain (AND-combined) field conditions, in insertion order.
    #[must_use]
    pub fn fields(&self) -> &[(String, Condition)] {
        &self.fields
    }

    /// The `or` branches.
    #[must_use]
    pub fn or_branches(&self) -> &[Self] {
        &self.or
    }

    /// Sets the condition of `field`, replacing any previous one in place.
    #[must_use]
    pub fn condition(mut self, field: &str, condition: Condition) -> Self {
        self.set(field, condition);
        self
    }

    fn set(&mut self, field: &str, condition: Condition) {
        match self.fields.iter_mut().find(|(f, _)| f == field) {
            Some(slot) => slot.1 = condition,
            None => self.fields.push((field.to_string(), condition)),
        }
    }

    /// Adds an operator to `field`. Operators on the same field accumulate.
    #[must_use]
    pub fn op(mut self, field: &str, operator: Operator, operand: Operand) -> Self {
        match self.fields.iter_mut().find(|(f, _)| f == field) {
            Some((_, Condition::Operators(ops))) => ops.push((operator, operand)),
            Some(slot) => slot.1 = Condition::Operators(vec![(operator, operand)]),
            None => self
                .fields
                .push((field.to_string(), Condition::Operators(vec![(operator, operand)]))),
        }
        self
    }

    /// `field = value`
    #[must_use]
    pub fn eq<V: ToValue>(self, field: &str, value: V) -> Self {
        match value.to_value() {
            Value::Null => self.condition(field, Condition::Null),
            value => self.condition(field, Condition::Scalar(value)),
        }
    }

    /// `field IS NULL`
    #[must_use]
    pub fn is_null(self, field: &str) -> Self {
        self.condition(field, Condition::Null)
    }

    /// `field REGEXP pattern`
    #[must_use]
    pub fn regex(self, field: &str, pattern: &str) -> Self {
        self.condition(field, Condition::Regex(pattern.to_string()))
    }

    /// `field > value`
    #[must_use]
    pub fn gt<V: ToValue>(self, field: &str, value: V) -> Self {
        self.op(field, Operator::Gt, Operand::Value(value.to_value()))
    }

    /// `field >= value`
    #[must_use]
    pub fn gte<V: ToValue>(self, field: &str, value: V) -> Self {
        self.op(field, Operator::Gte, Operand::Value(value.to_value()))
    }

    /// `field < value`
    #[must_use]
    pub fn lt<V: ToValue>(self, field: &str, value: V) -> Self {
        self.op(field, Operator::Lt, Operand::Value(value.to_value()))
    }

    /// `field <= value`
    #[must_use]
    pub fn lte<V: ToValue>(self, field: &str, value: V) -> Self {
        self.op(field, Operator::Lte, Operand::Value(value.to_value()))
    }

    /// `field != value`
    #[must_use]
    pub fn neq<V: ToValue>(self, field: &str, value: V) -> Self {
        self.op(field, Operator::Neq, Operand::Value(value.to_value()))
    }

    /// `field LIKE pattern`
    #[must_use]
    pub fn like(self, field: &str, pattern: &str) -> Self {
        self.op(field, Operator::Like, Operand::Value(pattern.to_value()))
    }

    /// `field NOT LIKE pattern`
    #[must_use]
    pub fn not_like(self, field: &str, pattern: &str) -> Self {
        self.op(field, Operator::NotLike, Operand::Value(pattern.to_value()))
    }

    /// `field BETWEEN low AND high`
    #[must_use]
    pub fn between<V: ToValue>(self, field: &str, low: V, high: V) -> Self {
        self.op(
            field,
            Operator::Between,
            Operand::List(vec![low.to_value(), high.to_value()]),
        )
    }

    /// `field IN (values)`
    #[must_use]
    pub fn in_list<V: ToValue, I: IntoIterator<Item = V>>(self, field: &str, values: I) -> Self {
        let values = values.into_iter().map(ToValue::to_value).collect();
        self.op(field, Operator::In, Operand::List(values))
    }

    /// `field NOT IN (values)`
    #[must_use]
    pub fn not_in<V: ToValue, I: IntoIterator<Item = V>>(self, field: &str, values: I) -> Self {
        let values = values.into_iter().map(ToValue::to_value).collect();
        self.op(field, Operator::NotIn, Operand::List(values))
    }

    /// Appends an `or` branch.
    #[must_use]
    pub fn or(mut self, branch: Self) -> Self {
        self.or.push(branch);
        self
    }
}

fn regex_literal(text: &str) -> Option<&str> {
    let rest = text.strip_prefix('/')?;
    let end = rest.rfind('/')?;
    Some(&rest[..end])
}

fn operand_from_json(json: &serde_json::Value) -> Operand {
    match json {
        serde_json::Value::Array(items) => Operand::List(items.iter().map(Value::from).collect()),
        other => Operand::Value(Value::from(other)),
    }
}

impl TryFrom<&serde_json::Value> for Condition {
    type Error = QueryError;

    fn try_from(json: &serde_json::Value) -> Result<Self> {
        match json {
            serde_json::Value::Null => Ok(Self::Null),
            serde_json::Value::String(s) => Ok(regex_literal(s).map_or_else(
                || Self::Scalar(Value::Text(s.clone())),
                |pattern| Self::Regex(pattern.to_string()),
            )),
            serde_json::Value::Object(map) => Ok(Self::Operators(
                map.iter()
                    .map(|(key, value)| (Operator::parse(key), operand_from_json(value)))
                    .collect(),
            )),
            serde_json::Value::Array(_) => Err(QueryError::InvalidCondition(format!(
                "an array is not a condition, use {{\"in\": {json}}}"
            ))),
            scalar => Ok(Self::Scalar(Value::from(scalar))),
        }
    }
}

impl TryFrom<&serde_json::Value> for Where {
    type Error = QueryError;

    fn try_from(json: &serde_json::Value) -> Result<Self> {
        let map = match json {
            serde_json::Value::Null => return Ok(Self::new()),
            serde_json::Value::Object(map) => map,
            other => {
                return Err(QueryError::InvalidCondition(format!(
                    "expected a condition object, got {other}"
                )))
            }
        };
        let mut tree = Self::new();
        for (key, value) in map {
            if key == "or" {
                let serde_json::Value::Array(branches) = value else {
                    return Err(QueryError::InvalidCondition(String::from(
                        "`or` must be an array of condition objects",
                    )));
                };
                for branch in branches {
                    tree.or.push(Self::try_from(branch)?);
                }
            } else {
                tree.set(key, Condition::try_from(value)?);
            }
        }
        Ok(tree)
    }
}

//! WHERE clause compilation.

use serde::{Deserialize, Serialize};

use super::condition::{Condition, Operand, Operator, Where};
use crate::dialect::SqlDialect;
use crate::error::{QueryError, Result};
use crate::marshal::{descriptor, to_literal};
use crate::schema::{ModelSchema, PropertyDescriptor, PropertyType};
use crate::value::Value;

/// How the `or` branches of a tree are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrMode {
    /// Each branch is one AND group; branches are OR-ed together.
    #[default]
    Grouped,
    /// Every clause of every branch is OR-ed individually. This is how the
    /// first adapters behaved: `{or: [{a: 1, b: 2}, {c: 3}]}` becomes
    /// `a = 1 OR b = 2 OR c = 3`.
    Flattened,
}

struct Predicate {
    sql: String,
    compound: bool,
}

impl Predicate {
    fn grouped(self) -> String {
        if self.compound {
            format!("({})", self.sql)
        } else {
            self.sql
        }
    }
}

/// Compiles condition trees of one model into WHERE clauses.
#[derive(Debug, Clone, Copy)]
pub struct WhereCompiler<'a, D: ?Sized> {
    dialect: &'a D,
    model: &'a ModelSchema,
    or_mode: OrMode,
}

impl<'a, D: SqlDialect + ?Sized> WhereCompiler<'a, D> {
    /// Creates a compiler in [`OrMode::Grouped`].
    #[must_use]
    pub const fn new(dialect: &'a D, model: &'a ModelSchema) -> Self {
        Self {
            dialect,
            model,
            or_mode: OrMode::Grouped,
        }
    }

    /// Selects how `or` branches are combined.
    #[must_use]
    pub const fn or_mode(mut self, or_mode: OrMode) -> Self {
        self.or_mode = or_mode;
        self
    }

    /// Compiles a tree to `WHERE ...`, or to an empty string when the tree
    /// holds no condition.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidCondition`] for malformed operator values.
    pub fn compile(&self, tree: &Where) -> Result<String> {
        Ok(self
            .predicate(tree)?
            .map_or_else(String::new, |p| format!("WHERE {}", p.sql)))
    }

    fn predicate(&self, tree: &Where) -> Result<Option<Predicate>> {
        let or = self.or_clauses(tree)?;
        let plain = self.field_clauses(tree)?;
        Ok(match (or.is_empty(), plain.is_empty()) {
            (true, true) => None,
            (false, true) => Some(Predicate {
                compound: or.len() > 1,
                sql: or.join(" OR "),
            }),
            (true, false) => Some(Predicate {
                compound: plain.len() > 1,
                sql: plain.join(" AND "),
            }),
            (false, false) => Some(Predicate {
                compound: true,
                sql: format!("({}) AND ({})", or.join(" OR "), plain.join(" AND ")),
            }),
        })
    }

    fn or_clauses(&self, tree: &Where) -> Result<Vec<String>> {
        let mut out = Vec::new();
        for branch in tree.or_branches() {
            match self.or_mode {
                OrMode::Grouped => {
                    if let Some(p) = self.predicate(branch)? {
                        out.push(p.grouped());
                    }
                }
                OrMode::Flattened => {
                    out.extend(self.field_clauses(branch)?);
                    out.extend(self.or_clauses(branch)?);
                }
            }
        }
        Ok(out)
    }

    fn field_clauses(&self, tree: &Where) -> Result<Vec<String>> {
        let mut out = Vec::new();
        for (field, condition) in tree.fields() {
            let column = self.dialect.escape_field(field);
            let declared = descriptor(self.model, field);
            match condition {
                Condition::Null => out.push(format!("{column} IS NULL")),
                Condition::Scalar(value) => out.push(format!(
                    "{column} = {}",
                    to_literal(self.dialect, declared, value)
                )),
                Condition::Regex(pattern) => out.push(self.regex_clause(&column, pattern)?),
                Condition::Operators(ops) => {
                    for (operator, operand) in ops {
                        out.push(self.operator_clause(&column, declared, operator, operand)?);
                    }
                }
            }
        }
        Ok(out)
    }

    fn regex_clause(&self, column: &str, pattern: &str) -> Result<String> {
        regex::Regex::new(pattern).map_err(|e| {
            QueryError::InvalidCondition(format!("invalid regular expression `{pattern}`: {e}"))
        })?;
        Ok(format!("{column} REGEXP {}", self.dialect.quote_string(pattern)))
    }

    fn literal_list(&self, declared: Option<&PropertyDescriptor>, values: &[Value]) -> String {
        values
            .iter()
            .map(|v| to_literal(self.dialect, declared, v))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn operator_clause(
        &self,
        column: &str,
        declared: Option<&PropertyDescriptor>,
        operator: &Operator,
        operand: &Operand,
    ) -> Result<String> {
        match (operator, operand) {
            (Operator::In | Operator::NotIn, operand) => {
                let values = match operand {
                    Operand::List(values) => values.as_slice(),
                    Operand::Value(value) => std::slice::from_ref(value),
                };
                if values.is_empty() {
                    // Constant predicates: nothing is in an empty set.
                    return Ok(String::from(if *operator == Operator::In {
                        "0"
                    } else {
                        "1"
                    }));
                }
                Ok(format!(
                    "{column} {} ({})",
                    operator.as_sql(),
                    self.literal_list(declared, values)
                ))
            }
            (Operator::Between, Operand::List(values)) if values.len() == 2 => {
                let low = to_literal(self.dialect, declared, &values[0]);
                let high = to_literal(self.dialect, declared, &values[1]);
                if declared.is_some_and(|d| d.kind == PropertyType::Date) {
                    let function = self.dialect.date_function();
                    Ok(format!(
                        "{column} BETWEEN {function}({low}) AND {function}({high})"
                    ))
                } else {
                    Ok(format!("{column} BETWEEN {low} AND {high}"))
                }
            }
            (Operator::Between, _) => Err(QueryError::InvalidCondition(format!(
                "between on {column} needs exactly two values"
            ))),
            (Operator::Regex, Operand::Value(Value::Text(pattern))) => {
                let pattern = pattern
                    .strip_prefix('/')
                    .and_then(|rest| rest.rfind('/').map(|end| &rest[..end]))
                    .unwrap_or(pattern);
                self.regex_clause(column, pattern)
            }
            (Operator::Regex, _) => Err(QueryError::InvalidCondition(format!(
                "regex on {column} needs a pattern string"
            ))),
            (_, Operand::List(_)) => Err(QueryError::InvalidCondition(format!(
                "{} on {column} takes a single value",
                operator.as_sql()
            ))),
            (Operator::Other(text), Operand::Value(value)) => {
                let token = comparison_token(text).ok_or_else(|| {
                    QueryError::InvalidCondition(format!("unsupported operator `{text}`"))
                })?;
                Ok(format!(
                    "{column} {token} {}",
                    to_literal(self.dialect, declared, value)
                ))
            }
            (operator, Operand::Value(value)) => Ok(format!(
                "{column} {} {}",
                operator.as_sql(),
                to_literal(self.dialect, declared, value)
            )),
        }
    }
}

/// Raw comparison operators accepted as operator keys, matched
/// case-insensitively with whitespace collapsed.
const COMPARISON_TOKENS: &[&str] = &[
    "=", "==", "<>", "!=", "<", ">", "<=", ">=", "IS", "IS NOT", "LIKE", "NOT LIKE", "GLOB",
    "NOT GLOB", "REGEXP", "NOT REGEXP",
];

fn comparison_token(text: &str) -> Option<&'static str> {
    let normalized = text
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_uppercase();
    COMPARISON_TOKENS
        .iter()
        .copied()
        .find(|token| *token == normalized)
}

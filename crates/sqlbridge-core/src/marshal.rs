//! Conversion between application values, SQL literals and stored values.
//!
//! Writing goes through [`to_storage`] (bound parameters) or [`to_literal`]
//! (values inlined into WHERE/SET clauses). Reading goes through
//! [`from_storage`]. Dates are written as `YYYY-MM-DD HH:MM:SS` text in UTC;
//! integer millisecond timestamps written by older versions are still read.
//!
//! Values that do not fit their declared type are passed through as text
//! rather than rejected.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::dialect::SqlDialect;
use crate::schema::{ModelSchema, PropertyDescriptor, PropertyType};
use crate::value::{Record, SqlValue, StoredRow, Value};

/// On-disk date format.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

static ID_DESCRIPTOR: PropertyDescriptor = PropertyDescriptor::number();

/// Returns the declaration of `field`, treating an undeclared `id` as a
/// Number.
#[must_use]
pub fn descriptor<'a>(model: &'a ModelSchema, field: &str) -> Option<&'a PropertyDescriptor> {
    match model.get(field) {
        Some(d) => Some(d),
        None if field == "id" => Some(&ID_DESCRIPTOR),
        None => None,
    }
}

/// Formats a date in the on-disk representation.
#[must_use]
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parses the date representations accepted on input: RFC 3339, the on-disk
/// format (with or without fractional seconds, `T` or space separated) and a
/// bare `YYYY-MM-DD`.
#[must_use]
pub fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(d) = DateTime::parse_from_rfc3339(text) {
        return Some(d.with_timezone(&Utc));
    }
    for format in [
        DATE_FORMAT,
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
    ] {
        if let Ok(d) = NaiveDateTime::parse_from_str(text, format) {
            return Some(d.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|d| d.and_utc())
}

fn coerce_date(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Date(d) => Some(*d),
        Value::Text(s) => parse_date(s),
        Value::Int(ms) => DateTime::from_timestamp_millis(*ms),
        _ => None,
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Int(n) => *n != 0,
        Value::Float(f) => *f != 0.0,
        Value::Text(s) => !(s.is_empty() || s == "0" || s.eq_ignore_ascii_case("false")),
        Value::Date(_) | Value::Json(_) | Value::Blob(_) => true,
    }
}

fn parse_number(text: &str) -> Option<SqlValue> {
    let text = text.trim();
    if let Ok(n) = text.parse::<i64>() {
        return Some(SqlValue::Int(n));
    }
    text.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(SqlValue::Float)
}

fn plain(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Int(i64::from(*b)),
        Value::Int(n) => SqlValue::Int(*n),
        Value::Float(f) => SqlValue::Float(*f),
        Value::Text(s) => SqlValue::Text(s.clone()),
        Value::Date(d) => SqlValue::Text(format_date(d)),
        Value::Json(v) => SqlValue::Text(v.to_string()),
        Value::Blob(b) => SqlValue::Blob(b.clone()),
    }
}

fn text_of(value: &Value) -> String {
    match value {
        Value::Text(s) => s.clone(),
        Value::Int(n) => n.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Date(d) => format_date(d),
        Value::Json(v) => v.to_string(),
        Value::Blob(b) => String::from_utf8_lossy(b).into_owned(),
        Value::Null => String::new(),
    }
}

/// Converts a value to its stored representation under a declaration.
#[must_use]
pub fn to_storage(descriptor: Option<&PropertyDescriptor>, value: &Value) -> SqlValue {
    if value.is_null() {
        return SqlValue::Null;
    }
    let Some(descriptor) = descriptor else {
        return plain(value);
    };
    match descriptor.kind {
        PropertyType::Number => match value {
            Value::Text(s) => parse_number(s).unwrap_or_else(|| SqlValue::Text(s.clone())),
            other => plain(other),
        },
        PropertyType::Boolean => SqlValue::Int(i64::from(truthy(value))),
        PropertyType::Date => match (coerce_date(value), value) {
            (Some(d), _) => SqlValue::Text(format_date(&d)),
            (None, Value::Text(s)) if s.trim().is_empty() => SqlValue::Null,
            (None, other) => SqlValue::Text(text_of(other)),
        },
        PropertyType::Json => match value {
            Value::Text(s) => SqlValue::Text(s.clone()),
            other => SqlValue::Text(other.to_json().to_string()),
        },
        PropertyType::String | PropertyType::Text => match value {
            Value::Blob(b) => SqlValue::Blob(b.clone()),
            other => SqlValue::Text(text_of(other)),
        },
    }
}

/// Renders a stored value as an SQL literal.
#[must_use]
pub fn render<D: SqlDialect + ?Sized>(dialect: &D, value: &SqlValue) -> String {
    match value {
        SqlValue::Null => String::from("NULL"),
        SqlValue::Int(n) => n.to_string(),
        SqlValue::Float(f) if f.is_finite() => f.to_string(),
        SqlValue::Float(_) => String::from("NULL"),
        SqlValue::Text(s) => dialect.quote_string(s),
        SqlValue::Blob(b) => {
            let hex: String = b.iter().map(|byte| format!("{byte:02X}")).collect();
            format!("X'{hex}'")
        }
    }
}

/// Converts a value to an SQL literal to be inlined into a statement.
///
/// Without a declaration the value is emitted verbatim: text is not quoted,
/// which lets callers pass raw fragments for undeclared fields.
#[must_use]
pub fn to_literal<D: SqlDialect + ?Sized>(
    dialect: &D,
    descriptor: Option<&PropertyDescriptor>,
    value: &Value,
) -> String {
    match (descriptor, value) {
        (_, Value::Null) => String::from("NULL"),
        (None, Value::Text(raw)) => raw.clone(),
        (descriptor, value) => render(dialect, &to_storage(descriptor, value)),
    }
}

/// Converts a stored value back to an application value.
#[must_use]
pub fn from_storage(descriptor: Option<&PropertyDescriptor>, stored: SqlValue) -> Value {
    let kind = descriptor.map(|d| d.kind);
    match (kind, stored) {
        (_, SqlValue::Null) => Value::Null,
        (Some(PropertyType::Date), SqlValue::Text(s)) => {
            parse_date(&s).map_or(Value::Text(s), Value::Date)
        }
        (Some(PropertyType::Date), SqlValue::Int(ms)) => {
            DateTime::from_timestamp_millis(ms).map_or(Value::Int(ms), Value::Date)
        }
        (Some(PropertyType::Boolean), SqlValue::Int(n)) => Value::Bool(n != 0),
        (Some(PropertyType::Boolean), SqlValue::Text(s)) => match s.as_str() {
            "1" | "true" => Value::Bool(true),
            "0" | "false" => Value::Bool(false),
            _ => Value::Text(s),
        },
        (Some(PropertyType::Json), SqlValue::Text(s)) => match serde_json::from_str(&s) {
            Ok(json) => Value::Json(json),
            Err(_) => Value::Text(s),
        },
        (_, SqlValue::Int(n)) => Value::Int(n),
        (_, SqlValue::Float(f)) => Value::Float(f),
        (_, SqlValue::Text(s)) => Value::Text(s),
        (_, SqlValue::Blob(b)) => Value::Blob(b),
    }
}

/// Converts a raw row of `model` into a record.
#[must_use]
pub fn from_storage_row(model: &ModelSchema, row: StoredRow) -> Record {
    row.into_iter()
        .map(|(column, stored)| {
            let value = from_storage(descriptor(model, &column), stored);
            (column, value)
        })
        .collect()
}

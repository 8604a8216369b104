//! Model definitions and introspected table metadata.
//!
//! A [`ModelSchema`] is what the ORM layer registers with the adapter: a
//! named entity with an ordered list of properties. [`ColumnMetadata`] and
//! [`IndexMetadata`] are what the live database reports back during
//! schema reconciliation.

use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

/// Declared type of a model property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyType {
    /// Short string, stored as `VARCHAR`.
    #[serde(alias = "Varchar", alias = "string", alias = "varchar")]
    String,
    /// Long text, stored as `TEXT`.
    #[serde(alias = "text")]
    Text,
    /// Structured document, serialized to `TEXT`.
    #[serde(rename = "JSON", alias = "Json", alias = "json")]
    Json,
    /// Numeric value, stored as `INT`.
    #[serde(alias = "number")]
    Number,
    /// Point in time, stored as `DATETIME`.
    #[serde(alias = "date")]
    Date,
    /// Flag, stored as `TINYINT(1)`.
    #[serde(alias = "boolean")]
    Boolean,
}

impl PropertyType {
    /// Returns the canonical type name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::String => "String",
            Self::Text => "Text",
            Self::Json => "JSON",
            Self::Number => "Number",
            Self::Date => "Date",
            Self::Boolean => "Boolean",
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

const fn default_allow_null() -> bool {
    true
}

/// Declaration of one model property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDescriptor {
    /// Declared type.
    #[serde(rename = "type")]
    pub kind: PropertyType,
    /// Length (VARCHAR) or display width (INT).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    /// Whether the column accepts NULL.
    #[serde(default = "default_allow_null", alias = "null")]
    pub allow_null: bool,
    /// Whether the column carries a unique index.
    #[serde(default)]
    pub unique: bool,
    /// Whether the column carries an index.
    #[serde(default)]
    pub index: bool,
}

impl PropertyDescriptor {
    /// Creates a nullable, unindexed property of the given type.
    #[must_use]
    pub const fn new(kind: PropertyType) -> Self {
        Self {
            kind,
            limit: None,
            allow_null: true,
            unique: false,
            index: false,
        }
    }

    /// Shorthand for a `String` property.
    #[must_use]
    pub const fn string() -> Self {
        Self::new(PropertyType::String)
    }

    /// Shorthand for a `Text` property.
    #[must_use]
    pub const fn text() -> Self {
        Self::new(PropertyType::Text)
    }

    /// Shorthand for a `JSON` property.
    #[must_use]
    pub const fn json() -> Self {
        Self::new(PropertyType::Json)
    }

    /// Shorthand for a `Number` property.
    #[must_use]
    pub const fn number() -> Self {
        Self::new(PropertyType::Number)
    }

    /// Shorthand for a `Date` property.
    #[must_use]
    pub const fn date() -> Self {
        Self::new(PropertyType::Date)
    }

    /// Shorthand for a `Boolean` property.
    #[must_use]
    pub const fn boolean() -> Self {
        Self::new(PropertyType::Boolean)
    }

    /// Sets the length limit.
    #[must_use]
    pub const fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Marks the property as NOT NULL.
    #[must_use]
    pub const fn not_null(mut self) -> Self {
        self.allow_null = false;
        self
    }

    /// Adds a (non-unique) index.
    #[must_use]
    pub const fn indexed(mut self) -> Self {
        self.index = true;
        self
    }

    /// Adds a unique index.
    #[must_use]
    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Returns `true` if the property needs an index of any kind.
    #[must_use]
    pub const fn wants_index(&self) -> bool {
        self.index || self.unique
    }
}

/// A registered model: a name, an optional table override and the ordered
/// property declarations.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ModelSchema {
    /// Model name, also used as the index name prefix.
    pub name: String,
    /// Table name, when it differs from the model name.
    #[serde(default)]
    pub table: Option<String>,
    #[serde(default, deserialize_with = "deserialize_properties")]
    properties: Vec<(String, PropertyDescriptor)>,
}

impl ModelSchema {
    /// Creates a model with no properties.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: None,
            properties: Vec::new(),
        }
    }

    /// Overrides the table name.
    #[must_use]
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Builder form of [`ModelSchema::define_property`].
    #[must_use]
    pub fn property(mut self, name: &str, descriptor: PropertyDescriptor) -> Self {
        self.define_property(name, descriptor);
        self
    }

    /// Declares or re-declares a property. A re-declared property keeps its
    /// position.
    pub fn define_property(&mut self, name: &str, descriptor: PropertyDescriptor) {
        match self.properties.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = descriptor,
            None => self.properties.push((name.to_string(), descriptor)),
        }
    }

    /// Returns the table this model is stored in.
    #[must_use]
    pub fn table_name(&self) -> &str {
        self.table.as_deref().unwrap_or(&self.name)
    }

    /// Returns the declaration of `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, d)| d)
    }

    /// Iterates over declared properties in declaration order.
    pub fn properties(&self) -> impl Iterator<Item = (&str, &PropertyDescriptor)> {
        self.properties.iter().map(|(n, d)| (n.as_str(), d))
    }

    /// Iterates over declared properties other than `id`.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &PropertyDescriptor)> {
        self.properties().filter(|(n, _)| *n != "id")
    }

    /// Returns the deterministic index name for a property.
    #[must_use]
    pub fn index_name(&self, property: &str) -> String {
        format!("{}_{property}", self.name)
    }
}

fn deserialize_properties<'de, D>(
    deserializer: D,
) -> Result<Vec<(String, PropertyDescriptor)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct PropertiesVisitor;

    impl<'de> Visitor<'de> for PropertiesVisitor {
        type Value = Vec<(String, PropertyDescriptor)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of property name to property descriptor")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut out: Vec<(String, PropertyDescriptor)> = Vec::new();
            while let Some((name, descriptor)) = map.next_entry::<String, PropertyDescriptor>()? {
                if out.iter().any(|(n, _)| *n == name) {
                    return Err(de::Error::custom(format!("duplicate property `{name}`")));
                }
                out.push((name, descriptor));
            }
            Ok(out)
        }
    }

    deserializer.deserialize_map(PropertiesVisitor)
}

/// A column as reported by the live database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMetadata {
    /// Column name.
    pub name: String,
    /// Declared SQL type, as stored by the engine.
    pub sql_type: String,
    /// Whether the column accepts NULL.
    pub nullable: bool,
    /// Whether the column is (part of) the primary key.
    pub primary_key: bool,
}

impl ColumnMetadata {
    /// Creates column metadata.
    #[must_use]
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>, nullable: bool) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            nullable,
            primary_key: false,
        }
    }

    /// Marks the column as primary key.
    #[must_use]
    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }
}

/// An index as reported by the live database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexMetadata {
    /// Index name.
    pub name: String,
    /// Whether the index is unique.
    pub unique: bool,
}

impl IndexMetadata {
    /// Creates index metadata.
    #[must_use]
    pub fn new(name: impl Into<String>, unique: bool) -> Self {
        Self {
            name: name.into(),
            unique,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_define_property_keeps_position() {
        let mut model = ModelSchema::new("User")
            .property("name", PropertyDescriptor::string())
            .property("age", PropertyDescriptor::number());
        model.define_property("name", PropertyDescriptor::text());
        model.define_property("email", PropertyDescriptor::string());

        let names: Vec<&str> = model.properties().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["name", "age", "email"]);
        assert_eq!(model.get("name").map(|d| d.kind), Some(PropertyType::Text));
    }

    #[test]
    fn test_table_name_and_index_name() {
        let model = ModelSchema::new("User");
        assert_eq!(model.table_name(), "User");
        assert_eq!(model.index_name("age"), "User_age");

        let model = model.table("users");
        assert_eq!(model.table_name(), "users");
        assert_eq!(model.index_name("age"), "User_age");
    }

    #[test]
    fn test_deserialize_model_preserves_property_order() {
        let json = r#"{
            "name": "Post",
            "table": "posts",
            "properties": {
                "title": {"type": "String", "limit": 100, "allowNull": false},
                "body": {"type": "Text"},
                "published": {"type": "Boolean", "index": true},
                "meta": {"type": "JSON"},
                "created": {"type": "Date", "unique": true},
                "rank": {"type": "Varchar"}
            }
        }"#;
        let model: ModelSchema = serde_json::from_str(json).unwrap();
        assert_eq!(model.table_name(), "posts");

        let names: Vec<&str> = model.properties().map(|(n, _)| n).collect();
        assert_eq!(
            names,
            vec!["title", "body", "published", "meta", "created", "rank"]
        );

        let title = model.get("title").unwrap();
        assert_eq!(title.limit, Some(100));
        assert!(!title.allow_null);
        assert!(model.get("body").unwrap().allow_null);
        assert!(model.get("published").unwrap().wants_index());
        assert!(model.get("created").unwrap().unique);
        assert_eq!(model.get("meta").unwrap().kind, PropertyType::Json);
        assert_eq!(model.get("rank").unwrap().kind, PropertyType::String);
    }

    #[test]
    fn test_deserialize_rejects_duplicate_property() {
        let json = r#"{"name": "A", "properties": {"x": {"type": "Number"}, "x": {"type": "Text"}}}"#;
        assert!(serde_json::from_str::<ModelSchema>(json).is_err());
    }

    #[test]
    fn test_columns_skip_id() {
        let model = ModelSchema::new("A")
            .property("id", PropertyDescriptor::number())
            .property("x", PropertyDescriptor::number());
        let names: Vec<&str> = model.columns().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["x"]);
    }
}

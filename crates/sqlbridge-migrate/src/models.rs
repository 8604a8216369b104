//! Loading model definitions from a JSON file.

use std::path::Path;

use sqlbridge_core::ModelSchema;

use crate::error::{ModelFileError, Result};

/// Parses a JSON array of model definitions.
///
/// # Errors
///
/// Returns [`ModelFileError::Parse`] if the text is not a list of models
/// and [`ModelFileError::DuplicateModel`] if two models share a name.
pub fn parse_models(path: &Path, text: &str) -> Result<Vec<ModelSchema>> {
    let models: Vec<ModelSchema> =
        serde_json::from_str(text).map_err(|source| ModelFileError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    for (i, model) in models.iter().enumerate() {
        if models[..i].iter().any(|m| m.name == model.name) {
            return Err(ModelFileError::DuplicateModel(model.name.clone()));
        }
    }
    Ok(models)
}

/// Reads and parses the model file at `path`.
///
/// # Errors
///
/// Returns [`ModelFileError::Io`] if the file cannot be read, or any error
/// of [`parse_models`].
pub fn load_models(path: &Path) -> Result<Vec<ModelSchema>> {
    let text = std::fs::read_to_string(path).map_err(|source| ModelFileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_models(path, &text)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use sqlbridge_core::{PropertyDescriptor, PropertyType};

    use super::*;

    const MODELS: &str = r#"[
        {
            "name": "User",
            "table": "users",
            "properties": {
                "name": {"type": "String", "limit": 100, "allowNull": false},
                "age": {"type": "Number", "index": true},
                "bio": {"type": "Text"}
            }
        },
        {"name": "Tag", "properties": {"label": {"type": "String", "unique": true}}}
    ]"#;

    #[test]
    fn test_load_models_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MODELS.as_bytes()).unwrap();

        let models = load_models(file.path()).unwrap();
        assert_eq!(models.len(), 2);

        let user = &models[0];
        assert_eq!(user.table_name(), "users");
        let names: Vec<&str> = user.properties().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["name", "age", "bio"]);
        assert_eq!(
            user.get("name"),
            Some(&PropertyDescriptor::string().limit(100).not_null())
        );
        assert!(user.get("age").unwrap().index);
        assert_eq!(user.get("bio").unwrap().kind, PropertyType::Text);

        assert_eq!(models[1].table_name(), "Tag");
        assert!(models[1].get("label").unwrap().unique);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_models(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ModelFileError::Io { .. }));
    }

    #[test]
    fn test_invalid_json() {
        let err = parse_models(Path::new("models.json"), r#"{"name": "User"}"#).unwrap_err();
        assert!(matches!(err, ModelFileError::Parse { .. }));
        assert!(err.to_string().starts_with("Failed to parse model file 'models.json'"));
    }

    #[test]
    fn test_duplicate_model() {
        let text = r#"[{"name": "User"}, {"name": "User"}]"#;
        let err = parse_models(Path::new("models.json"), text).unwrap_err();
        assert!(matches!(err, ModelFileError::DuplicateModel(name) if name == "User"));
    }
}

//! Serialization of the generated document to YAML or JSON.

use anyhow::{Context, Result};
use log::debug;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Serializes the document to YAML.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn serialize_yaml(doc: &Value) -> Result<String> {
    debug!("Serializing document to YAML");
    serde_yaml::to_string(doc).context("Failed to serialize document to YAML")
}

/// Serializes the document to pretty-printed JSON, suitable for human
/// review and version control.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn serialize_json(doc: &Value) -> Result<String> {
    debug!("Serializing document to JSON");
    serde_json::to_string_pretty(doc).context("Failed to serialize document to JSON")
}

/// Writes string content to a file, creating parent directories and
/// overwriting any previous content.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written to.
pub fn write_to_file(content: &str, path: &Path) -> Result<()> {
    debug!("Writing content to file: {}", path.display());

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    fs::write(path, content)
        .with_context(|| format!("Failed to write to file: {}", path.display()))?;

    debug!("Successfully wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apiitem::ApiItem;
    use crate::openapi_builder::{build_document, DocumentInfo};
    use serde_json::json;
    use tempfile::TempDir;

    fn test_document() -> Value {
        let info = DocumentInfo {
            title: "Test API".to_string(),
            version: "1.0.0".to_string(),
            description: "A test API".to_string(),
        };
        let item = ApiItem {
            title: Some("list".to_string()),
            method: Some("get".to_string()),
            url: Some("/pets".to_string()),
            ..ApiItem::default()
        };
        build_document(&info, &[item])
    }

    #[test]
    fn test_serialize_yaml() {
        let yaml = serialize_yaml(&test_document()).unwrap();
        assert!(yaml.contains("swagger: '2.0'"));
        assert!(yaml.contains("title: Test API"));
        assert!(yaml.contains("/pets:"));
        assert!(yaml.contains("get:"));
    }

    #[test]
    fn test_serialize_json_is_pretty_and_parseable() {
        let json_text = serialize_json(&test_document()).unwrap();
        assert!(json_text.contains('\n'));
        assert!(json_text.contains("  "));

        let parsed: Value = serde_json::from_str(&json_text).unwrap();
        assert_eq!(parsed["swagger"], json!("2.0"));
        assert!(parsed["paths"]["/pets"]["get"].is_object());
    }

    #[test]
    fn test_write_to_file_creates_directories() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("nested").join("openapi.yaml");

        write_to_file("content", &file_path).unwrap();
        assert_eq!(fs::read_to_string(&file_path).unwrap(), "content");
    }

    #[test]
    fn test_write_to_file_overwrites_existing() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("openapi.json");

        write_to_file("initial", &file_path).unwrap();
        write_to_file("replaced", &file_path).unwrap();
        assert_eq!(fs::read_to_string(&file_path).unwrap(), "replaced");
    }
}

pub mod components;
pub mod media_type;
pub mod operation;
pub mod parameter;
pub mod ref_resolve;
pub mod request_body;
pub mod response;
pub mod schema;
pub mod spec;

use serde::Deserialize;
use serde_json::Value;

use crate::error::ParseError;
use spec::OpenApiDocument;

/// Decode YAML text into the generic document tree, keeping key order.
pub fn decode_yaml(input: &str) -> Result<Value, ParseError> {
    Ok(serde_yaml_ng::from_str(input)?)
}

/// Decode JSON text into the generic document tree, keeping key order.
pub fn decode_json(input: &str) -> Result<Value, ParseError> {
    Ok(serde_json::from_str(input)?)
}

/// Read the typed top-level view of a decoded root document.
pub fn read_document(root: &Value) -> Result<OpenApiDocument, ParseError> {
    let document = OpenApiDocument::deserialize(root)?;
    validate_version(&document)?;
    Ok(document)
}

fn validate_version(document: &OpenApiDocument) -> Result<(), ParseError> {
    match (&document.swagger, &document.openapi) {
        (Some(version), _) if version.starts_with("2.") => Ok(()),
        (None, Some(version)) if version.starts_with("3.") => Ok(()),
        (Some(version), _) | (None, Some(version)) => {
            Err(ParseError::UnsupportedVersion(version.clone()))
        }
        (None, None) => Err(ParseError::MissingField("swagger or openapi".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_swagger2() {
        let root = decode_yaml(
            r#"
swagger: "2.0"
info:
  title: Petstore
  version: "1.0"
basePath: /v1
paths: {}
definitions:
  Pet:
    type: object
  Owner:
    type: object
"#,
        )
        .unwrap();
        let document = read_document(&root).unwrap();
        assert!(document.is_swagger2());
        assert_eq!(document.base_path.as_deref(), Some("/v1"));
        assert_eq!(document.schema_names(), vec!["Pet", "Owner"]);
        assert_eq!(document.definitions_pointer(), "/definitions");
    }

    #[test]
    fn test_read_openapi3() {
        let root = decode_json(
            r#"{
  "openapi": "3.0.1",
  "info": { "title": "Petstore", "version": "1.0" },
  "components": { "schemas": { "Zebra": { "type": "object" }, "Ant": { "type": "object" } } }
}"#,
        )
        .unwrap();
        let document = read_document(&root).unwrap();
        assert!(!document.is_swagger2());
        assert_eq!(document.schema_names(), vec!["Zebra", "Ant"]);
    }

    #[test]
    fn test_invalid_version() {
        let root = decode_yaml("openapi: \"4.0.0\"\ninfo:\n  title: Test\n").unwrap();
        assert!(matches!(
            read_document(&root),
            Err(ParseError::UnsupportedVersion(v)) if v == "4.0.0"
        ));

        let root = decode_yaml("info:\n  title: Test\n").unwrap();
        assert!(matches!(read_document(&root), Err(ParseError::MissingField(_))));
    }
}

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::components::Components;

/// Info object describing the API.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Info {
    #[serde(default)]
    pub title: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub version: String,
}

/// Top-level view of a Swagger 2 or OpenAPI 3 document. Path items stay as
/// raw nodes so a malformed operation only affects that operation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OpenApiDocument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub swagger: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub openapi: Option<String>,

    #[serde(default)]
    pub info: Info,

    #[serde(rename = "basePath", skip_serializing_if = "Option::is_none")]
    pub base_path: Option<String>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub paths: IndexMap<String, serde_json::Value>,

    /// Swagger 2 schema definitions.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub definitions: IndexMap<String, serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<Components>,

    /// Protobuf package to use instead of one derived from the title.
    #[serde(rename = "x-proto-package", skip_serializing_if = "Option::is_none")]
    pub proto_package: Option<String>,

    /// File-level protobuf options, e.g. `go_package`.
    #[serde(
        rename = "x-global-options",
        default,
        skip_serializing_if = "IndexMap::is_empty"
    )]
    pub global_options: IndexMap<String, serde_json::Value>,
}

impl OpenApiDocument {
    pub fn is_swagger2(&self) -> bool {
        self.swagger.is_some()
    }

    /// Pointer prefix of the named schema section for this document version.
    pub fn definitions_pointer(&self) -> &'static str {
        if self.is_swagger2() {
            "/definitions"
        } else {
            "/components/schemas"
        }
    }

    /// Named schemas in declaration order.
    pub fn schema_names(&self) -> Vec<&str> {
        if self.is_swagger2() {
            self.definitions.keys().map(String::as_str).collect()
        } else {
            self.components
                .as_ref()
                .map(|c| c.schemas.keys().map(String::as_str).collect())
                .unwrap_or_default()
        }
    }
}

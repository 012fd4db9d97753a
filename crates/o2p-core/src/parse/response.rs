use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::media_type::{MediaType, preferred};
use super::schema::SchemaOrRef;

/// A response definition. Swagger 2 puts the body schema directly under
/// `schema`, OpenAPI 3 under `content`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub description: String,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub content: IndexMap<String, MediaType>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaOrRef>,
}

impl Response {
    pub fn body_schema(&self) -> Option<&SchemaOrRef> {
        self.schema
            .as_ref()
            .or_else(|| preferred(&self.content).and_then(|media_type| media_type.schema.as_ref()))
    }
}

/// A reference or inline response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseOrRef {
    Ref {
        #[serde(rename = "$ref")]
        ref_path: String,
    },
    Response(Response),
}

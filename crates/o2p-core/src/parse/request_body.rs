use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::media_type::{MediaType, preferred};
use super::schema::SchemaOrRef;

/// A request body definition (OpenAPI 3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub content: IndexMap<String, MediaType>,

    #[serde(default)]
    pub required: bool,
}

impl RequestBody {
    pub fn body_schema(&self) -> Option<&SchemaOrRef> {
        preferred(&self.content).and_then(|media_type| media_type.schema.as_ref())
    }
}

/// A reference or inline request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestBodyOrRef {
    Ref {
        #[serde(rename = "$ref")]
        ref_path: String,
    },
    RequestBody(RequestBody),
}

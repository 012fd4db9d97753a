use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::schema::SchemaOrRef;

/// A media type object.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MediaType {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaOrRef>,
}

/// Prefer `application/json`, fall back to the first declared content type.
pub fn preferred(content: &IndexMap<String, MediaType>) -> Option<&MediaType> {
    content
        .get("application/json")
        .or_else(|| content.first().map(|(_, media_type)| media_type))
}

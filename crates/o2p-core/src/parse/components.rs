use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Components object holding reusable definitions (OpenAPI 3). Only the
/// schema names matter here; bodies are read from the document tree.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Components {
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub schemas: IndexMap<String, serde_json::Value>,
}

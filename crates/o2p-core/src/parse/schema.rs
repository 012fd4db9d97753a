use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A JSON Schema type keyword value. `file` is the Swagger 2 upload type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
    Null,
    File,
}

/// The `type` field can be a single type or an array of types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeSet {
    Single(SchemaType),
    Multiple(Vec<SchemaType>),
}

/// A reference or inline schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaOrRef {
    Ref {
        #[serde(rename = "$ref")]
        ref_path: String,
    },
    Schema(Box<Schema>),
}

/// A JSON Schema object, covering the Swagger 2 and OpenAPI 3 keywords the
/// compiler understands. Unknown keywords are ignored.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Schema {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<TypeSet>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,

    // Object properties
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, SchemaOrRef>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,

    #[serde(
        rename = "additionalProperties",
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_properties: Option<AdditionalProperties>,

    // Array items
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaOrRef>>,

    // Composition
    #[serde(rename = "allOf", default, skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<SchemaOrRef>,

    #[serde(rename = "oneOf", default, skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<SchemaOrRef>,

    #[serde(rename = "anyOf", default, skip_serializing_if = "Vec::is_empty")]
    pub any_of: Vec<SchemaOrRef>,

    // Enum values
    #[serde(rename = "enum", default, skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<serde_json::Value>,

    /// Pins the protobuf field number of this property.
    #[serde(rename = "x-proto-tag", skip_serializing_if = "Option::is_none")]
    pub proto_tag: Option<u32>,
}

impl Schema {
    /// The single non-null type, or `None` when absent. `Err` carries the
    /// offending list when several non-null types are given.
    pub fn effective_type(&self) -> Result<Option<SchemaType>, Vec<SchemaType>> {
        match &self.schema_type {
            None => Ok(None),
            Some(TypeSet::Single(t)) => Ok(Some(*t)),
            Some(TypeSet::Multiple(types)) => {
                let non_null: Vec<SchemaType> = types
                    .iter()
                    .copied()
                    .filter(|t| *t != SchemaType::Null)
                    .collect();
                match non_null.as_slice() {
                    [] => Ok(Some(SchemaType::Null)),
                    [single] => Ok(Some(*single)),
                    _ => Err(non_null),
                }
            }
        }
    }

    /// True when the schema carries object structure (properties or allOf).
    pub fn has_structure(&self) -> bool {
        !self.properties.is_empty() || !self.all_of.is_empty()
    }
}

/// `additionalProperties` can be a boolean or a schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Bool(bool),
    Schema(Box<SchemaOrRef>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_effective_type() {
        let nullable: Schema = serde_json::from_value(json!({ "type": ["string", "null"] })).unwrap();
        assert_eq!(nullable.effective_type(), Ok(Some(SchemaType::String)));

        let mixed: Schema = serde_json::from_value(json!({ "type": ["string", "integer"] })).unwrap();
        assert!(mixed.effective_type().is_err());

        let untyped = Schema::default();
        assert_eq!(untyped.effective_type(), Ok(None));
    }

    #[test]
    fn test_ref_or_inline() {
        let reference: SchemaOrRef =
            serde_json::from_value(json!({ "$ref": "#/definitions/Pet" })).unwrap();
        assert!(matches!(reference, SchemaOrRef::Ref { ref_path } if ref_path == "#/definitions/Pet"));

        let inline: SchemaOrRef = serde_json::from_value(json!({
            "type": "object",
            "properties": { "id": { "type": "integer", "x-proto-tag": 7 } },
            "additionalProperties": false
        }))
        .unwrap();
        let SchemaOrRef::Schema(schema) = inline else {
            panic!("expected inline schema");
        };
        assert_eq!(
            schema.additional_properties,
            Some(AdditionalProperties::Bool(false))
        );
        match &schema.properties["id"] {
            SchemaOrRef::Schema(id) => assert_eq!(id.proto_tag, Some(7)),
            _ => panic!("expected inline property"),
        }
    }
}

use serde::{Deserialize, Serialize};

use super::schema::{Schema, SchemaOrRef};

/// Parameter location. `body` and `formData` only exist in Swagger 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParameterLocation {
    Query,
    Header,
    Path,
    Cookie,
    Body,
    FormData,
}

/// An API parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,

    #[serde(rename = "in")]
    pub location: ParameterLocation,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub required: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaOrRef>,

    /// Swagger 2 non-body parameters carry `type`/`format`/`items`/`enum` inline.
    #[serde(flatten)]
    pub inline: Schema,
}

impl Parameter {
    /// The parameter's value schema, wherever the document version put it.
    pub fn value_schema(&self) -> Option<SchemaOrRef> {
        if let Some(schema) = &self.schema {
            return Some(schema.clone());
        }
        let inline = &self.inline;
        let has_shape = inline.schema_type.is_some()
            || inline.items.is_some()
            || !inline.enum_values.is_empty();
        has_shape.then(|| SchemaOrRef::Schema(Box::new(inline.clone())))
    }
}

/// A reference or inline parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterOrRef {
    Ref {
        #[serde(rename = "$ref")]
        ref_path: String,
    },
    Parameter(Box<Parameter>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::schema::{SchemaType, TypeSet};
    use serde_json::json;

    #[test]
    fn test_swagger2_inline_schema() {
        let param: Parameter = serde_json::from_value(json!({
            "name": "limit",
            "in": "query",
            "description": "page size",
            "type": "integer",
            "format": "int32"
        }))
        .unwrap();
        assert_eq!(param.location, ParameterLocation::Query);
        assert_eq!(param.description.as_deref(), Some("page size"));
        let Some(SchemaOrRef::Schema(schema)) = param.value_schema() else {
            panic!("expected inline schema");
        };
        assert_eq!(schema.schema_type, Some(TypeSet::Single(SchemaType::Integer)));
        assert_eq!(schema.format.as_deref(), Some("int32"));
    }

    #[test]
    fn test_openapi3_schema() {
        let param: Parameter = serde_json::from_value(json!({
            "name": "id",
            "in": "path",
            "required": true,
            "schema": { "type": "string" }
        }))
        .unwrap();
        assert!(param.required);
        assert!(matches!(param.value_schema(), Some(SchemaOrRef::Schema(_))));
    }

    #[test]
    fn test_form_data_location() {
        let param: Parameter = serde_json::from_value(json!({
            "name": "file",
            "in": "formData",
            "type": "file"
        }))
        .unwrap();
        assert_eq!(param.location, ParameterLocation::FormData);
    }
}

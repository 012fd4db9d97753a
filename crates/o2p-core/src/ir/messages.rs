use std::collections::HashSet;

/// Protobuf scalar value types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scalar {
    Double,
    Float,
    Int32,
    Int64,
    Uint32,
    Uint64,
    Bool,
    String,
    Bytes,
}

impl Scalar {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scalar::Double => "double",
            Scalar::Float => "float",
            Scalar::Int32 => "int32",
            Scalar::Int64 => "int64",
            Scalar::Uint32 => "uint32",
            Scalar::Uint64 => "uint64",
            Scalar::Bool => "bool",
            Scalar::String => "string",
            Scalar::Bytes => "bytes",
        }
    }

    /// The `google.protobuf` wrapper that boxes this scalar.
    pub fn wrapper(&self) -> WellKnown {
        match self {
            Scalar::Double => WellKnown::DoubleValue,
            Scalar::Float => WellKnown::FloatValue,
            Scalar::Int32 => WellKnown::Int32Value,
            Scalar::Int64 => WellKnown::Int64Value,
            Scalar::Uint32 => WellKnown::UInt32Value,
            Scalar::Uint64 => WellKnown::UInt64Value,
            Scalar::Bool => WellKnown::BoolValue,
            Scalar::String => WellKnown::StringValue,
            Scalar::Bytes => WellKnown::BytesValue,
        }
    }
}

/// Well-known message types from `google/protobuf`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WellKnown {
    DoubleValue,
    FloatValue,
    Int32Value,
    Int64Value,
    UInt32Value,
    UInt64Value,
    BoolValue,
    StringValue,
    BytesValue,
    Any,
}

impl WellKnown {
    pub fn type_name(&self) -> &'static str {
        match self {
            WellKnown::DoubleValue => "google.protobuf.DoubleValue",
            WellKnown::FloatValue => "google.protobuf.FloatValue",
            WellKnown::Int32Value => "google.protobuf.Int32Value",
            WellKnown::Int64Value => "google.protobuf.Int64Value",
            WellKnown::UInt32Value => "google.protobuf.UInt32Value",
            WellKnown::UInt64Value => "google.protobuf.UInt64Value",
            WellKnown::BoolValue => "google.protobuf.BoolValue",
            WellKnown::StringValue => "google.protobuf.StringValue",
            WellKnown::BytesValue => "google.protobuf.BytesValue",
            WellKnown::Any => "google.protobuf.Any",
        }
    }

    pub fn import(&self) -> &'static str {
        match self {
            WellKnown::Any => "google/protobuf/any.proto",
            _ => "google/protobuf/wrappers.proto",
        }
    }
}

/// The value type of a field. Named types are referenced by name only;
/// `Nested` names a child of the message that owns the field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Scalar(Scalar),
    WellKnown(WellKnown),
    Ref(String),
    Nested(String),
    /// `map<string, V>`.
    Map(Box<FieldType>),
}

impl FieldType {
    pub fn type_name(&self) -> String {
        match self {
            FieldType::Scalar(s) => s.as_str().to_string(),
            FieldType::WellKnown(w) => w.type_name().to_string(),
            FieldType::Ref(name) | FieldType::Nested(name) => name.clone(),
            FieldType::Map(value) => format!("map<string, {}>", value.type_name()),
        }
    }

    /// The top-level type this field depends on, if any.
    pub fn top_level_ref(&self) -> Option<&str> {
        match self {
            FieldType::Ref(name) => Some(name),
            FieldType::Map(value) => value.top_level_ref(),
            _ => None,
        }
    }

    pub fn well_known(&self) -> Option<WellKnown> {
        match self {
            FieldType::WellKnown(w) => Some(*w),
            FieldType::Map(value) => value.well_known(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldLabel {
    #[default]
    Singular,
    Repeated,
}

/// A message field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub original_name: String,
    pub field_type: FieldType,
    pub label: FieldLabel,
    /// Assigned by the field-number allocator; 0 until then.
    pub number: u32,
    pub explicit_number: Option<u32>,
    pub required: bool,
    pub deprecated: bool,
    pub description: Option<String>,
}

impl Field {
    pub fn new(name: impl Into<String>, original_name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            original_name: original_name.into(),
            field_type,
            label: FieldLabel::Singular,
            number: 0,
            explicit_number: None,
            required: false,
            deprecated: false,
            description: None,
        }
    }

    pub fn repeated(mut self) -> Self {
        self.label = FieldLabel::Repeated;
        self
    }

    pub fn is_repeated(&self) -> bool {
        self.label == FieldLabel::Repeated
    }
}

/// A message with its child scope.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Message {
    pub name: String,
    pub description: Option<String>,
    pub fields: Vec<Field>,
    pub messages: Vec<Message>,
    pub enums: Vec<Enum>,
    /// Numbers of fields that existed in a previous run and are gone now.
    pub reserved: Vec<u32>,
    /// Where the message came from, for diagnostics.
    pub source: String,
}

impl Message {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn nested(&self, name: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.name == name)
    }

    /// The first top-level type in `names` referenced by this message or any
    /// message nested in it.
    pub fn references_any(&self, names: &HashSet<String>) -> Option<String> {
        for field in &self.fields {
            if let Some(name) = field.field_type.top_level_ref()
                && names.contains(name)
            {
                return Some(name.to_string());
            }
        }
        self.messages.iter().find_map(|m| m.references_any(names))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    pub label: String,
    pub number: u32,
}

/// An enum. The first value is always the zero sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Enum {
    pub name: String,
    pub description: Option<String>,
    pub values: Vec<EnumValue>,
}

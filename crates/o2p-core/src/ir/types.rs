use std::collections::BTreeSet;

use super::messages::{Enum, Message};
use super::services::Service;
use crate::transform::field_numbers::FieldNumberMap;

/// Import added whenever an RPC carries an HTTP binding.
pub const ANNOTATIONS_IMPORT: &str = "google/api/annotations.proto";

/// A file-level `option name = value;`. `value` is already proto syntax.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOption {
    pub name: String,
    pub value: String,
}

/// Root of the intermediate representation: one `.proto` file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProtoFile {
    pub package: String,
    pub imports: Vec<String>,
    pub options: Vec<FileOption>,
    pub enums: Vec<Enum>,
    pub messages: Vec<Message>,
    pub services: Vec<Service>,
}

impl ProtoFile {
    pub fn message(&self, name: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.name == name)
    }

    pub fn enum_type(&self, name: &str) -> Option<&Enum> {
        self.enums.iter().find(|e| e.name == name)
    }

    pub fn service(&self, name: &str) -> Option<&Service> {
        self.services.iter().find(|s| s.name == name)
    }

    /// The numbers currently assigned, keyed by dotted message path. Feed
    /// this back into the next compilation to keep numbering stable.
    pub fn field_numbers(&self) -> FieldNumberMap {
        let mut map = FieldNumberMap::default();
        for message in &self.messages {
            record_numbers(message, &message.name, &mut map);
        }
        map
    }

    /// Sorted, unique imports required by the types and bindings in this file.
    pub fn collect_imports(&self) -> Vec<String> {
        let mut imports = BTreeSet::new();
        for message in &self.messages {
            message_imports(message, &mut imports);
        }
        let annotated = self
            .services
            .iter()
            .flat_map(|s| &s.rpcs)
            .any(|rpc| rpc.http.is_some());
        if annotated {
            imports.insert(ANNOTATIONS_IMPORT);
        }
        imports.into_iter().map(str::to_string).collect()
    }
}

fn record_numbers(message: &Message, path: &str, map: &mut FieldNumberMap) {
    for field in &message.fields {
        map.insert(path, &field.name, field.number);
    }
    for nested in &message.messages {
        record_numbers(nested, &format!("{path}.{}", nested.name), map);
    }
}

fn message_imports(message: &Message, imports: &mut BTreeSet<&'static str>) {
    for field in &message.fields {
        if let Some(known) = field.field_type.well_known() {
            imports.insert(known.import());
        }
    }
    for nested in &message.messages {
        message_imports(nested, imports);
    }
}

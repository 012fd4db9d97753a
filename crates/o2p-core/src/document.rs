//! The schema graph: decoded documents addressed by URI and JSON pointer.

use std::fmt;

use indexmap::{IndexMap, IndexSet};
use serde_json::Value;
use url::Url;

use crate::error::ParseError;

/// Identity of a node: the absolute URI of its document plus a JSON pointer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalRef {
    pub document: String,
    pub pointer: String,
}

impl CanonicalRef {
    pub fn new(document: impl Into<String>, pointer: impl Into<String>) -> Self {
        Self {
            document: document.into(),
            pointer: pointer.into(),
        }
    }

    /// The node `segment` below this one.
    pub fn child(&self, segment: &str) -> Self {
        let escaped = segment.replace('~', "~0").replace('/', "~1");
        Self {
            document: self.document.clone(),
            pointer: format!("{}/{}", self.pointer, escaped),
        }
    }

    /// The name a type defined at this location would naturally carry: the
    /// last pointer segment, or the file stem for a whole document.
    pub fn type_hint(&self) -> String {
        if let Some(last) = self.pointer.rsplit('/').next().filter(|s| !s.is_empty()) {
            return last.replace("~1", "/").replace("~0", "~");
        }
        let path = self.document.split(['?', '#']).next().unwrap_or_default();
        let file = path.rsplit('/').next().unwrap_or_default();
        let stem = file.split('.').next().unwrap_or_default();
        if stem.is_empty() {
            "Document".to_string()
        } else {
            stem.to_string()
        }
    }
}

impl fmt::Display for CanonicalRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.document, self.pointer)
    }
}

/// Every document taking part in one compilation, keyed by absolute URI.
/// The first document inserted is the root OpenAPI document.
#[derive(Debug, Clone)]
pub struct DocumentSet {
    root: String,
    documents: IndexMap<String, Value>,
}

impl DocumentSet {
    pub fn new(root_uri: &str, root: Value) -> Result<Self, ParseError> {
        let uri = normalize_document_uri(root_uri)?;
        let mut documents = IndexMap::new();
        documents.insert(uri.clone(), root);
        Ok(Self {
            root: uri,
            documents,
        })
    }

    /// Add an auxiliary document (sibling file or fetched remote schema).
    pub fn insert(&mut self, uri: &str, document: Value) -> Result<(), ParseError> {
        let uri = normalize_document_uri(uri)?;
        self.documents.insert(uri, document);
        Ok(())
    }

    pub fn root_uri(&self) -> &str {
        &self.root
    }

    pub fn root(&self) -> &Value {
        &self.documents[0]
    }

    pub fn get(&self, uri: &str) -> Option<&Value> {
        self.documents.get(uri)
    }

    pub fn contains(&self, uri: &str) -> bool {
        self.documents.contains_key(uri)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn uris(&self) -> impl Iterator<Item = &str> {
        self.documents.keys().map(String::as_str)
    }

    /// Documents referenced by loaded documents but not loaded yet, in order
    /// of first appearance. The loader calls this until it returns nothing.
    pub fn missing_documents(&self) -> Vec<String> {
        let mut missing = IndexSet::new();
        for (uri, document) in &self.documents {
            let mut refs = Vec::new();
            collect_refs(document, &mut refs);
            for reference in refs {
                match locate(uri, reference) {
                    Ok(target) if !self.contains(&target.document) => {
                        missing.insert(target.document);
                    }
                    Ok(_) => {}
                    Err(reason) => log::debug!("ignoring malformed $ref {reference}: {reason}"),
                }
            }
        }
        missing.into_iter().collect()
    }
}

/// Split a `$ref` into an absolute document URI and a JSON pointer, resolving
/// relative document parts against `base`.
pub fn locate(base: &str, reference: &str) -> Result<CanonicalRef, String> {
    let (document_part, fragment) = match reference.split_once('#') {
        Some((document, fragment)) => (document, fragment),
        None => (reference, ""),
    };
    if !fragment.is_empty() && !fragment.starts_with('/') {
        return Err(format!("unsupported fragment `#{fragment}`, expected a JSON pointer"));
    }
    let document = if document_part.is_empty() {
        base.to_string()
    } else {
        let base_url = Url::parse(base).map_err(|e| format!("invalid base URI {base}: {e}"))?;
        let mut joined = base_url
            .join(document_part)
            .map_err(|e| format!("cannot join {document_part} onto {base}: {e}"))?;
        joined.set_fragment(None);
        joined.to_string()
    };
    Ok(CanonicalRef::new(document, fragment))
}

fn normalize_document_uri(uri: &str) -> Result<String, ParseError> {
    let mut url = Url::parse(uri).map_err(|e| ParseError::InvalidUri {
        uri: uri.to_string(),
        reason: e.to_string(),
    })?;
    url.set_fragment(None);
    Ok(url.to_string())
}

fn collect_refs<'a>(value: &'a Value, out: &mut Vec<&'a str>) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(reference)) = map.get("$ref") {
                out.push(reference);
            }
            for child in map.values() {
                collect_refs(child, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_refs(item, out);
            }
        }
        _ => {}
    }
}

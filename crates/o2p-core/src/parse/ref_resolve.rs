use indexmap::IndexSet;
use serde_json::Value;

use crate::document::{CanonicalRef, DocumentSet, locate};
use crate::error::ReferenceError;

/// A reference target after every `$ref` hop has been followed.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<'a> {
    pub id: CanonicalRef,
    pub node: &'a Value,
}

/// Dereferences `$ref` pointers across every document of a [`DocumentSet`].
///
/// Chains (`A -> B -> C`) are followed transitively; a chain that comes back
/// to itself has no concrete target and is an error. Separately, the resolver
/// keeps the set of targets whose definition is being expanded right now, so
/// callers can tell a recursive type from a fresh one.
pub struct RefResolver<'a> {
    documents: &'a DocumentSet,
    resolving: IndexSet<CanonicalRef>,
}

impl<'a> RefResolver<'a> {
    pub fn new(documents: &'a DocumentSet) -> Self {
        Self {
            documents,
            resolving: IndexSet::new(),
        }
    }

    pub fn documents(&self) -> &'a DocumentSet {
        self.documents
    }

    /// Resolve a `$ref` string found in document `base`.
    pub fn resolve(&self, base: &str, reference: &str) -> Result<Resolved<'a>, ReferenceError> {
        let target = locate(base, reference)
            .map_err(|reason| ReferenceError::new(reference, base, reason))?;
        self.follow(target, reference, base)
    }

    /// Resolve a node identity, following it if the node itself is a `$ref`.
    pub fn resolve_id(&self, id: &CanonicalRef) -> Result<Resolved<'a>, ReferenceError> {
        self.follow(id.clone(), &id.to_string(), &id.document)
    }

    fn follow(
        &self,
        mut id: CanonicalRef,
        reference: &str,
        origin: &str,
    ) -> Result<Resolved<'a>, ReferenceError> {
        let mut chain = IndexSet::new();
        loop {
            if !chain.insert(id.clone()) {
                return Err(ReferenceError::new(
                    reference,
                    origin,
                    format!("reference cycle through {id} has no concrete schema"),
                ));
            }
            let node = self.lookup(&id, reference, origin)?;
            match node.get("$ref") {
                Some(Value::String(next)) => {
                    log::debug!("following {id} -> {next}");
                    id = locate(&id.document, next)
                        .map_err(|reason| ReferenceError::new(next.as_str(), &id.document, reason))?;
                }
                Some(_) => {
                    return Err(ReferenceError::new(
                        reference,
                        origin,
                        format!("$ref at {id} is not a string"),
                    ));
                }
                None => return Ok(Resolved { id, node }),
            }
        }
    }

    fn lookup(
        &self,
        id: &CanonicalRef,
        reference: &str,
        origin: &str,
    ) -> Result<&'a Value, ReferenceError> {
        let document = self.documents.get(&id.document).ok_or_else(|| {
            ReferenceError::new(
                reference,
                origin,
                format!("document {} is not loaded", id.document),
            )
        })?;
        document.pointer(&id.pointer).ok_or_else(|| {
            ReferenceError::new(
                reference,
                origin,
                format!("no node at {} in {}", id.pointer, id.document),
            )
        })
    }

    /// Mark `id` as being expanded. Returns `false` when it already is.
    pub fn enter(&mut self, id: &CanonicalRef) -> bool {
        self.resolving.insert(id.clone())
    }

    pub fn leave(&mut self, id: &CanonicalRef) {
        self.resolving.shift_remove(id);
    }

    pub fn is_resolving(&self, id: &CanonicalRef) -> bool {
        self.resolving.contains(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ROOT: &str = "file:///api/openapi.yaml";

    fn documents() -> DocumentSet {
        let mut documents = DocumentSet::new(
            ROOT,
            json!({
                "definitions": {
                    "Pet": { "type": "object", "properties": { "id": { "type": "integer" } } },
                    "PetAlias": { "$ref": "#/definitions/Pet" },
                    "AliasOfAlias": { "$ref": "#/definitions/PetAlias" },
                    "Remote": { "$ref": "common.yaml#/Error" },
                    "LoopA": { "$ref": "#/definitions/LoopB" },
                    "LoopB": { "$ref": "#/definitions/LoopA" }
                }
            }),
        )
        .unwrap();
        documents
            .insert(
                "file:///api/common.yaml",
                json!({ "Error": { "type": "object" } }),
            )
            .unwrap();
        documents
    }

    #[test]
    fn test_resolve_local() {
        let documents = documents();
        let resolver = RefResolver::new(&documents);
        let resolved = resolver.resolve(ROOT, "#/definitions/Pet").unwrap();
        assert_eq!(resolved.id, CanonicalRef::new(ROOT, "/definitions/Pet"));
        assert_eq!(resolved.node["type"], "object");
    }

    #[test]
    fn test_resolve_chain() {
        let documents = documents();
        let resolver = RefResolver::new(&documents);
        let resolved = resolver.resolve(ROOT, "#/definitions/AliasOfAlias").unwrap();
        assert_eq!(resolved.id, CanonicalRef::new(ROOT, "/definitions/Pet"));
    }

    #[test]
    fn test_resolve_cross_document() {
        let documents = documents();
        let resolver = RefResolver::new(&documents);
        let resolved = resolver.resolve(ROOT, "#/definitions/Remote").unwrap();
        assert_eq!(
            resolved.id,
            CanonicalRef::new("file:///api/common.yaml", "/Error")
        );
    }

    #[test]
    fn test_missing_target() {
        let documents = documents();
        let resolver = RefResolver::new(&documents);
        let err = resolver.resolve(ROOT, "#/definitions/Nope").unwrap_err();
        assert_eq!(err.pointer, "#/definitions/Nope");
        assert_eq!(err.document, ROOT);

        let err = resolver.resolve(ROOT, "other.yaml#/Pet").unwrap_err();
        assert!(err.reason.contains("not loaded"));
    }

    #[test]
    fn test_pure_reference_cycle() {
        let documents = documents();
        let resolver = RefResolver::new(&documents);
        let err = resolver.resolve(ROOT, "#/definitions/LoopA").unwrap_err();
        assert!(err.reason.contains("cycle"));
    }

    #[test]
    fn test_resolving_set() {
        let documents = documents();
        let mut resolver = RefResolver::new(&documents);
        let id = CanonicalRef::new(ROOT, "/definitions/Pet");
        assert!(resolver.enter(&id));
        assert!(resolver.is_resolving(&id));
        assert!(!resolver.enter(&id));
        resolver.leave(&id);
        assert!(!resolver.is_resolving(&id));
        assert!(resolver.enter(&id));
    }
}

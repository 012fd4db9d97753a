use std::collections::HashSet;

use indexmap::IndexSet;
use serde_json::Value;

use crate::config::CompilerOptions;
use crate::document::DocumentSet;
use crate::error::{AggregateError, CompileError, CompileIssue, TypeMappingError};
use crate::ir::{FileOption, Message, ProtoFile, Service};
use crate::parse::read_document;
use crate::parse::ref_resolve::RefResolver;
use crate::parse::spec::OpenApiDocument;

use super::field_numbers::{FieldNumberMap, allocate};
use super::name_normalizer::package_name;
use super::schema_compiler::SchemaCompiler;
use super::service_compiler::compile_services;

/// Package used when nothing else names one.
pub const DEFAULT_PACKAGE: &str = "api";

/// Result of a best-effort compilation: the file plus every collected issue.
#[derive(Debug)]
pub struct Compilation {
    pub file: ProtoFile,
    pub issues: Vec<CompileIssue>,
}

impl Compilation {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Fail if anything was left out of the file.
    pub fn into_strict(self) -> Result<ProtoFile, AggregateError> {
        if self.issues.is_empty() {
            Ok(self.file)
        } else {
            Err(AggregateError {
                issues: self.issues,
            })
        }
    }
}

/// Compile the root document of `documents` into a protobuf file.
///
/// Unresolvable references abort; unsupported schemas and operations are
/// left out and reported in [`Compilation::issues`].
pub fn compile(
    documents: &DocumentSet,
    options: &CompilerOptions,
    previous: Option<&FieldNumberMap>,
) -> Result<Compilation, CompileError> {
    let document = read_document(documents.root())?;

    // Phase 1: Register named definitions, then compile them and whatever
    // they reference.
    let mut compiler = SchemaCompiler::new(RefResolver::new(documents), options);
    compiler.register_definitions(&document)?;
    compiler.drain()?;

    // Phase 2: Services, plus any types only their operations reference.
    // Operations are walked even when services are skipped so that the
    // types they reach get the same names in both modes.
    let services_output = compile_services(&mut compiler, &document)?;
    compiler.drain()?;
    let mut services = services_output.services;
    let mut issues = services_output.issues;
    let synthesized = services_output.synthesized;

    let mut output = compiler.finish();
    if options.skip_rpcs {
        log::debug!("skipping services");
        services.clear();
        output
            .messages
            .retain(|message| !synthesized.contains(&message.name));
    } else {
        output.issues.append(&mut issues);
    }

    // Phase 3: Drop everything that depends on a type that failed
    prune(
        &mut output.messages,
        &mut services,
        &synthesized,
        &mut output.failed,
        &mut output.issues,
    );

    // Phase 4: Field numbers
    let empty = FieldNumberMap::default();
    let previous = previous.unwrap_or(&empty);
    for message in &mut output.messages {
        let path = message.name.clone();
        allocate(message, &path, previous);
    }

    let mut file = ProtoFile {
        package: resolve_package(options, &document),
        imports: Vec::new(),
        options: file_options(&document),
        enums: output.enums,
        messages: output.messages,
        services,
    };
    file.imports = file.collect_imports();

    for issue in &output.issues {
        log::warn!("{issue}");
    }
    Ok(Compilation {
        file,
        issues: output.issues,
    })
}

/// Remove messages that reference a failed type, transitively, and the RPCs
/// that use them together with their request and response messages.
fn prune(
    messages: &mut Vec<Message>,
    services: &mut Vec<Service>,
    synthesized: &HashSet<String>,
    failed: &mut IndexSet<String>,
    issues: &mut Vec<CompileIssue>,
) {
    loop {
        let missing: HashSet<String> = failed.iter().cloned().collect();
        let before = messages.len();
        messages.retain(|message| match message.references_any(&missing) {
            Some(name) => {
                issues.push(
                    TypeMappingError::new(
                        message.source.clone(),
                        format!("{} depends on {name}, which could not be compiled", message.name),
                    )
                    .into(),
                );
                failed.insert(message.name.clone());
                false
            }
            None => true,
        });
        if messages.len() == before {
            break;
        }
    }

    let mut orphaned = HashSet::new();
    for service in services.iter_mut() {
        service.rpcs.retain(|rpc| {
            let missing = [&rpc.input, &rpc.output]
                .into_iter()
                .find(|name| failed.contains(name.as_str()));
            match missing {
                Some(name) => {
                    issues.push(
                        TypeMappingError::new(
                            format!("rpc {}", rpc.name),
                            format!("depends on {name}, which could not be compiled"),
                        )
                        .into(),
                    );
                    orphaned.extend(
                        [&rpc.input, &rpc.output]
                            .into_iter()
                            .filter(|name| synthesized.contains(name.as_str()))
                            .cloned(),
                    );
                    false
                }
                None => true,
            }
        });
    }
    services.retain(|service| !service.rpcs.is_empty());
    messages.retain(|message| !orphaned.contains(&message.name));
}

fn resolve_package(options: &CompilerOptions, document: &OpenApiDocument) -> String {
    options
        .package
        .clone()
        .or_else(|| document.proto_package.clone())
        .or_else(|| package_name(&document.info.title))
        .unwrap_or_else(|| DEFAULT_PACKAGE.to_string())
}

/// `x-global-options`, sorted by name. Strings are quoted; structured values
/// cannot be expressed and are dropped.
fn file_options(document: &OpenApiDocument) -> Vec<FileOption> {
    let mut options: Vec<FileOption> = document
        .global_options
        .iter()
        .filter_map(|(name, value)| match value {
            Value::String(_) | Value::Bool(_) | Value::Number(_) => Some(FileOption {
                name: name.clone(),
                value: value.to_string(),
            }),
            _ => {
                log::warn!("ignoring file option {name}: only scalar values are supported");
                None
            }
        })
        .collect();
    options.sort_by(|a, b| a.name.cmp(&b.name));
    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::decode_yaml;

    fn compile_yaml(yaml: &str, options: &CompilerOptions) -> Compilation {
        let documents =
            DocumentSet::new("file:///api/openapi.yaml", decode_yaml(yaml).unwrap()).unwrap();
        compile(&documents, options, None).unwrap()
    }

    #[test]
    fn test_package_resolution() {
        let yaml = "swagger: \"2.0\"\ninfo:\n  title: Swagger Petstore\n  version: \"1\"\n";
        let compiled = compile_yaml(yaml, &CompilerOptions::default());
        assert_eq!(compiled.file.package, "swaggerpetstore");

        let compiled = compile_yaml(yaml, &CompilerOptions::default().with_package("pets.v1"));
        assert_eq!(compiled.file.package, "pets.v1");

        let compiled = compile_yaml(
            "swagger: \"2.0\"\ninfo:\n  title: \"!!\"\n  version: \"1\"\n",
            &CompilerOptions::default(),
        );
        assert_eq!(compiled.file.package, DEFAULT_PACKAGE);
    }

    #[test]
    fn test_global_options_sorted_and_quoted() {
        let compiled = compile_yaml(
            r#"
swagger: "2.0"
info: { title: Opts, version: "1" }
x-global-options:
  java_package: com.example.pets
  cc_enable_arenas: true
  go_package: example.com/pets
"#,
            &CompilerOptions::default(),
        );
        let options: Vec<(&str, &str)> = compiled
            .file
            .options
            .iter()
            .map(|o| (o.name.as_str(), o.value.as_str()))
            .collect();
        assert_eq!(
            options,
            vec![
                ("cc_enable_arenas", "true"),
                ("go_package", "\"example.com/pets\""),
                ("java_package", "\"com.example.pets\""),
            ]
        );
    }

    #[test]
    fn test_prune_is_transitive() {
        let compiled = compile_yaml(
            r##"
swagger: "2.0"
info: { title: Prune, version: "1" }
paths:
  /a:
    get:
      operationId: getA
      responses:
        '200':
          description: ok
          schema: { $ref: "#/definitions/A" }
definitions:
  Broken:
    oneOf: [{ type: string }, { type: integer }]
  B:
    type: object
    properties:
      broken: { $ref: "#/definitions/Broken" }
  A:
    type: object
    properties:
      b: { $ref: "#/definitions/B" }
  Fine:
    type: object
    properties:
      name: { type: string }
"##,
            &CompilerOptions::default(),
        );
        let names: Vec<&str> = compiled.file.messages.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Fine"]);
        assert!(compiled.file.services.is_empty());
        // Broken, B, A and the rpc.
        assert_eq!(compiled.issues.len(), 4);
        assert!(!compiled.is_clean());
        let err = compiled.into_strict().unwrap_err();
        assert_eq!(err.issues.len(), 4);
    }
}

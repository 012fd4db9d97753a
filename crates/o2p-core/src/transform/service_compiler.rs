use std::collections::HashSet;

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

use crate::config::ServiceGrouping;
use crate::document::{CanonicalRef, locate};
use crate::error::{CompileIssue, Fault, ReferenceError, ServiceCompilationError, TypeMappingError};
use crate::ir::{HttpMethod, HttpRule, Message, Rpc, Service};
use crate::parse::operation::Operation;
use crate::parse::parameter::{Parameter, ParameterLocation, ParameterOrRef};
use crate::parse::request_body::{RequestBody, RequestBodyOrRef};
use crate::parse::response::{Response, ResponseOrRef};
use crate::parse::schema::SchemaOrRef;
use crate::parse::spec::OpenApiDocument;

use super::name_normalizer::{NameScope, field_name, route_to_name, type_name};
use super::schema_compiler::{MessageBuilder, SchemaCompiler, Target, TypeKind};

/// Services plus the operations that had to be skipped.
#[derive(Debug, Default)]
pub struct ServiceOutput {
    pub services: Vec<Service>,
    pub issues: Vec<CompileIssue>,
    /// Request and response messages created for RPCs.
    pub synthesized: HashSet<String>,
}

struct Group {
    service: Service,
    scope: NameScope,
}

/// Compile every path operation into an RPC. Request and response messages
/// are added to `compiler` as top-level messages.
pub fn compile_services(
    compiler: &mut SchemaCompiler<'_>,
    document: &OpenApiDocument,
) -> Result<ServiceOutput, ReferenceError> {
    let mut services = ServiceCompiler {
        compiler,
        document,
        groups: IndexMap::new(),
        issues: Vec::new(),
        synthesized: HashSet::new(),
    };
    services.run()?;
    Ok(ServiceOutput {
        services: services
            .groups
            .into_values()
            .map(|group| group.service)
            .filter(|service| !service.rpcs.is_empty())
            .collect(),
        issues: services.issues,
        synthesized: services.synthesized,
    })
}

struct ServiceCompiler<'c, 'a> {
    compiler: &'c mut SchemaCompiler<'a>,
    document: &'c OpenApiDocument,
    groups: IndexMap<String, Group>,
    issues: Vec<CompileIssue>,
    synthesized: HashSet<String>,
}

impl<'c, 'a> ServiceCompiler<'c, 'a> {
    fn run(&mut self) -> Result<(), ReferenceError> {
        let root = self.compiler.resolver().documents().root_uri().to_string();
        let paths = CanonicalRef::new(root, "/paths");
        let document = self.document;

        for (path, item) in &document.paths {
            let item_location = paths.child(path);
            if !path.starts_with('/') {
                self.skip("*", path, "path must start with `/`");
                continue;
            }
            let Value::Object(item) = item else {
                self.skip("*", path, "path item is not an object");
                continue;
            };
            if item.contains_key("$ref") {
                self.skip("*", path, "path item references are not supported");
                continue;
            }

            let shared = match item.get("parameters") {
                Some(node) => match Vec::<ParameterOrRef>::deserialize(node) {
                    Ok(list) => list,
                    Err(e) => {
                        self.skip("*", path, &format!("invalid path parameters: {e}"));
                        continue;
                    }
                },
                None => Vec::new(),
            };

            for (key, node) in item {
                let Some(method) = HttpMethod::from_key(key) else {
                    continue;
                };
                let operation = match Operation::deserialize(node) {
                    Ok(operation) => operation,
                    Err(e) => {
                        self.skip(method.as_str(), path, &format!("invalid operation: {e}"));
                        continue;
                    }
                };
                if operation.deprecated && self.compiler.options().skip_deprecated_rpcs {
                    log::debug!("skipping deprecated {} {path}", method.as_str());
                    continue;
                }
                let location = item_location.child(key);
                match self.compile_operation(method, path, &operation, &shared, &item_location, &location) {
                    Ok(()) => {}
                    Err(Fault::Reference(err)) => return Err(err),
                    Err(Fault::Issue(issue)) => self.skip(method.as_str(), path, &issue.to_string()),
                }
            }
        }
        Ok(())
    }

    fn skip(&mut self, method: &str, path: &str, reason: &str) {
        self.issues.push(
            ServiceCompilationError {
                method: method.to_string(),
                path: path.to_string(),
                reason: reason.to_string(),
            }
            .into(),
        );
    }

    fn compile_operation(
        &mut self,
        method: HttpMethod,
        path: &str,
        operation: &Operation,
        shared: &[ParameterOrRef],
        item_location: &CanonicalRef,
        location: &CanonicalRef,
    ) -> Result<(), Fault> {
        let mut parameters = self.resolve_parameters(shared, &item_location.child("parameters"))?;
        for (parameter, origin) in
            self.resolve_parameters(&operation.parameters, &location.child("parameters"))?
        {
            let existing = parameters.iter_mut().find(|(p, _)| {
                p.name == parameter.name && p.location == parameter.location
            });
            match existing {
                Some(slot) => *slot = (parameter, origin),
                None => parameters.push((parameter, origin)),
            }
        }

        let group = self.group_for(operation)?;
        let raw_name = match &operation.operation_id {
            Some(id) => type_name(id),
            None => route_to_name(method.as_str(), path),
        };
        let rpc_name = self.groups[&group].scope.claim(&raw_name)?;

        let request_name = self.compiler.claim_type(&format!("{rpc_name}Request"))?;
        let mut request = MessageBuilder::new(&request_name, None, location);
        let mut renames = Vec::new();
        let mut body = None;

        for (parameter, origin) in &parameters {
            let schema_location = if parameter.schema.is_some() {
                origin.child("schema")
            } else {
                origin.clone()
            };
            match parameter.location {
                ParameterLocation::Header | ParameterLocation::Cookie => {
                    log::debug!("{rpc_name}: {} is transport metadata", parameter.name);
                    continue;
                }
                ParameterLocation::Body => {
                    let schema = parameter.schema.as_ref().ok_or_else(|| {
                        TypeMappingError::new(origin.to_string(), "body parameter without schema")
                    })?;
                    let name = request.scope.claim(&field_name(&parameter.name))?;
                    let mut field = self.compiler.compile_field(
                        &mut request,
                        &name,
                        &parameter.name,
                        schema,
                        &schema_location,
                        parameter.required,
                    )?;
                    field.description = parameter.description.clone().or(field.description);
                    request.message.fields.push(field);
                    body = Some(name);
                }
                ParameterLocation::Path | ParameterLocation::Query | ParameterLocation::FormData => {
                    let schema = parameter.value_schema().ok_or_else(|| {
                        TypeMappingError::new(
                            origin.to_string(),
                            format!("parameter {} has no type", parameter.name),
                        )
                    })?;
                    let is_path = parameter.location == ParameterLocation::Path;
                    let name = request.scope.claim(&field_name(&parameter.name))?;
                    let mut field = self.compiler.compile_field(
                        &mut request,
                        &name,
                        &parameter.name,
                        &schema,
                        &schema_location,
                        parameter.required || is_path,
                    )?;
                    field.description = parameter.description.clone().or(field.description);
                    field.deprecated = parameter.deprecated.unwrap_or(field.deprecated);
                    request.message.fields.push(field);
                    if is_path {
                        renames.push((parameter.name.clone(), name));
                    }
                }
            }
        }

        if let Some(request_body) = &operation.request_body {
            let (request_body, origin) =
                self.resolve_request_body(request_body, &location.child("requestBody"))?;
            if let Some(schema) = request_body.body_schema() {
                let raw = match schema {
                    SchemaOrRef::Ref { ref_path } => locate(&origin.document, ref_path)
                        .map(|target| target.type_hint())
                        .unwrap_or_else(|_| "body".to_string()),
                    SchemaOrRef::Schema(_) => "body".to_string(),
                };
                let name = request.scope.claim(&field_name(&raw))?;
                let mut field = self.compiler.compile_field(
                    &mut request,
                    &name,
                    &raw,
                    schema,
                    &origin,
                    request_body.required,
                )?;
                field.description = request_body.description.clone().or(field.description);
                request.message.fields.push(field);
                body = Some(name);
            }
        }

        let output = self.compile_response(&rpc_name, operation, location)?;

        let http = if self.compiler.options().annotate {
            Some(HttpRule {
                method,
                path: self.http_path(path, &renames),
                body,
            })
        } else {
            None
        };

        self.synthesized.insert(request_name.clone());
        self.compiler.push_message(request.finish());
        if let Some(response) = output.message {
            self.synthesized.insert(response.name.clone());
            self.compiler.push_message(response);
        }

        let rpc = Rpc {
            name: rpc_name,
            input: request_name,
            output: output.name,
            http,
            deprecated: operation.deprecated,
            description: operation
                .summary
                .clone()
                .or_else(|| operation.description.clone()),
        };
        log::debug!("{} {path} -> rpc {}", method.as_str(), rpc.name);
        if let Some(group) = self.groups.get_mut(&group) {
            group.service.rpcs.push(rpc);
        }
        Ok(())
    }

    /// The message an RPC returns: a referenced message directly, anything
    /// else wrapped in a synthesized `<Rpc>Response`.
    fn compile_response(
        &mut self,
        rpc_name: &str,
        operation: &Operation,
        location: &CanonicalRef,
    ) -> Result<ResponseMessage, Fault> {
        let responses = location.child("responses");
        let resolved = match operation.success_response() {
            Some((status, response)) => {
                Some(self.resolve_response(response, &responses.child(status))?)
            }
            None => None,
        };
        let body = resolved
            .as_ref()
            .and_then(|(response, origin)| response.body_schema().map(|schema| (schema, origin)));

        if let Some((SchemaOrRef::Ref { ref_path }, origin)) = body
            && let Target::Named(name, TypeKind::Message) =
                self.compiler.reference(&origin.document, ref_path)?
        {
            return Ok(ResponseMessage {
                name,
                message: None,
            });
        }

        let name = self.compiler.claim_type(&format!("{rpc_name}Response"))?;
        let mut builder = MessageBuilder::new(&name, None, location);
        if let Some((schema, origin)) = body {
            self.compiler.fill_value_from(&mut builder, schema, origin)?;
        }
        Ok(ResponseMessage {
            name,
            message: Some(builder.finish()),
        })
    }

    fn group_for(&mut self, operation: &Operation) -> Result<String, Fault> {
        let tag = match self.compiler.options().service_grouping {
            ServiceGrouping::Tag => operation.tags.first().cloned(),
            ServiceGrouping::Document => None,
        };
        let key = tag.clone().unwrap_or_default();
        if !self.groups.contains_key(&key) {
            let base = match &tag {
                Some(tag) => format!("{tag} Service"),
                None if self.document.info.title.trim().is_empty() => "Api Service".to_string(),
                None => format!("{} Service", self.document.info.title),
            };
            let name = self.compiler.claim_type(&type_name(&base))?;
            log::debug!("service {name}");
            self.groups.insert(
                key.clone(),
                Group {
                    scope: NameScope::new(&name),
                    service: Service {
                        name,
                        rpcs: Vec::new(),
                    },
                },
            );
        }
        Ok(key)
    }

    fn http_path(&self, path: &str, renames: &[(String, String)]) -> String {
        let base = if self.document.is_swagger2() {
            self.document.base_path.as_deref().unwrap_or_default()
        } else {
            ""
        };
        let mut template = format!("{}{path}", base.trim_end_matches('/'));
        for (original, field) in renames {
            template = template.replace(&format!("{{{original}}}"), &format!("{{{field}}}"));
        }
        template
    }

    fn resolve_parameters(
        &self,
        list: &[ParameterOrRef],
        location: &CanonicalRef,
    ) -> Result<Vec<(Parameter, CanonicalRef)>, Fault> {
        let mut parameters = Vec::with_capacity(list.len());
        for (index, parameter) in list.iter().enumerate() {
            match parameter {
                ParameterOrRef::Ref { ref_path } => {
                    let resolved = self.compiler.resolver().resolve(&location.document, ref_path)?;
                    let parameter = Parameter::deserialize(resolved.node).map_err(|e| {
                        TypeMappingError::new(resolved.id.to_string(), e.to_string())
                    })?;
                    parameters.push((parameter, resolved.id));
                }
                ParameterOrRef::Parameter(parameter) => {
                    parameters.push(((**parameter).clone(), location.child(&index.to_string())));
                }
            }
        }
        Ok(parameters)
    }

    fn resolve_request_body(
        &self,
        body: &RequestBodyOrRef,
        location: &CanonicalRef,
    ) -> Result<(RequestBody, CanonicalRef), Fault> {
        match body {
            RequestBodyOrRef::Ref { ref_path } => {
                let resolved = self.compiler.resolver().resolve(&location.document, ref_path)?;
                let body = RequestBody::deserialize(resolved.node)
                    .map_err(|e| TypeMappingError::new(resolved.id.to_string(), e.to_string()))?;
                Ok((body, resolved.id))
            }
            RequestBodyOrRef::RequestBody(body) => Ok((body.clone(), location.clone())),
        }
    }

    fn resolve_response(
        &self,
        response: &ResponseOrRef,
        location: &CanonicalRef,
    ) -> Result<(Response, CanonicalRef), Fault> {
        match response {
            ResponseOrRef::Ref { ref_path } => {
                let resolved = self.compiler.resolver().resolve(&location.document, ref_path)?;
                let response = Response::deserialize(resolved.node)
                    .map_err(|e| TypeMappingError::new(resolved.id.to_string(), e.to_string()))?;
                Ok((response, resolved.id))
            }
            ResponseOrRef::Response(response) => Ok((response.clone(), location.clone())),
        }
    }
}

struct ResponseMessage {
    name: String,
    message: Option<Message>,
}

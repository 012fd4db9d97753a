use std::collections::{HashSet, VecDeque};

use indexmap::{IndexMap, IndexSet};
use serde::Deserialize;
use serde_json::Value;

use crate::config::CompilerOptions;
use crate::document::CanonicalRef;
use crate::error::{
    CompileIssue, Fault, NameCollisionError, ReferenceError, TypeMappingError,
};
use crate::ir::{Enum, EnumValue, Field, FieldType, Message, Scalar, WellKnown};
use crate::parse::ref_resolve::{RefResolver, Resolved};
use crate::parse::schema::{AdditionalProperties, Schema, SchemaOrRef, SchemaType};
use crate::parse::spec::OpenApiDocument;

use super::field_numbers::is_valid_number;
use super::name_normalizer::{NameScope, enum_label, field_name, screaming, type_name};

/// What a named schema compiles to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Message,
    Enum,
}

#[derive(Debug, Clone)]
enum TopLevel {
    Message(Message),
    Enum(Enum),
}

/// Registry slot for a schema node, keyed by its canonical identity.
#[derive(Debug)]
enum Entry {
    /// Primitive, array or map: expanded wherever it is referenced.
    Inline,
    Named {
        name: String,
        kind: TypeKind,
        output: Option<TopLevel>,
    },
}

/// Where a `$ref` leads from the point of view of a field.
pub(crate) enum Target<'a> {
    Named(String, TypeKind),
    Inline(Resolved<'a>),
}

/// A compiled value type before it becomes a field.
#[derive(Debug, Clone)]
pub(crate) struct Shape {
    pub field_type: FieldType,
    pub repeated: bool,
}

impl Shape {
    fn single(field_type: FieldType) -> Self {
        Self {
            field_type,
            repeated: false,
        }
    }

    /// Repeated and map values cannot nest directly in protobuf.
    fn is_container(&self) -> bool {
        self.repeated || matches!(self.field_type, FieldType::Map(_))
    }
}

/// A message under construction together with its naming scope. Fields,
/// nested types and the labels of nested enums all share it.
pub(crate) struct MessageBuilder {
    pub message: Message,
    pub scope: NameScope,
}

impl MessageBuilder {
    pub fn new(name: &str, description: Option<String>, source: &CanonicalRef) -> Self {
        Self {
            message: Message {
                name: name.to_string(),
                description,
                source: source.to_string(),
                ..Default::default()
            },
            scope: NameScope::new(name),
        }
    }

    pub fn finish(self) -> Message {
        self.message
    }
}

/// A property collected from a schema or from the branches of an `allOf`.
struct MergedProperty {
    branch: String,
    name: String,
    location: CanonicalRef,
    schema: SchemaOrRef,
}

/// Everything the type compiler produced.
#[derive(Debug, Default)]
pub struct SchemaOutput {
    pub enums: Vec<Enum>,
    pub messages: Vec<Message>,
    /// Names of top-level types that failed to compile.
    pub failed: IndexSet<String>,
    pub issues: Vec<CompileIssue>,
}

/// Compiles schema nodes into messages and enums.
///
/// Named definitions are registered up front in document order; any other
/// node reached through a `$ref` is registered on first sight and compiled
/// later from a FIFO queue, so the output order only depends on the input.
pub struct SchemaCompiler<'a> {
    resolver: RefResolver<'a>,
    options: &'a CompilerOptions,
    /// Top-level type names and the labels of top-level enums.
    file_scope: NameScope,
    registry: IndexMap<CanonicalRef, Entry>,
    queue: VecDeque<CanonicalRef>,
    extra: Vec<Message>,
    failed: IndexSet<String>,
    issues: Vec<CompileIssue>,
}

impl<'a> SchemaCompiler<'a> {
    pub fn new(resolver: RefResolver<'a>, options: &'a CompilerOptions) -> Self {
        Self {
            resolver,
            options,
            file_scope: NameScope::new("file"),
            registry: IndexMap::new(),
            queue: VecDeque::new(),
            extra: Vec::new(),
            failed: IndexSet::new(),
            issues: Vec::new(),
        }
    }

    pub(crate) fn options(&self) -> &'a CompilerOptions {
        self.options
    }

    pub(crate) fn resolver(&self) -> &RefResolver<'a> {
        &self.resolver
    }

    /// Register every named definition of the root document. Definitions
    /// that are only a `$ref` are aliases and resolve to their target.
    pub fn register_definitions(
        &mut self,
        document: &OpenApiDocument,
    ) -> Result<(), NameCollisionError> {
        let documents = self.resolver.documents();
        let section = CanonicalRef::new(documents.root_uri(), document.definitions_pointer());
        for name in document.schema_names() {
            let id = section.child(name);
            let Some(node) = documents.root().pointer(&id.pointer) else {
                continue;
            };
            if node.get("$ref").is_some() {
                log::debug!("{name} is an alias, not emitted");
                continue;
            }
            self.register(id, node)?;
        }
        Ok(())
    }

    fn register(&mut self, id: CanonicalRef, node: &Value) -> Result<(), NameCollisionError> {
        let kind = match classify(node, &id) {
            Ok(kind) => kind,
            Err(err) => {
                let name = self.file_scope.claim(&type_name(&id.type_hint()))?;
                log::debug!("{name} cannot be compiled: {err}");
                self.failed.insert(name.clone());
                self.issues.push(err.into());
                self.registry.insert(
                    id,
                    Entry::Named {
                        name,
                        kind: TypeKind::Message,
                        output: None,
                    },
                );
                return Ok(());
            }
        };
        match kind {
            None => {
                self.registry.insert(id, Entry::Inline);
            }
            Some(kind) => {
                let name = self.file_scope.claim(&type_name(&id.type_hint()))?;
                log::debug!("registered {kind:?} {name} for {id}");
                self.queue.push_back(id.clone());
                self.registry.insert(
                    id,
                    Entry::Named {
                        name,
                        kind,
                        output: None,
                    },
                );
            }
        }
        Ok(())
    }

    /// Compile queued types until the queue is empty. Only reference errors
    /// abort; anything else is collected and the type is left out.
    pub fn drain(&mut self) -> Result<(), ReferenceError> {
        while let Some(id) = self.queue.pop_front() {
            let Some(Entry::Named { name, kind, .. }) = self.registry.get(&id) else {
                continue;
            };
            let (name, kind) = (name.clone(), *kind);
            log::debug!("compiling {name}");
            match self.compile_entry(&id, &name, kind) {
                Ok(compiled) => {
                    if let Some(Entry::Named { output, .. }) = self.registry.get_mut(&id) {
                        *output = Some(compiled);
                    }
                }
                Err(Fault::Reference(err)) => return Err(err),
                Err(Fault::Issue(issue)) => {
                    self.failed.insert(name);
                    self.issues.push(issue);
                }
            }
        }
        Ok(())
    }

    fn compile_entry(
        &mut self,
        id: &CanonicalRef,
        name: &str,
        kind: TypeKind,
    ) -> Result<TopLevel, Fault> {
        let resolved = self.resolver.resolve_id(id)?;
        let schema = decode(resolved.node, id)?;
        match kind {
            TypeKind::Enum => {
                let built = build_enum(
                    name,
                    &schema,
                    &mut self.file_scope,
                    self.options.namespace_enums,
                    id,
                )?;
                Ok(TopLevel::Enum(built))
            }
            TypeKind::Message => {
                self.resolver.enter(id);
                let mut builder = MessageBuilder::new(name, schema.description.clone(), id);
                let result = self.fill_message(&mut builder, &schema, id);
                self.resolver.leave(id);
                result?;
                Ok(TopLevel::Message(builder.finish()))
            }
        }
    }

    /// Claim a top-level name for a message or service not backed by a
    /// schema. `name` must already be normalized.
    pub(crate) fn claim_type(&mut self, name: &str) -> Result<String, NameCollisionError> {
        self.file_scope.claim(name)
    }

    /// Append a synthesized top-level message.
    pub(crate) fn push_message(&mut self, message: Message) {
        self.extra.push(message);
    }

    /// Resolve a `$ref` written in `base` and register its target if new.
    pub(crate) fn reference(&mut self, base: &str, reference: &str) -> Result<Target<'a>, Fault> {
        let resolved = self.resolver.resolve(base, reference)?;
        if !self.registry.contains_key(&resolved.id) {
            self.register(resolved.id.clone(), resolved.node)?;
        }
        match self.registry.get(&resolved.id) {
            Some(Entry::Named { name, kind, .. }) => {
                if self.resolver.is_resolving(&resolved.id) {
                    log::debug!("{name} refers back to itself; referencing it by name");
                }
                Ok(Target::Named(name.clone(), *kind))
            }
            _ => Ok(Target::Inline(resolved)),
        }
    }

    /// Add one field per property of `schema` (with `allOf` branches merged).
    pub(crate) fn fill_message(
        &mut self,
        builder: &mut MessageBuilder,
        schema: &Schema,
        location: &CanonicalRef,
    ) -> Result<(), Fault> {
        reject_alternatives(schema, location)?;
        let mut properties = Vec::new();
        let mut required = IndexSet::new();
        let composed = !schema.all_of.is_empty();
        let branch = builder.message.name.clone();
        self.collect_properties(schema, location, &branch, &mut properties, &mut required)?;

        let mut seen = HashSet::new();
        for property in properties {
            let normalized = field_name(&property.name);
            let first = seen.insert(normalized.clone());
            let base = if composed && !first && !self.options.allof_prefix.is_empty() {
                field_name(&format!(
                    "{}{}_{}",
                    self.options.allof_prefix, property.branch, property.name
                ))
            } else {
                normalized
            };
            let name = builder.scope.claim(&base)?;
            let field = self.compile_field(
                builder,
                &name,
                &property.name,
                &property.schema,
                &property.location,
                required.contains(&property.name),
            )?;
            builder.message.fields.push(field);
        }
        check_explicit_numbers(&builder.message, location)?;
        Ok(())
    }

    /// Flatten `allOf` branches in order, then the schema's own properties.
    fn collect_properties(
        &mut self,
        schema: &Schema,
        location: &CanonicalRef,
        branch: &str,
        out: &mut Vec<MergedProperty>,
        required: &mut IndexSet<String>,
    ) -> Result<(), Fault> {
        let branches = location.child("allOf");
        for (index, part) in schema.all_of.iter().enumerate() {
            match part {
                SchemaOrRef::Ref { ref_path } => {
                    let resolved = self.resolver.resolve(&location.document, ref_path)?;
                    if !self.resolver.enter(&resolved.id) {
                        return Err(TypeMappingError::new(
                            location.to_string(),
                            format!("allOf branch {} includes itself", resolved.id),
                        )
                        .into());
                    }
                    let result = decode(resolved.node, &resolved.id)
                        .map_err(Fault::from)
                        .and_then(|sub| {
                            check_branch(&sub, &resolved.id)?;
                            let hint = resolved.id.type_hint();
                            self.collect_properties(&sub, &resolved.id, &hint, out, required)
                        });
                    self.resolver.leave(&resolved.id);
                    result?;
                }
                SchemaOrRef::Schema(sub) => {
                    let sub_location = branches.child(&index.to_string());
                    check_branch(sub, &sub_location)?;
                    self.collect_properties(sub, &sub_location, branch, out, required)?;
                }
            }
        }
        required.extend(schema.required.iter().cloned());
        let properties = location.child("properties");
        for (name, property) in &schema.properties {
            out.push(MergedProperty {
                branch: branch.to_string(),
                name: name.clone(),
                location: properties.child(name),
                schema: property.clone(),
            });
        }
        Ok(())
    }

    /// Compile one property into a field named `name`.
    pub(crate) fn compile_field(
        &mut self,
        owner: &mut MessageBuilder,
        name: &str,
        original_name: &str,
        schema: &SchemaOrRef,
        location: &CanonicalRef,
        required: bool,
    ) -> Result<Field, Fault> {
        let shape = self.shape(owner, original_name, schema, location)?;
        let mut field = Field::new(name, original_name, shape.field_type);
        if shape.repeated {
            field = field.repeated();
        }
        field.required = required;
        if let SchemaOrRef::Schema(inline) = schema {
            field.description = inline.description.clone();
            field.deprecated = inline.deprecated.unwrap_or(false);
            if let Some(number) = inline.proto_tag {
                if !is_valid_number(number) {
                    return Err(TypeMappingError::new(
                        location.to_string(),
                        format!("x-proto-tag {number} is not a usable field number"),
                    )
                    .into());
                }
                field.explicit_number = Some(number);
            }
        }
        if self.options.wrap_primitives
            && !required
            && !field.is_repeated()
            && let FieldType::Scalar(scalar) = field.field_type
        {
            field.field_type = FieldType::WellKnown(scalar.wrapper());
        }
        Ok(field)
    }

    /// Compile the value type of a property. Nested types land in `owner`,
    /// named after `hint`.
    pub(crate) fn shape(
        &mut self,
        owner: &mut MessageBuilder,
        hint: &str,
        schema: &SchemaOrRef,
        location: &CanonicalRef,
    ) -> Result<Shape, Fault> {
        match schema {
            SchemaOrRef::Ref { ref_path } => match self.reference(&location.document, ref_path)? {
                Target::Named(name, _) => Ok(Shape::single(FieldType::Ref(name))),
                Target::Inline(resolved) => self.expand_alias(owner, hint, &resolved),
            },
            SchemaOrRef::Schema(inline) => self.shape_schema(owner, hint, inline, location),
        }
    }

    /// Expand a referenced primitive, array or map definition in place.
    fn expand_alias(
        &mut self,
        owner: &mut MessageBuilder,
        hint: &str,
        resolved: &Resolved<'a>,
    ) -> Result<Shape, Fault> {
        if !self.resolver.enter(&resolved.id) {
            return Err(TypeMappingError::new(
                resolved.id.to_string(),
                "definition expands to itself without an intervening message",
            )
            .into());
        }
        let result = decode(resolved.node, &resolved.id)
            .map_err(Fault::from)
            .and_then(|schema| self.shape_schema(owner, hint, &schema, &resolved.id));
        self.resolver.leave(&resolved.id);
        result
    }

    pub(crate) fn shape_schema(
        &mut self,
        owner: &mut MessageBuilder,
        hint: &str,
        schema: &Schema,
        location: &CanonicalRef,
    ) -> Result<Shape, Fault> {
        reject_alternatives(schema, location)?;

        if !schema.enum_values.is_empty() {
            let name = owner.scope.claim(&type_name(hint))?;
            let nested = build_enum(
                &name,
                schema,
                &mut owner.scope,
                self.options.namespace_enums,
                location,
            )?;
            owner.message.enums.push(nested);
            return Ok(Shape::single(FieldType::Nested(name)));
        }

        if schema.has_structure() {
            let name = owner.scope.claim(&type_name(hint))?;
            let mut child = MessageBuilder::new(&name, schema.description.clone(), location);
            self.fill_message(&mut child, schema, location)?;
            owner.message.messages.push(child.finish());
            return Ok(Shape::single(FieldType::Nested(name)));
        }

        let schema_type = schema.effective_type().map_err(|types| {
            TypeMappingError::new(
                location.to_string(),
                format!("several non-null types {types:?} have no protobuf counterpart"),
            )
        })?;

        match schema_type {
            Some(SchemaType::Array) => {
                let items = schema.items.as_deref().ok_or_else(|| {
                    TypeMappingError::new(location.to_string(), "array without items")
                })?;
                let item = self.shape(owner, hint, items, &location.child("items"))?;
                let field_type = if item.is_container() {
                    self.wrap(owner, &format!("{}Item", type_name(hint)), item, location)?
                } else {
                    item.field_type
                };
                Ok(Shape {
                    field_type,
                    repeated: true,
                })
            }
            Some(SchemaType::Object) | None => match &schema.additional_properties {
                Some(AdditionalProperties::Bool(true)) => Ok(Shape::single(FieldType::Map(
                    Box::new(FieldType::WellKnown(WellKnown::Any)),
                ))),
                Some(AdditionalProperties::Schema(value)) => {
                    let value_location = location.child("additionalProperties");
                    let value = self.shape(owner, hint, value, &value_location)?;
                    let value_type = if value.is_container() {
                        self.wrap(owner, &format!("{}Value", type_name(hint)), value, location)?
                    } else {
                        value.field_type
                    };
                    Ok(Shape::single(FieldType::Map(Box::new(value_type))))
                }
                _ if schema_type.is_some() => Ok(Shape::single(FieldType::WellKnown(WellKnown::Any))),
                _ => Err(TypeMappingError::new(
                    location.to_string(),
                    "no type and no recognizable structure",
                )
                .into()),
            },
            Some(SchemaType::Null) => Err(TypeMappingError::new(
                location.to_string(),
                "a null-only type has no protobuf counterpart",
            )
            .into()),
            Some(primitive) => Ok(Shape::single(FieldType::Scalar(scalar_for(
                primitive,
                schema.format.as_deref(),
            )))),
        }
    }

    /// Hold a repeated or map value in a nested message so it can itself be
    /// repeated or used as a map value.
    fn wrap(
        &mut self,
        owner: &mut MessageBuilder,
        raw_name: &str,
        inner: Shape,
        location: &CanonicalRef,
    ) -> Result<FieldType, Fault> {
        let name = owner.scope.claim(raw_name)?;
        let field_name = if inner.repeated { "items" } else { "values" };
        let mut field = Field::new(field_name, field_name, inner.field_type);
        if inner.repeated {
            field = field.repeated();
        }
        let mut wrapper = MessageBuilder::new(&name, None, location);
        wrapper.scope.claim(field_name)?;
        wrapper.message.fields.push(field);
        owner.message.messages.push(wrapper.finish());
        Ok(FieldType::Nested(name))
    }

    /// Fill a synthesized message from a body schema of any shape: objects
    /// contribute their properties, anything else becomes a single field.
    pub(crate) fn fill_value_message(
        &mut self,
        builder: &mut MessageBuilder,
        schema: &Schema,
        location: &CanonicalRef,
    ) -> Result<(), Fault> {
        let object_like = schema.has_structure()
            || (schema.effective_type() == Ok(Some(SchemaType::Object))
                && schema.additional_properties.is_none()
                && schema.enum_values.is_empty());
        if object_like {
            return self.fill_message(builder, schema, location);
        }
        let shape = self.shape_schema(builder, "value", schema, location)?;
        let raw = if shape.repeated {
            "items"
        } else if matches!(shape.field_type, FieldType::Map(_)) {
            "values"
        } else {
            "value"
        };
        let name = builder.scope.claim(raw)?;
        let mut field = Field::new(name, raw, shape.field_type);
        if shape.repeated {
            field = field.repeated();
        }
        builder.message.fields.push(field);
        Ok(())
    }

    /// Like [`Self::fill_value_message`], for a body that may be a `$ref`.
    /// Named types become a single `value` field.
    pub(crate) fn fill_value_from(
        &mut self,
        builder: &mut MessageBuilder,
        schema: &SchemaOrRef,
        location: &CanonicalRef,
    ) -> Result<(), Fault> {
        match schema {
            SchemaOrRef::Ref { ref_path } => match self.reference(&location.document, ref_path)? {
                Target::Named(name, _) => {
                    let field = builder.scope.claim("value")?;
                    builder
                        .message
                        .fields
                        .push(Field::new(field, "value", FieldType::Ref(name)));
                    Ok(())
                }
                Target::Inline(resolved) => {
                    if !self.resolver.enter(&resolved.id) {
                        return Err(TypeMappingError::new(
                            resolved.id.to_string(),
                            "definition expands to itself without an intervening message",
                        )
                        .into());
                    }
                    let result = decode(resolved.node, &resolved.id)
                        .map_err(Fault::from)
                        .and_then(|inner| self.fill_value_message(builder, &inner, &resolved.id));
                    self.resolver.leave(&resolved.id);
                    result
                }
            },
            SchemaOrRef::Schema(inline) => self.fill_value_message(builder, inline, location),
        }
    }

    /// Hand over everything compiled so far, in registration order followed
    /// by synthesized messages.
    pub fn finish(self) -> SchemaOutput {
        let mut output = SchemaOutput {
            failed: self.failed,
            issues: self.issues,
            ..Default::default()
        };
        for entry in self.registry.into_values() {
            match entry {
                Entry::Named {
                    output: Some(TopLevel::Message(message)),
                    ..
                } => output.messages.push(message),
                Entry::Named {
                    output: Some(TopLevel::Enum(built)),
                    ..
                } => output.enums.push(built),
                _ => {}
            }
        }
        output.messages.extend(self.extra);
        output
    }
}

/// Decide how a schema node compiles: `None` means it is expanded inline.
fn classify(node: &Value, id: &CanonicalRef) -> Result<Option<TypeKind>, TypeMappingError> {
    let schema = decode(node, id)?;
    reject_alternatives(&schema, id)?;
    if !schema.enum_values.is_empty() {
        return Ok(Some(TypeKind::Enum));
    }
    if schema.has_structure() {
        return Ok(Some(TypeKind::Message));
    }
    let is_map = matches!(
        schema.additional_properties,
        Some(AdditionalProperties::Bool(true)) | Some(AdditionalProperties::Schema(_))
    );
    match schema.effective_type() {
        Err(types) => Err(TypeMappingError::new(
            id.to_string(),
            format!("several non-null types {types:?} have no protobuf counterpart"),
        )),
        Ok(Some(SchemaType::Object)) if is_map => Ok(None),
        Ok(Some(SchemaType::Object)) => Ok(Some(TypeKind::Message)),
        Ok(Some(SchemaType::Null)) => Err(TypeMappingError::new(
            id.to_string(),
            "a null-only type has no protobuf counterpart",
        )),
        Ok(Some(_)) => Ok(None),
        Ok(None) if is_map => Ok(None),
        Ok(None) => Err(TypeMappingError::new(
            id.to_string(),
            "no type and no recognizable structure",
        )),
    }
}

fn decode(node: &Value, id: &CanonicalRef) -> Result<Schema, TypeMappingError> {
    Schema::deserialize(node).map_err(|e| TypeMappingError::new(id.to_string(), e.to_string()))
}

fn reject_alternatives(schema: &Schema, location: &CanonicalRef) -> Result<(), TypeMappingError> {
    if !schema.one_of.is_empty() || !schema.any_of.is_empty() {
        return Err(TypeMappingError::new(
            location.to_string(),
            "oneOf/anyOf are not supported",
        ));
    }
    Ok(())
}

fn check_branch(schema: &Schema, location: &CanonicalRef) -> Result<(), TypeMappingError> {
    reject_alternatives(schema, location)?;
    match schema.effective_type() {
        Ok(None) | Ok(Some(SchemaType::Object)) if schema.enum_values.is_empty() => Ok(()),
        _ => Err(TypeMappingError::new(
            location.to_string(),
            "allOf branch is not an object schema",
        )),
    }
}

fn check_explicit_numbers(message: &Message, location: &CanonicalRef) -> Result<(), TypeMappingError> {
    let mut seen = HashSet::new();
    for field in &message.fields {
        if let Some(number) = field.explicit_number
            && !seen.insert(number)
        {
            return Err(TypeMappingError::new(
                location.to_string(),
                format!("field number {number} is used twice in {}", message.name),
            ));
        }
    }
    Ok(())
}

fn scalar_for(schema_type: SchemaType, format: Option<&str>) -> Scalar {
    match (schema_type, format) {
        (SchemaType::Integer, Some("int64")) => Scalar::Int64,
        (SchemaType::Integer, Some("uint32")) => Scalar::Uint32,
        (SchemaType::Integer, Some("uint64")) => Scalar::Uint64,
        (SchemaType::Integer, _) => Scalar::Int32,
        (SchemaType::Number, Some("float")) => Scalar::Float,
        (SchemaType::Number, _) => Scalar::Double,
        (SchemaType::String, Some("byte" | "binary")) => Scalar::Bytes,
        (SchemaType::File, _) => Scalar::Bytes,
        (SchemaType::Boolean, _) => Scalar::Bool,
        _ => Scalar::String,
    }
}

/// Build an enum: the zero sentinel first, then one value per distinct raw
/// value. Labels are claimed in `scope`, the scope that holds the enum
/// itself, since protobuf enum values are siblings of their enum.
fn build_enum(
    name: &str,
    schema: &Schema,
    scope: &mut NameScope,
    namespace: bool,
    location: &CanonicalRef,
) -> Result<Enum, Fault> {
    let prefix = screaming(name);
    let sentinel = scope.claim(&format!("{prefix}_UNSPECIFIED"))?;
    let mut built = Enum {
        name: name.to_string(),
        description: schema.description.clone(),
        values: vec![EnumValue {
            label: sentinel,
            number: 0,
        }],
    };

    let mut seen = HashSet::new();
    for value in &schema.enum_values {
        let raw = match value {
            Value::Null => continue,
            Value::String(s) => s.clone(),
            Value::Bool(_) | Value::Number(_) => value.to_string(),
            Value::Array(_) | Value::Object(_) => {
                return Err(TypeMappingError::new(
                    location.to_string(),
                    format!("enum value {value} is not a scalar"),
                )
                .into());
            }
        };
        if !seen.insert(value.to_string()) {
            log::debug!("dropping duplicate value {value} of {name}");
            continue;
        }
        let label = enum_label(&raw);
        let label = if namespace {
            format!("{prefix}_{}", label.trim_start_matches('_'))
        } else {
            label
        };
        let number = built.values.len() as u32;
        built.values.push(EnumValue {
            label: scope.claim(&label)?,
            number,
        });
    }
    Ok(built)
}

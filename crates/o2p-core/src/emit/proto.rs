use std::collections::HashSet;
use std::io;

use minijinja::{Environment, Value, context};

use crate::config::EmitterOptions;
use crate::error::EmitError;
use crate::ir::{Enum, FieldType, HttpRule, Message, ProtoFile, Rpc, Service};

const INDENT: &str = "  ";

/// Render `file` as proto3 source text.
///
/// The layout lives in `templates/file.proto.j2`; this module turns the IR
/// into template values and decides how each type is spelled.
pub fn render_proto(file: &ProtoFile, options: &EmitterOptions) -> Result<String, EmitError> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.add_template("file.proto.j2", include_str!("../../templates/file.proto.j2"))?;
    let tmpl = env.get_template("file.proto.j2")?;

    let file_options: Vec<Value> = file
        .options
        .iter()
        .map(|o| {
            context! {
                name => o.name.clone(),
                value => o.value.clone(),
            }
        })
        .collect();
    let enums: Vec<Value> = file.enums.iter().map(|e| enum_to_ctx(e, 0)).collect();
    let mut shadowed = Vec::new();
    let messages: Vec<Value> = file
        .messages
        .iter()
        .map(|m| message_to_ctx(m, 0, &file.package, &mut shadowed))
        .collect();
    let services: Vec<Value> = file.services.iter().map(service_to_ctx).collect();

    let rendered = tmpl.render(context! {
        autogenerated => options.autogenerated_comment,
        package => file.package.clone(),
        imports => file.imports.clone(),
        options => file_options,
        enums => enums,
        messages => messages,
        services => services,
    })?;

    let mut text = rendered.trim_end().to_string();
    text.push('\n');
    Ok(text)
}

/// Render `file` into any byte sink.
pub fn write_proto<W: io::Write>(
    file: &ProtoFile,
    options: &EmitterOptions,
    sink: &mut W,
) -> Result<(), EmitError> {
    let text = render_proto(file, options)?;
    sink.write_all(text.as_bytes())?;
    sink.flush()?;
    Ok(())
}

/// One `//` row per line of `text`; blank lines keep a bare `//`.
fn comment_rows(text: Option<&str>) -> Vec<String> {
    let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) else {
        return Vec::new();
    };
    text.lines()
        .map(str::trim_end)
        .map(|row| {
            if row.is_empty() {
                "//".to_string()
            } else {
                format!("// {row}")
            }
        })
        .collect()
}

fn enum_to_ctx(item: &Enum, depth: usize) -> Value {
    let values: Vec<Value> = item
        .values
        .iter()
        .map(|v| {
            context! {
                label => v.label.clone(),
                number => v.number,
            }
        })
        .collect();
    context! {
        pad => INDENT.repeat(depth),
        name => item.name.clone(),
        comment => comment_rows(item.description.as_deref()),
        values => values,
    }
}

/// `shadowed` holds, for each enclosing message, the names its nested types
/// and nested enum values introduce. protoc resolves a bare name from the
/// innermost scope outwards, so a top-level type whose name appears there
/// has to be written fully qualified.
fn message_to_ctx<'a>(
    message: &'a Message,
    depth: usize,
    package: &str,
    shadowed: &mut Vec<HashSet<&'a str>>,
) -> Value {
    let mut names: HashSet<&str> = message.messages.iter().map(|m| m.name.as_str()).collect();
    for nested in &message.enums {
        names.insert(nested.name.as_str());
        names.extend(nested.values.iter().map(|v| v.label.as_str()));
    }
    shadowed.push(names);

    let fields: Vec<Value> = message
        .fields
        .iter()
        .map(|f| {
            context! {
                comment => comment_rows(f.description.as_deref()),
                label => if f.is_repeated() { "repeated " } else { "" },
                type => spell_type(&f.field_type, package, &shadowed[..]),
                name => f.name.clone(),
                number => f.number,
                options => if f.deprecated { " [deprecated = true]" } else { "" },
            }
        })
        .collect();
    let enums: Vec<Value> = message
        .enums
        .iter()
        .map(|e| enum_to_ctx(e, depth + 1))
        .collect();
    let nested: Vec<Value> = message
        .messages
        .iter()
        .map(|m| message_to_ctx(m, depth + 1, package, shadowed))
        .collect();
    shadowed.pop();

    let reserved = (!message.reserved.is_empty()).then(|| {
        message
            .reserved
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    });
    let empty = message.fields.is_empty()
        && message.messages.is_empty()
        && message.enums.is_empty()
        && message.reserved.is_empty();

    context! {
        pad => INDENT.repeat(depth),
        name => message.name.clone(),
        comment => comment_rows(message.description.as_deref()),
        empty => empty,
        enums => enums,
        messages => nested,
        reserved => reserved,
        fields => fields,
    }
}

fn spell_type(field_type: &FieldType, package: &str, shadowed: &[HashSet<&str>]) -> String {
    match field_type {
        FieldType::Ref(name) if shadowed.iter().any(|names| names.contains(name.as_str())) => {
            format!(".{package}.{name}")
        }
        FieldType::Map(value) => format!("map<string, {}>", spell_type(value, package, shadowed)),
        other => other.type_name(),
    }
}

fn service_to_ctx(service: &Service) -> Value {
    let rpcs: Vec<Value> = service.rpcs.iter().map(rpc_to_ctx).collect();
    context! {
        name => service.name.clone(),
        rpcs => rpcs,
    }
}

fn rpc_to_ctx(rpc: &Rpc) -> Value {
    context! {
        name => rpc.name.clone(),
        input => rpc.input.clone(),
        output => rpc.output.clone(),
        comment => comment_rows(rpc.description.as_deref()),
        expanded => rpc.deprecated || rpc.http.is_some(),
        deprecated => rpc.deprecated,
        http => rpc.http.as_ref().map(http_rule_to_ctx),
    }
}

/// `google.api.http` values; methods without a dedicated keyword use the
/// `custom` pattern.
fn http_rule_to_ctx(rule: &HttpRule) -> Value {
    context! {
        keyword => rule.method.http_rule_keyword(),
        kind => quote(rule.method.as_str()),
        path => quote(&rule.path),
        body => rule.body.as_deref().map(quote),
    }
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

use std::collections::HashSet;

use heck::{ToPascalCase, ToShoutySnakeCase, ToSnakeCase};

use crate::error::NameCollisionError;

/// One protobuf naming scope. Names are claimed in traversal order; a later
/// claim of a taken name receives the first free numeric suffix.
#[derive(Debug, Clone, Default)]
pub struct NameScope {
    label: String,
    taken: HashSet<String>,
}

impl NameScope {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            taken: HashSet::new(),
        }
    }

    /// Claim `base`, or `base2`, `base3`, … when it is already taken.
    /// `base` must already be normalized.
    pub fn claim(&mut self, base: &str) -> Result<String, NameCollisionError> {
        if self.taken.insert(base.to_string()) {
            return Ok(base.to_string());
        }
        for suffix in 2..=u32::MAX {
            let candidate = format!("{base}{suffix}");
            if self.taken.insert(candidate.clone()) {
                log::debug!("renamed {base} to {candidate} in {}", self.label);
                return Ok(candidate);
            }
        }
        Err(NameCollisionError {
            name: base.to_string(),
            scope: self.label.clone(),
        })
    }
}

/// PascalCase identifier for messages, enums, services and RPCs.
pub fn type_name(raw: &str) -> String {
    legalize(&sanitize_identifier(raw).to_pascal_case(), "Unnamed")
}

/// snake_case identifier for fields.
pub fn field_name(raw: &str) -> String {
    legalize(&sanitize_identifier(raw).to_snake_case(), "unnamed")
}

/// SCREAMING_SNAKE identifier for enum labels. The empty string is a
/// legitimate enum value and maps to `EMPTY`.
pub fn enum_label(raw: &str) -> String {
    if raw.is_empty() {
        return "EMPTY".to_string();
    }
    legalize(&sanitize_identifier(raw).to_shouty_snake_case(), "EMPTY")
}

/// SCREAMING_SNAKE form of a type name, used as an enum label prefix.
pub fn screaming(type_name: &str) -> String {
    type_name.to_shouty_snake_case()
}

/// Package derived from a document title: lowercase ASCII alphanumerics only.
pub fn package_name(title: &str) -> Option<String> {
    let package: String = title
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect();
    match package.chars().next() {
        None => None,
        Some(first) if first.is_ascii_digit() => Some(format!("_{package}")),
        Some(_) => Some(package),
    }
}

/// Make a cased identifier match `[A-Za-z_][A-Za-z0-9_]*`.
fn legalize(cased: &str, fallback: &str) -> String {
    match cased.chars().next() {
        None => fallback.to_string(),
        Some(first) if first.is_ascii_digit() => format!("_{cased}"),
        Some(_) => cased.to_string(),
    }
}

/// Derive a PascalCase RPC name from HTTP method + path.
///
/// Examples:
/// - `GET /users` → `ListUsers`
/// - `POST /users` → `CreateUsers`
/// - `GET /users/{userId}` → `GetUser`
/// - `PUT /users/{userId}` → `UpdateUser`
/// - `DELETE /users/{userId}` → `DeleteUser`
/// - `GET /users/{userId}/messages` → `ListUsersMessages`
pub fn route_to_name(method: &str, path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    let mut resource_parts: Vec<&str> = Vec::new();
    let mut ends_with_param = false;

    for seg in &segments {
        if seg.starts_with('{') && seg.ends_with('}') {
            ends_with_param = true;
        } else {
            resource_parts.push(seg);
            ends_with_param = false;
        }
    }

    let method_upper = method.to_uppercase();
    let prefix = match method_upper.as_str() {
        "GET" if ends_with_param => "Get",
        "GET" => "List",
        "POST" => "Create",
        "PUT" => "Update",
        "DELETE" => "Delete",
        "PATCH" => "Patch",
        "OPTIONS" => "Options",
        "HEAD" => "Head",
        "TRACE" => "Trace",
        other => return type_name(&format!("{other} {path}")),
    };

    let mut name = prefix.to_string();
    for (i, part) in resource_parts.iter().enumerate() {
        let is_last = i == resource_parts.len() - 1;
        let word = if is_last && ends_with_param {
            singularize(part)
        } else {
            part.to_string()
        };
        name.push_str(&sanitize_identifier(&word).to_pascal_case());
    }
    name
}

/// Naive singularization: strips trailing 's' if present.
fn singularize(word: &str) -> String {
    if word.ends_with("ies") && word.len() > 3 {
        format!("{}y", &word[..word.len() - 3])
    } else if word.ends_with("ses") || word.ends_with("xes") || word.ends_with("zes") {
        word[..word.len() - 2].to_string()
    } else if word.ends_with('s') && !word.ends_with("ss") && word.len() > 1 {
        word[..word.len() - 1].to_string()
    } else {
        word.to_string()
    }
}

/// Replace every run of non-identifier characters with a single `_` so the
/// case converters see word boundaries.
fn sanitize_identifier(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut prev_was_separator = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if prev_was_separator && !result.is_empty() {
                result.push('_');
            }
            result.push(ch);
            prev_was_separator = false;
        } else {
            prev_was_separator = true;
        }
    }

    result
}

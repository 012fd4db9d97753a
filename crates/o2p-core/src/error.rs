use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported OpenAPI version: {0}")]
    UnsupportedVersion(String),

    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("invalid document URI {uri}: {reason}")]
    InvalidUri { uri: String, reason: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Yaml {
        path: String,
        source: serde_yaml_ng::Error,
    },
}

/// A `$ref` that cannot be followed. Fatal for the whole compilation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unresolved reference `{pointer}` in {document}: {reason}")]
pub struct ReferenceError {
    pub pointer: String,
    pub document: String,
    pub reason: String,
}

impl ReferenceError {
    pub fn new(
        pointer: impl Into<String>,
        document: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            pointer: pointer.into(),
            document: document.into(),
            reason: reason.into(),
        }
    }
}

/// A schema shape with no protobuf counterpart.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot map schema at {path}: {reason}")]
pub struct TypeMappingError {
    pub path: String,
    pub reason: String,
}

impl TypeMappingError {
    pub fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no unique identifier left for `{name}` in scope {scope}")]
pub struct NameCollisionError {
    pub name: String,
    pub scope: String,
}

/// An operation that could not be turned into an RPC; only that operation is skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("skipped operation {method} {path}: {reason}")]
pub struct ServiceCompilationError {
    pub method: String,
    pub path: String,
    pub reason: String,
}

/// A non-fatal problem collected while compiling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileIssue {
    #[error(transparent)]
    TypeMapping(#[from] TypeMappingError),

    #[error(transparent)]
    NameCollision(#[from] NameCollisionError),

    #[error(transparent)]
    Service(#[from] ServiceCompilationError),
}

/// Errors that abort compilation with no output.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Reference(#[from] ReferenceError),

    #[error("invalid OpenAPI document: {0}")]
    Document(#[from] ParseError),

    #[error(transparent)]
    NameCollision(#[from] NameCollisionError),
}

/// All issues of a best-effort compilation, reported together.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", summarize(.issues))]
pub struct AggregateError {
    pub issues: Vec<CompileIssue>,
}

fn summarize(issues: &[CompileIssue]) -> String {
    let mut out = format!("{} compilation issue(s):", issues.len());
    for issue in issues {
        out.push_str(&format!("\n  - {issue}"));
    }
    out
}

#[derive(Debug, Error)]
pub enum EmitError {
    #[error("failed to render proto layout: {0}")]
    Template(#[from] minijinja::Error),

    #[error("failed to write proto output: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure while compiling a single type: references abort the run, the rest is collected.
#[derive(Debug)]
pub(crate) enum Fault {
    Reference(ReferenceError),
    Issue(CompileIssue),
}

impl From<ReferenceError> for Fault {
    fn from(err: ReferenceError) -> Self {
        Fault::Reference(err)
    }
}

impl From<TypeMappingError> for Fault {
    fn from(err: TypeMappingError) -> Self {
        Fault::Issue(CompileIssue::TypeMapping(err))
    }
}

impl From<NameCollisionError> for Fault {
    fn from(err: NameCollisionError) -> Self {
        Fault::Issue(CompileIssue::NameCollision(err))
    }
}

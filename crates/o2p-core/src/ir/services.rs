/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Head,
    Trace,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
            HttpMethod::Trace => "TRACE",
        }
    }

    /// Parse a path-item key; non-method keys (`parameters`, `x-…`) give `None`.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "get" => Some(HttpMethod::Get),
            "post" => Some(HttpMethod::Post),
            "put" => Some(HttpMethod::Put),
            "delete" => Some(HttpMethod::Delete),
            "patch" => Some(HttpMethod::Patch),
            "options" => Some(HttpMethod::Options),
            "head" => Some(HttpMethod::Head),
            "trace" => Some(HttpMethod::Trace),
            _ => None,
        }
    }

    /// The `google.api.http` pattern keyword, if the method has one.
    pub fn http_rule_keyword(&self) -> Option<&'static str> {
        match self {
            HttpMethod::Get => Some("get"),
            HttpMethod::Post => Some("post"),
            HttpMethod::Put => Some("put"),
            HttpMethod::Delete => Some("delete"),
            HttpMethod::Patch => Some("patch"),
            HttpMethod::Options | HttpMethod::Head | HttpMethod::Trace => None,
        }
    }
}

/// A `google.api.http` binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRule {
    pub method: HttpMethod,
    pub path: String,
    /// Request field carried as the HTTP body.
    pub body: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rpc {
    pub name: String,
    pub input: String,
    pub output: String,
    pub http: Option<HttpRule>,
    pub deprecated: bool,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Service {
    pub name: String,
    pub rpcs: Vec<Rpc>,
}

impl Service {
    pub fn rpc(&self, name: &str) -> Option<&Rpc> {
        self.rpcs.iter().find(|r| r.name == name)
    }
}

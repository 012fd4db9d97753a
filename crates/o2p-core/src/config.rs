use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Toggles that shape the compiled IR. Threaded explicitly through every stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerOptions {
    /// Attach `google.api.http` bindings to every RPC.
    pub annotate: bool,
    /// Prefix for `allOf` fields whose name collides with an earlier branch.
    pub allof_prefix: String,
    /// Generate messages and enums only.
    pub skip_rpcs: bool,
    /// Leave out operations marked `deprecated: true`.
    pub skip_deprecated_rpcs: bool,
    /// Prefix every enum label with its enum's name.
    pub namespace_enums: bool,
    /// Use `google.protobuf.*Value` wrappers for optional primitive fields.
    pub wrap_primitives: bool,
    /// Overrides the package derived from the document.
    pub package: Option<String>,
    pub service_grouping: ServiceGrouping,
}

impl CompilerOptions {
    pub fn with_annotation(mut self, enabled: bool) -> Self {
        self.annotate = enabled;
        self
    }

    pub fn with_allof_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.allof_prefix = prefix.into();
        self
    }

    pub fn with_skip_rpcs(mut self, enabled: bool) -> Self {
        self.skip_rpcs = enabled;
        self
    }

    pub fn with_skip_deprecated_rpcs(mut self, enabled: bool) -> Self {
        self.skip_deprecated_rpcs = enabled;
        self
    }

    pub fn with_namespace_enums(mut self, enabled: bool) -> Self {
        self.namespace_enums = enabled;
        self
    }

    pub fn with_wrap_primitives(mut self, enabled: bool) -> Self {
        self.wrap_primitives = enabled;
        self
    }

    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }

    pub fn with_service_grouping(mut self, grouping: ServiceGrouping) -> Self {
        self.service_grouping = grouping;
        self
    }
}

/// How RPCs are distributed over services.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceGrouping {
    /// One service for the whole document.
    #[default]
    Document,
    /// One service per operation tag (first tag wins).
    Tag,
}

/// Options that only affect text output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitterOptions {
    pub autogenerated_comment: bool,
}

impl EmitterOptions {
    pub fn with_autogenerated_comment(mut self, enabled: bool) -> Self {
        self.autogenerated_comment = enabled;
        self
    }
}

/// Top-level project configuration loaded from `.o2p.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub input: String,
    pub output: String,
    /// Lock file holding the field numbers of the previous run.
    pub field_numbers: Option<String>,
    pub compiler: CompilerOptions,
    pub emitter: EmitterOptions,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            input: "openapi.yaml".to_string(),
            output: "api.proto".to_string(),
            field_numbers: None,
            compiler: CompilerOptions::default(),
            emitter: EmitterOptions::default(),
        }
    }
}

/// Default config file name.
pub const CONFIG_FILE_NAME: &str = ".o2p.yaml";

/// Load config from a YAML file. Returns `None` if the file doesn't exist.
pub fn load_config(path: &Path) -> Result<Option<ProjectConfig>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let config: ProjectConfig =
        serde_yaml_ng::from_str(&content).map_err(|source| ConfigError::Yaml {
            path: path.display().to_string(),
            source,
        })?;
    Ok(Some(config))
}

/// Generate the default config file content.
pub fn default_config_content() -> &'static str {
    r#"# o2p configuration
input: openapi.yaml
output: api.proto
# field_numbers: api.numbers.yaml   # keeps field numbers stable across regenerations

compiler:
  annotate: false               # add google.api.http bindings
  allof_prefix: ""              # prefix for colliding allOf fields
  skip_rpcs: false
  skip_deprecated_rpcs: false
  namespace_enums: false        # prefix enum labels with the enum name
  wrap_primitives: false        # optional primitives become google.protobuf wrappers
  # package: petstore.v1
  service_grouping: document    # document | tag

emitter:
  autogenerated_comment: false
"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ProjectConfig::default();
        assert_eq!(config.input, "openapi.yaml");
        assert_eq!(config.output, "api.proto");
        assert!(config.field_numbers.is_none());
        assert_eq!(config.compiler, CompilerOptions::default());
        assert_eq!(config.compiler.service_grouping, ServiceGrouping::Document);
        assert!(!config.emitter.autogenerated_comment);
    }

    #[test]
    fn test_default_content_parses() {
        let config: ProjectConfig = serde_yaml_ng::from_str(default_config_content()).unwrap();
        assert_eq!(config, ProjectConfig::default());
    }

    #[test]
    fn test_parse_config_yaml() {
        let yaml = r#"
input: spec.yaml
output: out/petstore.proto
field_numbers: out/petstore.numbers.yaml
compiler:
  annotate: true
  allof_prefix: base_
  skip_deprecated_rpcs: true
  namespace_enums: true
  package: petstore.v1
  service_grouping: tag
emitter:
  autogenerated_comment: true
"#;
        let config: ProjectConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.input, "spec.yaml");
        assert_eq!(
            config.field_numbers.as_deref(),
            Some("out/petstore.numbers.yaml")
        );
        assert!(config.compiler.annotate);
        assert_eq!(config.compiler.allof_prefix, "base_");
        assert!(!config.compiler.skip_rpcs);
        assert!(config.compiler.skip_deprecated_rpcs);
        assert!(config.compiler.namespace_enums);
        assert!(!config.compiler.wrap_primitives);
        assert_eq!(config.compiler.package.as_deref(), Some("petstore.v1"));
        assert_eq!(config.compiler.service_grouping, ServiceGrouping::Tag);
        assert!(config.emitter.autogenerated_comment);
    }

    #[test]
    fn test_builder_options() {
        let options = CompilerOptions::default()
            .with_annotation(true)
            .with_wrap_primitives(true)
            .with_allof_prefix("p_");
        assert!(options.annotate);
        assert!(options.wrap_primitives);
        assert_eq!(options.allof_prefix, "p_");
        assert!(!options.skip_rpcs);
    }
}

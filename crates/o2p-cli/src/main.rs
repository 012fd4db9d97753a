mod loader;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use o2p_core::config::{self, CONFIG_FILE_NAME, ProjectConfig, ServiceGrouping};
use o2p_core::emit::render_proto;
use o2p_core::ir::ProtoFile;
use o2p_core::transform::{Compilation, FieldNumberMap, compile};

use loader::Loader;

#[derive(Parser)]
#[command(
    name = "o2p",
    about = "Compile OpenAPI 2.0/3.x documents to Protocol Buffers",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile an OpenAPI document into a .proto file
    Generate {
        /// Path or URL of the OpenAPI document (YAML or JSON)
        #[arg(short, long)]
        input: Option<String>,

        /// Where to write the .proto file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Field-number lock file, read before and updated after compiling
        #[arg(long)]
        field_numbers: Option<PathBuf>,

        /// Fail if any schema or operation had to be left out
        #[arg(long)]
        strict: bool,

        /// Add the "Code generated ... DO NOT EDIT." header
        #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
        autogenerated_comment: Option<bool>,

        #[command(flatten)]
        flags: CompileFlags,
    },

    /// Compile an OpenAPI document and report every problem found
    Validate {
        /// Path or URL of the OpenAPI document
        #[arg(short, long)]
        input: Option<String>,

        #[command(flatten)]
        flags: CompileFlags,
    },

    /// Summarize the compiled protobuf file
    Inspect {
        /// Path or URL of the OpenAPI document
        #[arg(short, long)]
        input: Option<String>,

        /// Output format
        #[arg(long, default_value = "yaml")]
        format: InspectFormat,

        #[command(flatten)]
        flags: CompileFlags,
    },

    /// Initialize a new o2p configuration
    Init {
        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Compiler switches; each one overrides the config file when given.
/// Toggles take an optional value, so `--skip-rpcs=false` turns off a
/// switch the config file enables.
#[derive(Args, Default)]
struct CompileFlags {
    /// Add google.api.http bindings to RPCs
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    annotate: Option<bool>,

    /// Prefix for fields renamed because of allOf collisions
    #[arg(long)]
    allof_prefix: Option<String>,

    /// Emit messages and enums only
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    skip_rpcs: Option<bool>,

    /// Leave deprecated operations out
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    skip_deprecated_rpcs: Option<bool>,

    /// Prefix enum labels with the enum name
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    namespace_enums: Option<bool>,

    /// Use google.protobuf wrappers for optional primitives
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    wrap_primitives: Option<bool>,

    /// Protobuf package name
    #[arg(long)]
    package: Option<String>,

    /// How RPCs are grouped into services
    #[arg(long)]
    service_grouping: Option<Grouping>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Grouping {
    Document,
    Tag,
}

#[derive(Clone, ValueEnum)]
enum InspectFormat {
    Yaml,
    Json,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            input,
            output,
            field_numbers,
            strict,
            autogenerated_comment,
            flags,
        } => {
            let mut cfg = resolve_config(input, &flags)?;
            if let Some(output) = output {
                cfg.output = output.display().to_string();
            }
            if let Some(path) = field_numbers {
                cfg.field_numbers = Some(path.display().to_string());
            }
            if let Some(enabled) = autogenerated_comment {
                cfg.emitter.autogenerated_comment = enabled;
            }
            cmd_generate(&cfg, strict)
        }

        Commands::Validate { input, flags } => cmd_validate(&resolve_config(input, &flags)?),

        Commands::Inspect {
            input,
            format,
            flags,
        } => cmd_inspect(&resolve_config(input, &flags)?, format),

        Commands::Init { force } => cmd_init(force),

        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            clap_complete::generate(shell, &mut cmd, "o2p", &mut std::io::stdout());
            Ok(())
        }
    }
}

/// Try to load the project config file from the current directory.
fn try_load_config() -> Result<Option<ProjectConfig>> {
    let config_path = PathBuf::from(CONFIG_FILE_NAME);
    config::load_config(&config_path).map_err(|e| anyhow::anyhow!(e))
}

/// The config file (or defaults) with command-line flags applied on top.
fn resolve_config(input: Option<String>, flags: &CompileFlags) -> Result<ProjectConfig> {
    let mut cfg = try_load_config()?.unwrap_or_default();
    if let Some(input) = input {
        cfg.input = input;
    }
    apply_flags(&mut cfg, flags);
    Ok(cfg)
}

fn apply_flags(cfg: &mut ProjectConfig, flags: &CompileFlags) {
    let options = &mut cfg.compiler;
    let toggles = [
        (&mut options.annotate, flags.annotate),
        (&mut options.skip_rpcs, flags.skip_rpcs),
        (&mut options.skip_deprecated_rpcs, flags.skip_deprecated_rpcs),
        (&mut options.namespace_enums, flags.namespace_enums),
        (&mut options.wrap_primitives, flags.wrap_primitives),
    ];
    for (setting, flag) in toggles {
        if let Some(enabled) = flag {
            *setting = enabled;
        }
    }
    if let Some(prefix) = &flags.allof_prefix {
        options.allof_prefix = prefix.clone();
    }
    if let Some(package) = &flags.package {
        options.package = Some(package.clone());
    }
    if let Some(grouping) = flags.service_grouping {
        options.service_grouping = match grouping {
            Grouping::Document => ServiceGrouping::Document,
            Grouping::Tag => ServiceGrouping::Tag,
        };
    }
}

fn read_field_numbers(path: &Path) -> Result<Option<FieldNumberMap>> {
    if !path.exists() {
        return Ok(None);
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let map = serde_yaml_ng::from_str(&content)
        .with_context(|| format!("failed to parse field numbers in {}", path.display()))?;
    Ok(Some(map))
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))?;
    eprintln!("  wrote {}", path.display());
    Ok(())
}

fn compile_input(cfg: &ProjectConfig, previous: Option<&FieldNumberMap>) -> Result<Compilation> {
    let documents = Loader::new().load(&cfg.input)?;
    log::info!(
        "loaded {} document(s) starting at {}",
        documents.len(),
        documents.root_uri()
    );
    compile(&documents, &cfg.compiler, previous)
        .with_context(|| format!("failed to compile {}", cfg.input))
}

fn report_issues(compilation: &Compilation) {
    for issue in &compilation.issues {
        eprintln!("  warning: {issue}");
    }
}

fn cmd_generate(cfg: &ProjectConfig, strict: bool) -> Result<()> {
    let lock = cfg.field_numbers.as_ref().map(PathBuf::from);
    let previous = match &lock {
        Some(path) => read_field_numbers(path)?,
        None => None,
    };

    eprintln!("Compiling {} → {}", cfg.input, cfg.output);
    let compilation = compile_input(cfg, previous.as_ref())?;
    report_issues(&compilation);
    let file = if strict {
        compilation.into_strict()?
    } else {
        compilation.file
    };

    let text = render_proto(&file, &cfg.emitter)?;
    write_file(Path::new(&cfg.output), &text)?;

    if let Some(path) = lock {
        let numbers = match &previous {
            Some(previous) => previous.merged(&file.field_numbers()),
            None => file.field_numbers(),
        };
        write_file(&path, &serde_yaml_ng::to_string(&numbers)?)?;
    }

    eprintln!(
        "Generated {} message(s), {} enum(s), {} service(s)",
        file.messages.len(),
        file.enums.len(),
        file.services.len()
    );
    Ok(())
}

fn cmd_validate(cfg: &ProjectConfig) -> Result<()> {
    let compilation = compile_input(cfg, None)?;
    let file = &compilation.file;
    eprintln!("Compiled {} into package {}", cfg.input, file.package);
    eprintln!("  Messages: {}", file.messages.len());
    eprintln!("  Enums: {}", file.enums.len());
    eprintln!(
        "  RPCs: {}",
        file.services.iter().map(|s| s.rpcs.len()).sum::<usize>()
    );

    if compilation.is_clean() {
        eprintln!("Validation successful.");
        return Ok(());
    }
    report_issues(&compilation);
    anyhow::bail!(
        "{} schema(s) or operation(s) cannot be expressed in protobuf",
        compilation.issues.len()
    )
}

fn cmd_inspect(cfg: &ProjectConfig, format: InspectFormat) -> Result<()> {
    let compilation = compile_input(cfg, None)?;
    let summary = build_inspect_summary(&compilation);

    match format {
        InspectFormat::Yaml => {
            let yaml = serde_yaml_ng::to_string(&summary)?;
            print!("{}", yaml);
        }
        InspectFormat::Json => {
            let json = serde_json::to_string_pretty(&summary)?;
            println!("{}", json);
        }
    }

    Ok(())
}

fn build_inspect_summary(compilation: &Compilation) -> serde_json::Value {
    let file: &ProtoFile = &compilation.file;
    let enums: Vec<serde_json::Value> = file
        .enums
        .iter()
        .map(|e| {
            serde_json::json!({
                "name": e.name,
                "values": e.values.iter().map(|v| &v.label).collect::<Vec<_>>(),
            })
        })
        .collect();

    let messages: Vec<serde_json::Value> = file
        .messages
        .iter()
        .map(|m| {
            serde_json::json!({
                "name": m.name,
                "fields": m.fields.iter().map(|f| {
                    serde_json::json!({
                        "name": f.name,
                        "type": f.field_type.type_name(),
                        "number": f.number,
                        "repeated": f.is_repeated(),
                    })
                }).collect::<Vec<_>>(),
                "nested": m.messages.iter().map(|n| &n.name).collect::<Vec<_>>(),
                "reserved": m.reserved,
            })
        })
        .collect();

    let services: Vec<serde_json::Value> = file
        .services
        .iter()
        .map(|s| {
            serde_json::json!({
                "name": s.name,
                "rpcs": s.rpcs.iter().map(|r| {
                    serde_json::json!({
                        "name": r.name,
                        "input": r.input,
                        "output": r.output,
                        "http": r.http.as_ref().map(|h| format!("{} {}", h.method.as_str(), h.path)),
                    })
                }).collect::<Vec<_>>(),
            })
        })
        .collect();

    serde_json::json!({
        "package": file.package,
        "imports": file.imports,
        "enums": enums,
        "messages": messages,
        "services": services,
        "issues": compilation.issues.iter().map(ToString::to_string).collect::<Vec<_>>(),
    })
}

fn cmd_init(force: bool) -> Result<()> {
    let config_path = PathBuf::from(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::write(&config_path, config::default_config_content())?;
    eprintln!("Created {}", config_path.display());
    Ok(())
}

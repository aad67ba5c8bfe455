//! convergdb CLI
//!
//! Reads a deployment document, runs resolve, validate, and structure over
//! the node tree, and emits the resulting IR as JSON.

#![warn(missing_docs)]
#![warn(clippy::all)]

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use convergdb_ir::{EnvPolicy, EnvironmentInterpolator, LayeredEnv, MapEnv, ProcessEnv};
use convergdb_schema::{build_tree, generate_ir, parse_description};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "convergdb")]
#[command(version, about = "convergdb - resolve and validate deployment IR", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Namespace prefix environment references must carry
    #[arg(long, global = true, default_value = convergdb_ir::env::DEFAULT_PREFIX)]
    env_prefix: String,

    /// Extra variable binding, KEY=VALUE (repeatable); shadows the process environment
    #[arg(long = "env", global = true, value_parser = parse_binding)]
    bindings: Vec<(String, String)>,

    /// Log level when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve, validate, and structure a deployment; print the IR
    Generate {
        /// Path to deployment document
        #[arg(short, long)]
        file: PathBuf,
        /// Write the IR here instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Pretty-print the IR
        #[arg(long)]
        pretty: bool,
    },
    /// Resolve and validate a deployment without emitting anything
    Check {
        /// Path to deployment document
        #[arg(short, long)]
        file: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

fn parse_binding(s: &str) -> std::result::Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got {s}")),
    }
}

fn init_tracing(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("convergdb={level}")));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

impl Cli {
    fn interpolator(&self) -> EnvironmentInterpolator {
        let policy = EnvPolicy::new().with_prefix(self.env_prefix.clone());
        if self.bindings.is_empty() {
            return EnvironmentInterpolator::new(policy, ProcessEnv);
        }
        let overrides: MapEnv = self.bindings.iter().cloned().collect();
        EnvironmentInterpolator::new(policy, LayeredEnv::new(overrides, ProcessEnv))
    }
}

fn read_document(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).wrap_err_with(|| format!("failed to read {}", path.display()))
}

fn generate(file: &Path, out: Option<&Path>, pretty: bool, env: &EnvironmentInterpolator) -> Result<()> {
    let document = read_document(file)?;
    let ir = generate_ir(&document, env)
        .wrap_err_with(|| format!("generation failed for {}", file.display()))?;
    let rendered = if pretty {
        serde_json::to_string_pretty(&ir)?
    } else {
        serde_json::to_string(&ir)?
    };
    match out {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .wrap_err_with(|| format!("failed to create {}", parent.display()))?;
            }
            std::fs::write(path, rendered)
                .wrap_err_with(|| format!("failed to write {}", path.display()))?;
            tracing::info!(out = %path.display(), "wrote IR");
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

fn check(file: &Path, env: &EnvironmentInterpolator) -> Result<()> {
    let document = read_document(file)?;
    let desc = parse_description(&document)
        .wrap_err_with(|| format!("generation failed for {}", file.display()))?;
    let tree = build_tree(&desc)?;
    let nodes = tree.node_count();
    tree.resolve(env)
        .and_then(|tree| tree.validate())
        .wrap_err_with(|| format!("generation failed for {}", file.display()))?;
    println!("{}: ok ({} nodes)", file.display(), nodes);
    Ok(())
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_format);
    let env = cli.interpolator();

    match &cli.command {
        Commands::Generate { file, out, pretty } => generate(file, out.as_deref(), *pretty, &env),
        Commands::Check { file } => check(file, &env),
    }
}

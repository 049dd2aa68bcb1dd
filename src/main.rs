use anyhow::{Context, Result};
use clap::Parser;
use std::io;
use std::path::PathBuf;

use yamlrelay::config::Config;
use yamlrelay::engine::ReplacementEngine;
use yamlrelay::file::loader::{load_documents, load_documents_from_stdin, load_function_config};
use yamlrelay::file::saver::{save_documents, write_documents};

/// YAMLRelay - propagate fields between YAML resource documents
#[derive(Parser)]
#[command(name = "yamlrelay")]
#[command(version)]
#[command(about = "Propagate fields between YAML resource documents with jq-style expressions", long_about = None)]
struct Cli {
    /// Function config holding the replacement rules
    #[arg(short, long, value_name = "FILE")]
    config: PathBuf,

    /// YAML stream to transform (omit or use '-' to read from stdin)
    input: Option<PathBuf>,

    /// Write the result here instead of stdout
    #[arg(short, long, value_name = "FILE", conflicts_with = "in_place")]
    output: Option<PathBuf>,

    /// Rewrite INPUT in place
    #[arg(long, requires = "input")]
    in_place: bool,

    /// Namespace assumed for resources that declare none
    #[arg(long, value_name = "NAMESPACE")]
    default_namespace: Option<String>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    /// The input file, or `None` for stdin.
    fn input_path(&self) -> Option<&PathBuf> {
        self.input
            .as_ref()
            .filter(|path| path.as_os_str() != "-")
    }
}

/// Logs go to stderr so stdout stays a clean YAML stream.
fn init_logging(verbose: u8, settings: &Config) {
    let mut builder = if verbose > 0 {
        let level = match verbose {
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        };
        let mut builder = env_logger::Builder::new();
        builder.filter_level(level);
        builder
    } else if std::env::var_os("RUST_LOG").is_some() {
        env_logger::Builder::from_default_env()
    } else {
        let mut builder = env_logger::Builder::new();
        builder.filter_level(settings.level_filter());
        builder
    };
    builder.target(env_logger::Target::Stderr).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Config::load();
    init_logging(cli.verbose, &settings);

    if cli.in_place && cli.input_path().is_none() {
        anyhow::bail!("--in-place needs an input file, not stdin");
    }

    let function_config = load_function_config(&cli.config)?;

    let mut documents = match cli.input_path() {
        Some(path) => load_documents(path)?,
        None => load_documents_from_stdin()?,
    };

    let namespace = cli
        .default_namespace
        .as_deref()
        .unwrap_or(settings.default_namespace.as_str());
    let engine = ReplacementEngine::new().default_namespace(namespace);
    let summary = engine
        .apply_in_place(&mut documents, function_config.replacements())
        .context("Failed to apply replacements")?;

    log::info!(
        "{} rules applied, {} skipped, {} rewrites across {} documents",
        summary.rules_applied,
        summary.rules_skipped,
        summary.rewrites,
        documents.len()
    );

    match (&cli.output, cli.input_path()) {
        (Some(output), _) => save_documents(output, &documents, false)?,
        (None, Some(input)) if cli.in_place => {
            save_documents(input, &documents, settings.create_backup)?
        }
        _ => write_documents(io::stdout().lock(), &documents)?,
    }

    Ok(())
}

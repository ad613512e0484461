//! Binary entry point for sidecar-debug.
//!
//! Every command prints JSON to stdout; logs go to stderr or the configured
//! log file.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow needless_pass_by_value for command functions
#![allow(clippy::needless_pass_by_value)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::{Value, json};
use sidecar_debug::io::submission_from_parts;
use sidecar_debug::observability::{self, LoggingConfig};
use sidecar_debug::{DebugKnowledgeBase, RecordId, SearchQuery, SidecarConfig};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Sidecar Debug - a project-scoped knowledge base of debug experiences.
#[derive(Parser)]
#[command(name = "sidecar-debug")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true, env = "SIDECAR_CONFIG_PATH")]
    config: Option<PathBuf>,

    /// Project directory whose knowledge base is used.
    #[arg(short, long, global = true)]
    project: Option<PathBuf>,

    /// Store records under the user config directory.
    #[arg(long, global = true)]
    global: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Record a debug experience.
    Record {
        /// Read the submission as JSON from a file, or `-` for stdin.
        #[arg(long, value_name = "FILE")]
        json: Option<PathBuf>,

        /// Error type, e.g. `ImportError`.
        #[arg(long)]
        error_type: Option<String>,

        /// Error message.
        #[arg(short, long)]
        message: Option<String>,

        /// Source file where the error occurred.
        #[arg(long)]
        file: Option<String>,

        /// Line number where the error occurred.
        #[arg(long)]
        line: Option<u32>,

        /// Root cause.
        #[arg(long)]
        cause: Option<String>,

        /// The fix that worked.
        #[arg(long)]
        solution: Option<String>,

        /// Comma-separated tags.
        #[arg(short, long)]
        tags: Option<String>,
    },

    /// Search for similar past errors.
    Search {
        /// Error message or description.
        query: String,

        /// Maximum number of results.
        #[arg(short, long)]
        limit: Option<usize>,

        /// Only records whose error type contains this.
        #[arg(long)]
        error_type: Option<String>,

        /// Only records with this tag (repeatable).
        #[arg(short, long)]
        tag: Vec<String>,
    },

    /// Search for errors like a given one, restricted to its error type.
    Similar {
        /// Error type.
        error_type: String,

        /// Error message.
        message: String,

        /// Maximum number of results.
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show a record by id.
    Get {
        /// Record id.
        id: String,
    },

    /// List the most recent records.
    List {
        /// Number of entries.
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// List records carrying a tag.
    ByTag {
        /// Tag to look up.
        tag: String,
    },

    /// List records with an error type.
    ByType {
        /// Error type to look up.
        error_type: String,
    },

    /// List every known tag.
    Tags,

    /// Rebuild the whole index from the record files.
    Rebuild,

    /// Rebuild only the keyword index.
    RebuildKeywords,

    /// Drop the keyword index to shrink the index file.
    Compact,

    /// Delete every record and reset the index.
    Clear {
        /// Confirm deletion.
        #[arg(long)]
        yes: bool,
    },

    /// Show index statistics.
    Stats,
}

/// Main entry point.
fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e:#}");
            return ExitCode::FAILURE;
        },
    };

    let logging = LoggingConfig::from_settings(Some(&config.logging), cli.verbose);
    if let Err(e) = observability::init(&logging) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match run_command(cli.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        },
    }
}

/// Loads configuration: file, then environment, then CLI flags.
fn load_config(cli: &Cli) -> Result<SidecarConfig> {
    let mut config = match &cli.config {
        Some(path) => SidecarConfig::load_from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => SidecarConfig::load_default(),
    }
    .with_env_overrides();

    if let Some(project) = &cli.project {
        config = config.with_project_dir(project);
    }
    if cli.global {
        config = config.with_global_storage(true);
    }
    Ok(config)
}

/// Runs the selected command.
fn run_command(command: Commands, config: &SidecarConfig) -> Result<()> {
    let mut kb = DebugKnowledgeBase::open_with(config.path_manager());

    match command {
        Commands::Record {
            json,
            error_type,
            message,
            file,
            line,
            cause,
            solution,
            tags,
        } => {
            let context = match json {
                Some(source) => read_json(&source)?,
                None => json!({
                    "error_type": error_type,
                    "error_message": message,
                    "file": file,
                    "line": line,
                }),
            };
            let submission = submission_from_parts(context, cause, solution, tags.map(|t| split_tags(&t)))?;
            let id = kb.record(submission)?;
            print_json(&json!({ "status": "success", "record_id": id }))
        },

        Commands::Search {
            query,
            limit,
            error_type,
            tag,
        } => {
            let mut search = SearchQuery::new(query).with_limit(config.clamp_limit(limit));
            if let Some(error_type) = error_type {
                search = search.with_error_type(error_type);
            }
            for tag in tag {
                search = search.with_tag(tag);
            }
            print_json(&kb.search(&search)?)
        },

        Commands::Similar {
            error_type,
            message,
            limit,
        } => print_json(&kb.search_similar_errors(&error_type, &message, config.clamp_limit(limit))?),

        Commands::Get { id } => match kb.get_record(&RecordId::new(id.as_str())) {
            Some(record) => print_json(&record),
            None => bail!("record not found: {id}"),
        },

        Commands::List { limit } => print_json(&kb.list_records(limit)),

        Commands::ByTag { tag } => print_json(&kb.search_by_tag(&tag)),

        Commands::ByType { error_type } => print_json(&kb.search_by_error_type(&error_type)),

        Commands::Tags => print_json(&kb.all_tags()),

        Commands::Rebuild => print_json(&kb.rebuild_index()?),

        Commands::RebuildKeywords => {
            let associations = kb.rebuild_keywords()?;
            print_json(&json!({ "keywords": associations }))
        },

        Commands::Compact => print_json(&kb.compact_index()?),

        Commands::Clear { yes } => {
            if !yes {
                bail!("refusing to delete {} records without --yes", kb.record_count());
            }
            let removed = kb.clear_all()?;
            print_json(&json!({ "status": "success", "removed": removed }))
        },

        Commands::Stats => print_json(&json!({
            "storage_dir": kb.paths().storage_dir(),
            "index": kb.stats(),
        })),
    }
}

/// Reads a JSON submission from a file, or stdin when the path is `-`.
fn read_json(source: &Path) -> Result<Value> {
    let text = if source == Path::new("-") {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("reading submission from stdin")?;
        buffer
    } else {
        std::fs::read_to_string(source).with_context(|| format!("reading {}", source.display()))?
    };
    serde_json::from_str(&text).context("parsing submission JSON")
}

fn split_tags(tags: &str) -> Vec<String> {
    tags.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

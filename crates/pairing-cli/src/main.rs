mod cmd;
mod oracle;
mod output;
mod root;

use anyhow::Context;
use clap::{Parser, Subcommand};
use cmd::config::ConfigSubcommand;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Parser)]
#[command(
    name = "pairing",
    about = "Pair mentees with mentors in capacity-bounded batches judged by an LLM",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .pairing/ or .git/)
    #[arg(long, global = true, env = "PAIRING_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create .pairing/config.yaml in the project root
    Init,

    /// Enrich, batch and match the whole population, then write the results
    Run {
        /// Population file (default: `input` from config)
        #[arg(long)]
        input: Option<PathBuf>,
        /// Results file (default: `output` from config)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Enrich the population through the directory and write it out
    Enrich {
        /// Population file (default: `input` from config)
        #[arg(long)]
        input: Option<PathBuf>,
        /// Where to write the enriched population (.json, .yaml or .yml)
        #[arg(long)]
        out: PathBuf,
    },

    /// Preview the first batch without calling the oracle
    Plan {
        /// Population file (default: `input` from config)
        #[arg(long)]
        input: Option<PathBuf>,
    },

    /// Show or validate the project configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Run { .. } | Commands::Enrich { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };
    if let Err(e) = init_logging(default_level, cli.log_file.as_deref()) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root),
        Commands::Run { input, output } => cmd::run::run(&root, input, output, cli.json),
        Commands::Enrich { input, out } => cmd::enrich::run(&root, input, &out, cli.json),
        Commands::Plan { input } => cmd::plan::run(&root, input, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn init_logging(default_level: tracing::Level, log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter =
        tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    match log_file {
        Some(path) => {
            let file = File::options()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}

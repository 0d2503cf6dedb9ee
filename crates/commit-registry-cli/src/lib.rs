//! commitreg - command-line interface for the commitment registry
//!
//! The CLI keeps registry state in a JSON file between invocations and provides:
//! - Client helpers to seal commitments, derive accounts and sign authorizations
//! - Commit and commit-from submissions with explicit or wall-clock time hints
//! - Lookup, reveal, removal and listing of stored records
//! - The published event log and interface introspection

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use commit_registry::RegistryConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod error;
mod output;
mod state;

use commands::{keys, registry};
pub use error::{CliError, CliResult};
pub use output::print_error;

/// commitreg CLI application
#[derive(Parser)]
#[command(name = "commitreg")]
#[command(about = "Commitment registry CLI", long_about = None)]
#[command(version)]
struct Cli {
    /// Registry configuration file (TOML)
    #[arg(short, long, env = "COMMITREG_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Registry state file (JSON)
    #[arg(
        short,
        long,
        env = "COMMITREG_STATE",
        default_value = "commitreg-state.json",
        global = true
    )]
    state: PathBuf,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table", global = true)]
    output: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Keys(keys::KeyCommands),

    #[command(flatten)]
    Registry(registry::RegistryCommands),
}

/// Resolved global options shared by registry commands.
pub(crate) struct Context {
    pub config: RegistryConfig,
    pub state: PathBuf,
    pub format: output::OutputFormat,
}

impl Context {
    pub fn open(&self) -> CliResult<state::Session> {
        state::Session::open(&self.state, self.config.clone())
    }
}

/// Run using the current process arguments.
pub fn run() -> CliResult<()> {
    run_with_args(std::env::args_os())
}

/// Run using the provided argument iterator.
pub fn run_with_args<I, T>(args: I) -> CliResult<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .try_init();

    let config = match &cli.config {
        Some(path) => RegistryConfig::load(path)?,
        None => RegistryConfig::default(),
    };

    match cli.command {
        Commands::Keys(command) => keys::execute(command, cli.output),
        Commands::Registry(command) => {
            let ctx = Context {
                config,
                state: cli.state,
                format: cli.output,
            };
            registry::execute(command, &ctx)
        }
    }
}

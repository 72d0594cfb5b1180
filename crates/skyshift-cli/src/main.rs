mod commands;
mod summary;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use skyshift_core::config::BackendPreference;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, ValueEnum)]
pub enum BackendArg {
    Auto,
    Cpu,
    Accelerated,
}

impl From<BackendArg> for BackendPreference {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Auto => BackendPreference::Auto,
            BackendArg::Cpu => BackendPreference::Cpu,
            BackendArg::Accelerated => BackendPreference::Accelerated,
        }
    }
}

#[derive(Parser)]
#[command(name = "skyshift", about = "Frame-to-frame translation by phase correlation")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// TOML correlation config (defaults apply when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the configured backend
    #[arg(short, long, global = true, value_enum)]
    backend: Option<BackendArg>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Shift of one image relative to another
    Correlate(commands::correlate::CorrelateArgs),
    /// Shifts between consecutive frames of a sequence
    Track(commands::track::TrackArgs),
    /// Print or save the default correlation config
    Config(commands::config::ConfigArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let options = commands::GlobalOptions {
        config: cli.config,
        backend: cli.backend.map(BackendPreference::from),
    };

    match &cli.command {
        Commands::Correlate(args) => commands::correlate::run(args, &options),
        Commands::Track(args) => commands::track::run(args, &options),
        Commands::Config(args) => commands::config::run(args),
    }
}

//! volition CLI.
//!
//! Single binary with one job: `volition test` compiles and runs the
//! built-in scenario suite against the real runtime. Exit code 0 when every
//! scenario passes, non-zero otherwise.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod scenarios;

#[derive(Parser)]
#[command(name = "volition")]
#[command(about = "Decision-and-action runtime for game-like agents", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the built-in scenario suite
    Test,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Log level comes from RUST_LOG; scenarios report at info.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_target(false).init();

    volition::core::init_pool();

    match cli.command {
        Commands::Test => scenarios::run_all(),
    }
}

mod args;
mod commands;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::args::{Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Set up tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init()
        .ok();

    let cli = Cli::parse();

    match cli.command {
        Command::Analyze(args) => commands::analyze(args).await,
        Command::Match(args) => commands::match_keywords(&args),
        Command::Aggregate(args) => commands::aggregate(&args),
        Command::Generate(args) => commands::generate(args).await,
    }
}

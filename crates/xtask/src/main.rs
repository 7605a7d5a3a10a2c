mod inspect;
mod replay;

use clap::{Parser, Subcommand};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "xtask")]
#[command(about = "Project automation tasks")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Translate a captured stream-json transcript into SSE frames.
    Replay(replay::Args),
    /// Summarize the envelopes in a captured stream-json transcript.
    Inspect(inspect::Args),
}

#[derive(Debug, Error)]
enum Error {
    #[error(transparent)]
    Replay(#[from] replay::Error),
    #[error(transparent)]
    Inspect(#[from] inspect::Error),
}

fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Replay(args) => replay::run(args)?,
        Command::Inspect(args) => inspect::run(args)?,
    }
    Ok(())
}

//! Binforge CLI - multi-toolchain library build pipeline
//!
//! Entry point for the binforge command-line application.

use anyhow::Result;
use clap::Parser;

use binforge::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // -v raises the log level, -q silences everything below error
    let default_level = if cli.quiet {
        tracing::Level::ERROR
    } else {
        match cli.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            _ => tracing::Level::DEBUG,
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .init();

    match cli.run().await {
        Ok(()) => Ok(()),
        Err(e) => {
            eprintln!("✗ {e:#}");
            std::process::exit(1);
        }
    }
}

// SPDX-License-Identifier: GPL-3.0-only

use clap::Parser;
use photobooth::booth::{self, RunOptions};
use photobooth::config::Config;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "photobooth")]
#[command(about = "Unattended photo-booth kiosk")]
#[command(version)]
struct Cli {
    /// Run the button/light diagnostic instead of the welcome flow
    #[arg(long)]
    test_buttons: bool,

    /// Stay in the current terminal screen instead of fullscreen
    #[arg(long)]
    windowed: bool,

    /// Path to a JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=photobooth=debug, RUST_LOG=info
    // Logs go to stderr so they never corrupt the kiosk display
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref());

    booth::run(
        config,
        RunOptions {
            test_buttons: cli.test_buttons,
            windowed: cli.windowed,
        },
    )?;
    Ok(())
}

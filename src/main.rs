#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

use anyhow::Result;
use clap::{Parser, Subcommand};

mod channels;
mod config;
mod dialog;
mod faq;
mod logging;
mod pricing;
mod rates;

use config::Config;

/// Telegram storefront assistant: shipping cost calculator and order ticket intake.
#[derive(Parser, Debug)]
#[command(name = "parcel-bot")]
#[command(version = "0.1.0")]
#[command(about = "Shipping calculator and ticket intake over Telegram.", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the bot and listen for updates (default)
    Start,
    /// Check Bot API connectivity with the configured token
    Doctor,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;
    logging::init(&config.log_level);

    match cli.command.unwrap_or(Commands::Start) {
        Commands::Start => channels::start(config).await,
        Commands::Doctor => channels::doctor(&config).await,
    }
}

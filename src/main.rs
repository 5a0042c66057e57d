use clap::{CommandFactory, FromArgMatches, Parser};
use std::sync::Arc;

mod cli;
mod config;
mod core;
mod error;
mod services;
mod utils;

use config::Config;
use error::{DdgsError, Result};
use services::SimpleServices;

#[derive(Parser)]
#[command(name = "ddgs")]
#[command(about = "DuckDuckGo search from the terminal: text, images, news and AI chat")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Config file path (optional)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let registry = cli::build_registry();
    let matches = registry.augment(Cli::command()).get_matches();
    let cli = Cli::from_arg_matches(&matches).map_err(|e| DdgsError::Validation(e.to_string()))?;

    // Initialize logging
    utils::logging::init_logging(cli.verbose).map_err(DdgsError::Internal)?;

    // Load configuration
    let config = Config::load(cli.config.as_deref())?;

    // Initialize services
    let services = Arc::new(SimpleServices::new(config));

    registry.dispatch(&matches, services).await.map_err(|e| match e.downcast::<DdgsError>() {
        Ok(e) => e,
        Err(e) => DdgsError::Internal(e),
    })
}

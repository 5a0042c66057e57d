use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use crate::cli::arguments::{ArgumentBundle, Arguments};
use crate::cli::options::CommandSpec;
use crate::cli::registry::{handler, RegisteredCommand};
use crate::core::services::{SearchClient, TextQuery};
use crate::services::SimpleServices;
use crate::utils::output::{write_records, OutputFormat};
use crate::utils::progress::{ProgressMessages, ProgressUtils};

pub const NAME: &str = "text";

pub fn spec() -> CommandSpec {
    CommandSpec::new(NAME, "CLI function to perform a text search using DuckDuckGo API")
        .settings(super::settings())
        .option(super::keywords())
        .option(super::region())
        .option(super::safesearch())
        .option(super::timelimit(&["d", "w", "m", "y"]))
        .option(super::max_results())
        .option(super::output())
        .option(super::proxy())
}

pub fn command() -> RegisteredCommand {
    RegisteredCommand::new(spec(), handler(execute))
}

pub async fn execute(arguments: Arguments, services: Arc<SimpleServices>) -> Result<()> {
    let bundle = ArgumentBundle::for_operation(&arguments, TextQuery::PARAMETERS);
    let query: TextQuery = bundle.service().deserialize()?;
    let original = bundle.original();

    let client = services.create_search_client(original.str("proxy")?)?;
    let spinner = ProgressUtils::create_activity_spinner(ProgressMessages::SEARCHING);
    let results = client.text(&query).await;
    spinner.finish_and_clear();
    let results = results?;

    info!("Found {} results for '{}'", results.len(), query.keywords);
    write_records(
        &results,
        OutputFormat::parse(original.str("output")?),
        &mut std::io::stdout(),
    )
}

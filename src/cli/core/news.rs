use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use crate::cli::arguments::{ArgumentBundle, Arguments};
use crate::cli::options::CommandSpec;
use crate::cli::registry::{handler, RegisteredCommand};
use crate::core::services::{NewsQuery, SearchClient};
use crate::services::SimpleServices;
use crate::utils::output::{write_records, OutputFormat};
use crate::utils::progress::{ProgressMessages, ProgressUtils};

pub const NAME: &str = "news";

pub fn spec() -> CommandSpec {
    CommandSpec::new(NAME, "CLI function to perform a news search using DuckDuckGo API")
        .settings(super::settings())
        .option(super::keywords())
        .option(super::region())
        .option(super::safesearch())
        .option(super::timelimit(&["d", "w", "m"]))
        .option(super::max_results())
        .option(super::output())
        .option(super::proxy())
}

pub fn command() -> RegisteredCommand {
    RegisteredCommand::new(spec(), handler(execute))
}

pub async fn execute(arguments: Arguments, services: Arc<SimpleServices>) -> Result<()> {
    let bundle = ArgumentBundle::for_operation(&arguments, NewsQuery::PARAMETERS);
    let query: NewsQuery = bundle.service().deserialize()?;
    let original = bundle.original();

    let client = services.create_search_client(original.str("proxy")?)?;
    let spinner = ProgressUtils::create_activity_spinner(ProgressMessages::SEARCHING);
    let results = client.news(&query).await;
    spinner.finish_and_clear();
    let results = results?;

    info!("Found {} news results for '{}'", results.len(), query.keywords);
    write_records(
        &results,
        OutputFormat::parse(original.str("output")?),
        &mut std::io::stdout(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_news_timelimit_has_no_year() {
        let spec = spec();
        let cmd = spec.to_command();
        assert!(cmd.clone().try_get_matches_from(["news", "-k", "rust", "-t", "m"]).is_ok());
        assert!(cmd.try_get_matches_from(["news", "-k", "rust", "-t", "y"]).is_err());
    }
}

use anyhow::Result;
use std::sync::Arc;

use crate::cli::arguments::Arguments;
use crate::cli::core::chat::run_session;
use crate::cli::inherit::CustomCommand;
use crate::cli::options::OptionSpec;
use crate::cli::registry::handler;
use crate::core::infrastructure::ChatCache;
use crate::services::SimpleServices;

pub const NAME: &str = "mychat";

pub fn custom() -> CustomCommand {
    CustomCommand::new("Interactive AI chat with an optional conversation file", handler(execute)).option(
        OptionSpec::path("cache-file").help("json file to resume the conversation from and save it to"),
    )
}

pub async fn execute(arguments: Arguments, services: Arc<SimpleServices>) -> Result<()> {
    let view = arguments.view();
    let cache = view.path("cache_file")?.map(ChatCache::new);
    let hydrate = cache.as_ref().is_some_and(ChatCache::exists);
    run_session(&services, view, cache, hydrate).await
}

use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::cli::arguments::{ArgumentView, Arguments};
use crate::cli::options::{CommandSpec, OptionSpec};
use crate::cli::registry::{handler, RegisteredCommand};
use crate::core::chat::{ChatSession, InputSource, LineInput, MultilineInput};
use crate::core::infrastructure::ChatCache;
use crate::core::services::ChatModel;
use crate::error::CommandError;
use crate::services::SimpleServices;

pub const NAME: &str = "chat";

/// Conversation file of the plain `chat` command, in the working directory
pub const DEFAULT_CACHE_FILE: &str = "ddgs_chat_conversation.json";

pub fn spec() -> CommandSpec {
    CommandSpec::new(NAME, "CLI function to perform an interactive AI chat using DuckDuckGo API")
        .settings(super::settings())
        .option(
            OptionSpec::flag("load")
                .short('l')
                .help("load the last conversation from the json cache"),
        )
        .option(super::proxy())
        .option(
            OptionSpec::flag("multiline")
                .alias("ml")
                .help("multi-line input ctrl+D to send"),
        )
        .option(
            OptionSpec::integer("timeout")
                .short('t')
                .help("timeout value for the HTTP client, default: 30"),
        )
        .option(
            OptionSpec::choice("model", &["1", "2", "3", "4"])
                .short('m')
                .default_value("1")
                .help("1=gpt-4o-mini, 2=claude-3-haiku, 3=llama-3.1-70b, 4=mixtral-8x7b"),
        )
}

pub fn command() -> RegisteredCommand {
    RegisteredCommand::new(spec(), handler(execute))
}

pub async fn execute(arguments: Arguments, services: Arc<SimpleServices>) -> Result<()> {
    let view = arguments.view();
    let hydrate = view.flag("load")?;
    let cache = ChatCache::new(PathBuf::from(DEFAULT_CACHE_FILE));
    run_session(&services, view, Some(cache), hydrate).await
}

pub fn selected_model(arguments: ArgumentView<'_>) -> Result<ChatModel, CommandError> {
    let raw = arguments.str("model")?.unwrap_or("1");
    raw.parse::<usize>()
        .ok()
        .and_then(ChatModel::from_index)
        .ok_or_else(|| CommandError::InvalidArgument {
            option: "model".to_string(),
            reason: format!("'{}' is not between 1 and {}", raw, ChatModel::ALL.len()),
        })
}

pub fn selected_timeout(services: &SimpleServices, arguments: ArgumentView<'_>) -> Result<Duration, CommandError> {
    match arguments.integer("timeout")? {
        Some(seconds) if seconds < 1 => Err(CommandError::InvalidArgument {
            option: "timeout".to_string(),
            reason: format!("must be at least 1 second, got {}", seconds),
        }),
        Some(seconds) => Ok(Duration::from_secs(seconds as u64)),
        None => Ok(Duration::from_secs(services.config().chat_timeout_seconds)),
    }
}

/// Interactive loop shared by the chat commands. With a cache the session
/// is persisted after every exchange and restored first when `hydrate` is set.
pub async fn run_session(
    services: &SimpleServices,
    arguments: ArgumentView<'_>,
    cache: Option<ChatCache>,
    hydrate: bool,
) -> Result<()> {
    let model = selected_model(arguments)?;
    let timeout = selected_timeout(services, arguments)?;
    let mut client = services.create_search_client(arguments.str("proxy")?)?;

    let mut input: Box<dyn InputSource> = if arguments.flag("multiline")? {
        Box::new(MultilineInput::stdin())
    } else {
        Box::new(LineInput::new()?)
    };

    let mut session = ChatSession::new(&mut client, model, timeout).with_cache(cache);
    if hydrate {
        session.hydrate()?;
    }

    info!("Chatting with {}", model.name());
    let exchanges = session.run(input.as_mut(), &mut std::io::stdout()).await?;
    info!("Chat ended after {} exchanges", exchanges);
    Ok(())
}

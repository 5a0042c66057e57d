//! Base search commands
//!
//! Each command declares its options once as a [`CommandSpec`]. Custom
//! commands built with [`crate::cli::inherit`] take those declarations over
//! unchanged.

pub mod chat;
pub mod images;
pub mod news;
pub mod text;

use crate::cli::options::{CommandSettings, OptionSpec};
use crate::cli::registry::CommandRegistry;
use crate::utils::output::OutputFormat;

pub const SAFESEARCH_CHOICES: [&str; 3] = ["on", "moderate", "off"];

pub(crate) fn settings() -> CommandSettings {
    CommandSettings {
        max_term_width: Some(120),
        ..CommandSettings::default()
    }
}

pub(crate) fn keywords() -> OptionSpec {
    OptionSpec::text("keywords").short('k').required().help("keywords for query")
}

pub(crate) fn region() -> OptionSpec {
    OptionSpec::text("region")
        .short('r')
        .default_value("wt-wt")
        .help("wt-wt, us-en, ru-ru, etc.")
}

pub(crate) fn safesearch() -> OptionSpec {
    OptionSpec::choice("safesearch", &SAFESEARCH_CHOICES)
        .short('s')
        .default_value("moderate")
}

pub(crate) fn timelimit(choices: &[&str]) -> OptionSpec {
    OptionSpec::choice("timelimit", choices)
        .short('t')
        .help("day, week, month, year")
}

pub(crate) fn max_results() -> OptionSpec {
    OptionSpec::integer("max_results").short('m').help("maximum number of results")
}

pub(crate) fn output() -> OptionSpec {
    OptionSpec::choice("output", &OutputFormat::CHOICES)
        .short('o')
        .default_value("print")
        .help("print results or dump them as json")
}

pub(crate) fn proxy() -> OptionSpec {
    OptionSpec::text("proxy")
        .short('p')
        .help("the proxy to send requests, example: socks5://127.0.0.1:9150, \"tb\" for Tor Browser")
}

/// Register the base commands in listing order
pub fn register(registry: &mut CommandRegistry) {
    registry.register(text::command());
    registry.register(images::command());
    registry.register(news::command());
    registry.register(chat::command());
}

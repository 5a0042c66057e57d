//! Option inheritance for custom commands
//!
//! A custom command takes over every option of an existing command, in the
//! existing command's declared order and with identical flags, types,
//! defaults and required-ness. Its behaviour comes from its own handler and
//! it may declare extra options that follow the inherited ones.

use tracing::{debug, warn};

use crate::cli::options::{CommandSpec, OptionSpec};
use crate::cli::registry::{CommandHandler, RegisteredCommand};

/// Behaviour and additional surface of a command built on top of another
pub struct CustomCommand {
    pub about: String,
    pub options: Vec<OptionSpec>,
    pub handler: CommandHandler,
}

impl CustomCommand {
    pub fn new(about: &str, handler: CommandHandler) -> Self {
        Self {
            about: about.to_string(),
            options: Vec::new(),
            handler,
        }
    }

    pub fn option(mut self, option: OptionSpec) -> Self {
        self.options.push(option);
        self
    }
}

/// Derive the option surface of `name` from `source`.
///
/// Inherited options are copied verbatim. An extra option whose name or
/// flags collide with an inherited one is dropped so the inherited surface
/// stays intact.
pub fn inherit_spec(source: &CommandSpec, name: &str, about: &str, extra: Vec<OptionSpec>) -> CommandSpec {
    let mut spec = CommandSpec::new(name, about).settings(source.settings.clone());
    spec.options = source.options.clone();

    for option in extra {
        if let Some(existing) = spec.options.iter().find(|existing| collides(existing, &option)) {
            warn!(
                "Option {} of '{}' collides with inherited {}; keeping the inherited one",
                option.flags().join("/"),
                name,
                existing.flags().join("/")
            );
            continue;
        }
        spec.options.push(option);
    }

    debug!(
        "Command '{}' inherits {} options from '{}' and adds {}",
        name,
        source.options.len(),
        source.name,
        spec.options.len() - source.options.len()
    );
    spec
}

/// Produce a new command with `source`'s options and `custom`'s behaviour.
/// The result still has to be registered with the dispatcher.
pub fn inherit_command(source: &CommandSpec, name: &str, custom: CustomCommand) -> RegisteredCommand {
    let spec = inherit_spec(source, name, &custom.about, custom.options);
    RegisteredCommand::new(spec, custom.handler)
}

fn collides(a: &OptionSpec, b: &OptionSpec) -> bool {
    if a.name == b.name {
        return true;
    }
    let flags = a.flags();
    b.flags().iter().any(|flag| flags.contains(flag))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::options::{CommandSettings, OptionKind};
    use crate::cli::registry::{handler, CommandRegistry};
    use crate::config::Config;
    use crate::services::SimpleServices;
    use serde_json::Value;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::Arc;

    fn source() -> CommandSpec {
        CommandSpec::new("images", "Search images")
            .settings(CommandSettings {
                max_term_width: Some(100),
                ..CommandSettings::default()
            })
            .option(OptionSpec::text("keywords").short('k').required())
            .option(OptionSpec::integer("count").default_value("5").help("how many"))
            .option(OptionSpec::choice("layout", &["Square", "Tall", "Wide"]))
            .option(OptionSpec::flag("download").short('d'))
            .option(OptionSpec::integer("threads").alias("th"))
    }

    #[test]
    fn test_inherited_options_match_source_exactly() {
        let source = source();
        let spec = inherit_spec(&source, "myimages", "Custom images", vec![]);

        assert_eq!(spec.name, "myimages");
        assert_eq!(spec.about, "Custom images");
        assert_eq!(spec.settings, source.settings);
        assert_eq!(spec.options, source.options);

        let source_flags: Vec<_> = source.options.iter().map(OptionSpec::flags).collect();
        let clap_ids: Vec<_> = spec
            .to_command()
            .get_arguments()
            .map(|arg| arg.get_id().as_str().to_string())
            .collect();
        assert_eq!(clap_ids, vec!["keywords", "count", "layout", "download", "threads"]);
        assert_eq!(
            spec.options.iter().map(OptionSpec::flags).collect::<Vec<_>>(),
            source_flags
        );
    }

    #[test]
    fn test_extra_options_follow_inherited_ones() {
        let spec = inherit_spec(
            &source(),
            "myimages",
            "",
            vec![
                OptionSpec::flag("del-duplicates"),
                OptionSpec::directory("folder").required(),
            ],
        );

        let names: Vec<_> = spec.options.iter().map(|option| option.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["keywords", "count", "layout", "download", "threads", "del_duplicates", "folder"]
        );
    }

    #[test]
    fn test_colliding_extra_option_is_dropped() {
        let spec = inherit_spec(
            &source(),
            "myimages",
            "",
            vec![
                OptionSpec::text("count"),
                OptionSpec::flag("dry-run").short('d'),
                OptionSpec::flag("quiet"),
            ],
        );

        assert_eq!(spec.options.len(), source().options.len() + 1);
        assert_eq!(spec.find("count").unwrap().kind, OptionKind::Integer);
        assert!(spec.find("dry_run").is_none());
        assert!(spec.find("quiet").is_some());
    }

    #[test]
    fn test_source_without_options() {
        let empty = CommandSpec::new("bare", "");
        let spec = inherit_spec(&empty, "custom", "", vec![]);
        assert!(spec.options.is_empty());
    }

    #[tokio::test]
    async fn test_omitted_option_supplies_source_default() {
        let seen = Rc::new(RefCell::new(Value::Null));
        let seen_in_handler = seen.clone();

        let custom = CustomCommand::new(
            "Wrapped",
            handler(move |arguments, _| {
                let seen = seen_in_handler.clone();
                async move {
                    *seen.borrow_mut() = arguments.view().get("count").cloned().unwrap_or(Value::Null);
                    Ok(())
                }
            }),
        );

        let mut registry = CommandRegistry::new();
        registry.register(inherit_command(&source(), "wrapped", custom));

        let matches = registry
            .augment(clap::Command::new("ddgs"))
            .try_get_matches_from(["ddgs", "wrapped", "-k", "owls"])
            .unwrap();
        registry
            .dispatch(&matches, Arc::new(SimpleServices::new(Config::default())))
            .await
            .unwrap();

        assert_eq!(*seen.borrow(), Value::from(5));
    }

    #[test]
    fn test_inherited_required_and_types_enforced() {
        let spec = inherit_spec(&source(), "wrapped", "", vec![]);
        let command = spec.to_command();

        assert!(command.clone().try_get_matches_from(["wrapped"]).is_err());
        assert!(command
            .clone()
            .try_get_matches_from(["wrapped", "-k", "x", "--count", "five"])
            .is_err());
        assert!(command
            .try_get_matches_from(["wrapped", "-k", "x", "--th", "3", "-d"])
            .is_ok());
    }
}

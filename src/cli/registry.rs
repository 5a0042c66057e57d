use anyhow::Result;
use clap::ArgMatches;
use futures::future::{FutureExt, LocalBoxFuture};
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

use crate::cli::arguments::Arguments;
use crate::cli::options::CommandSpec;
use crate::error::CommandError;
use crate::services::SimpleServices;

pub type CommandFuture = LocalBoxFuture<'static, Result<()>>;

/// Behaviour behind a command, called with the parsed keyword arguments
pub type CommandHandler = Box<dyn Fn(Arguments, Arc<SimpleServices>) -> CommandFuture>;

/// Wrap an async function as a command handler
pub fn handler<F, Fut>(f: F) -> CommandHandler
where
    F: Fn(Arguments, Arc<SimpleServices>) -> Fut + 'static,
    Fut: Future<Output = Result<()>> + 'static,
{
    Box::new(move |arguments, services| f(arguments, services).boxed_local())
}

pub struct RegisteredCommand {
    pub spec: CommandSpec,
    pub handler: CommandHandler,
}

impl RegisteredCommand {
    pub fn new(spec: CommandSpec, handler: CommandHandler) -> Self {
        Self { spec, handler }
    }

    pub async fn invoke(&self, matches: &ArgMatches, services: Arc<SimpleServices>) -> Result<()> {
        let arguments = Arguments::from_matches(&self.spec, matches);
        (self.handler)(arguments, services).await
    }
}

/// Ordered name to command mapping backing the top-level dispatcher.
///
/// Registering an existing name replaces that entry in place, so custom
/// commands can override originals without changing listing order.
#[derive(Default)]
pub struct CommandRegistry {
    commands: Vec<RegisteredCommand>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, command: RegisteredCommand) {
        match self
            .commands
            .iter_mut()
            .find(|existing| existing.spec.name == command.spec.name)
        {
            Some(existing) => {
                debug!("Replacing command '{}'", command.spec.name);
                *existing = command;
            }
            None => self.commands.push(command),
        }
    }

    pub fn get(&self, name: &str) -> Option<&RegisteredCommand> {
        self.commands.iter().find(|command| command.spec.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.commands.iter().map(|command| command.spec.name.as_str()).collect()
    }

    /// Attach every registered command as a subcommand of `root`
    pub fn augment(&self, root: clap::Command) -> clap::Command {
        self.commands
            .iter()
            .fold(root, |root, command| root.subcommand(command.spec.to_command()))
            .subcommand_required(true)
            .arg_required_else_help(true)
    }

    pub async fn dispatch(&self, matches: &ArgMatches, services: Arc<SimpleServices>) -> Result<()> {
        let (name, sub_matches) = matches.subcommand().ok_or_else(|| CommandError::UnknownCommand {
            name: String::new(),
        })?;

        let command = self.get(name).ok_or_else(|| CommandError::UnknownCommand {
            name: name.to_string(),
        })?;

        debug!("Dispatching command '{}'", name);
        command.invoke(sub_matches, services).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::options::OptionSpec;
    use crate::config::Config;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn noop(name: &str) -> RegisteredCommand {
        RegisteredCommand::new(
            CommandSpec::new(name, "noop"),
            handler(|_, _| async { Ok(()) }),
        )
    }

    #[test]
    fn test_register_keeps_order_and_replaces_by_name() {
        let mut registry = CommandRegistry::new();
        registry.register(noop("text"));
        registry.register(noop("images"));
        registry.register(noop("chat"));

        let replacement = RegisteredCommand::new(
            CommandSpec::new("images", "replaced"),
            handler(|_, _| async { Ok(()) }),
        );
        registry.register(replacement);

        assert_eq!(registry.names(), vec!["text", "images", "chat"]);
        assert_eq!(registry.get("images").unwrap().spec.about, "replaced");
    }

    #[tokio::test]
    async fn test_dispatch_passes_arguments() {
        let seen = Rc::new(RefCell::new(None));
        let seen_in_handler = seen.clone();

        let mut registry = CommandRegistry::new();
        registry.register(RegisteredCommand::new(
            CommandSpec::new("count", "").option(OptionSpec::integer("count").default_value("5")),
            handler(move |arguments, _| {
                let seen = seen_in_handler.clone();
                async move {
                    *seen.borrow_mut() = arguments.view().integer("count")?;
                    Ok(())
                }
            }),
        ));

        let matches = registry
            .augment(clap::Command::new("ddgs"))
            .try_get_matches_from(["ddgs", "count"])
            .unwrap();
        let services = Arc::new(SimpleServices::new(Config::default()));
        registry.dispatch(&matches, services).await.unwrap();

        assert_eq!(*seen.borrow(), Some(5));
    }
}

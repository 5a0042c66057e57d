//! Declarative option model shared by every command
//!
//! Commands describe their configurable surface as an ordered list of
//! [`OptionSpec`] values instead of hand-written clap attributes. The clap
//! `Command` is rendered from that description, which lets new commands copy
//! an existing command's options without re-declaring them.

use clap::builder::PossibleValuesParser;
use clap::{value_parser, Arg, ArgAction, ArgMatches};
use serde_json::Value;
use std::path::PathBuf;

use crate::config::validation::ConfigValidator;

/// Value type of an option and the coercion applied while parsing it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionKind {
    /// Boolean switch, `true` when present
    Flag,
    Text,
    Integer,
    /// One of a fixed list of strings
    Choice(Vec<String>),
    /// Arbitrary filesystem path, not checked
    Path,
    /// Path that must name an existing directory
    Directory,
}

/// One configurable option of a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionSpec {
    /// Keyword name handed to command implementations
    pub name: String,
    pub long: String,
    pub short: Option<char>,
    /// Additional long spellings accepted on the command line
    pub aliases: Vec<String>,
    pub kind: OptionKind,
    /// Default in command-line form, coerced like a user-supplied value
    pub default: Option<String>,
    pub required: bool,
    pub help: Option<String>,
}

impl OptionSpec {
    pub fn new(long: &str, kind: OptionKind) -> Self {
        Self {
            name: long.replace('-', "_"),
            long: long.to_string(),
            short: None,
            aliases: Vec::new(),
            kind,
            default: None,
            required: false,
            help: None,
        }
    }

    pub fn flag(long: &str) -> Self {
        Self::new(long, OptionKind::Flag)
    }

    pub fn text(long: &str) -> Self {
        Self::new(long, OptionKind::Text)
    }

    pub fn integer(long: &str) -> Self {
        Self::new(long, OptionKind::Integer)
    }

    pub fn choice(long: &str, choices: &[&str]) -> Self {
        Self::new(
            long,
            OptionKind::Choice(choices.iter().map(|c| c.to_string()).collect()),
        )
    }

    pub fn path(long: &str) -> Self {
        Self::new(long, OptionKind::Path)
    }

    pub fn directory(long: &str) -> Self {
        Self::new(long, OptionKind::Directory)
    }

    pub fn short(mut self, short: char) -> Self {
        self.short = Some(short);
        self
    }

    pub fn alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }

    pub fn default_value(mut self, value: &str) -> Self {
        self.default = Some(value.to_string());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn help(mut self, help: &str) -> Self {
        self.help = Some(help.to_string());
        self
    }

    /// Every spelling that selects this option, e.g. `["-k", "--keywords"]`
    pub fn flags(&self) -> Vec<String> {
        let mut flags = Vec::with_capacity(2 + self.aliases.len());
        if let Some(short) = self.short {
            flags.push(format!("-{}", short));
        }
        flags.push(format!("--{}", self.long));
        flags.extend(self.aliases.iter().map(|alias| format!("--{}", alias)));
        flags
    }

    /// Render the clap argument for this option
    pub fn to_arg(&self) -> Arg {
        let mut arg = Arg::new(self.name.clone()).long(self.long.clone());

        if let Some(short) = self.short {
            arg = arg.short(short);
        }
        for alias in &self.aliases {
            arg = arg.visible_alias(alias.clone());
        }
        if let Some(ref help) = self.help {
            arg = arg.help(help.clone());
        }

        arg = match &self.kind {
            OptionKind::Flag => arg.action(ArgAction::SetTrue),
            OptionKind::Text => arg.action(ArgAction::Set),
            OptionKind::Integer => arg.action(ArgAction::Set).value_parser(value_parser!(i64)),
            OptionKind::Choice(choices) => arg
                .action(ArgAction::Set)
                .value_parser(PossibleValuesParser::new(choices.iter().cloned())),
            OptionKind::Path => arg
                .action(ArgAction::Set)
                .value_parser(value_parser!(PathBuf)),
            OptionKind::Directory => arg
                .action(ArgAction::Set)
                .value_parser(parse_existing_directory),
        };

        // Flags are off unless given; a default would be meaningless
        if self.kind != OptionKind::Flag {
            if let Some(ref default) = self.default {
                arg = arg.default_value(default.clone());
            }
            arg = arg.required(self.required);
        }

        arg
    }

    /// Read this option's parsed value, `Null` when absent without default
    pub fn value_from(&self, matches: &ArgMatches) -> Value {
        match self.kind {
            OptionKind::Flag => Value::Bool(matches.get_flag(&self.name)),
            OptionKind::Text | OptionKind::Choice(_) => matches
                .get_one::<String>(&self.name)
                .map(|value| Value::String(value.clone()))
                .unwrap_or(Value::Null),
            OptionKind::Integer => matches
                .get_one::<i64>(&self.name)
                .map(|value| Value::from(*value))
                .unwrap_or(Value::Null),
            OptionKind::Path | OptionKind::Directory => matches
                .get_one::<PathBuf>(&self.name)
                .map(|value| Value::String(value.to_string_lossy().into_owned()))
                .unwrap_or(Value::Null),
        }
    }
}

fn parse_existing_directory(value: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(value);
    ConfigValidator::validate_directory(&path, "directory").map_err(|e| e.to_string())?;
    Ok(path)
}

/// Command-level presentation settings carried along with the options
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandSettings {
    pub max_term_width: Option<usize>,
    pub next_line_help: bool,
    pub hide_possible_values: bool,
}

/// Full declaration of a command's option surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: String,
    pub about: String,
    pub settings: CommandSettings,
    pub options: Vec<OptionSpec>,
}

impl CommandSpec {
    pub fn new(name: &str, about: &str) -> Self {
        Self {
            name: name.to_string(),
            about: about.to_string(),
            settings: CommandSettings::default(),
            options: Vec::new(),
        }
    }

    pub fn option(mut self, option: OptionSpec) -> Self {
        self.options.push(option);
        self
    }

    pub fn settings(mut self, settings: CommandSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn find(&self, name: &str) -> Option<&OptionSpec> {
        self.options.iter().find(|option| option.name == name)
    }

    /// Build the clap command, options in declared order
    pub fn to_command(&self) -> clap::Command {
        let mut command = clap::Command::new(self.name.clone()).about(self.about.clone());

        if let Some(width) = self.settings.max_term_width {
            command = command.max_term_width(width);
        }
        if self.settings.next_line_help {
            command = command.next_line_help(true);
        }
        if self.settings.hide_possible_values {
            command = command.hide_possible_values(true);
        }

        for option in &self.options {
            command = command.arg(option.to_arg());
        }
        command
    }
}

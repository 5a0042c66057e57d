//! Interactive chat sessions
//!
//! A session loops `AwaitingInput -> Exchanging` until its input source is
//! exhausted. Each successful exchange is flushed to the optional
//! [`ChatCache`] before the next prompt.

use anyhow::{anyhow, Context, Result};
use crossterm::style::Stylize;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Config as ReadlineConfig, Editor};
use std::io::{Read, Write};
use std::time::Duration;
use tracing::{debug, info};

use crate::core::infrastructure::ChatCache;
use crate::core::services::{ChatModel, SearchClient};

const RULE_WIDTH: usize = 78;

#[cfg(windows)]
const SEND_HINT: &str = "ctrl+Z";
#[cfg(not(windows))]
const SEND_HINT: &str = "ctrl+D";

/// Where user turns come from. `Ok(None)` ends the session.
pub trait InputSource {
    fn read_input(&mut self, prompt: &str) -> Result<Option<String>>;
}

/// One line per turn through rustyline, with history recording off
pub struct LineInput {
    editor: Editor<(), DefaultHistory>,
}

impl LineInput {
    pub fn new() -> Result<Self> {
        let config = ReadlineConfig::builder()
            .auto_add_history(false)
            .max_history_size(0)
            .context("failed to configure interactive editor")?
            .build();
        let editor = Editor::<(), DefaultHistory>::with_config(config)
            .context("failed to initialize interactive editor")?;
        Ok(Self { editor })
    }
}

impl InputSource for LineInput {
    fn read_input(&mut self, prompt: &str) -> Result<Option<String>> {
        // rustyline redraws only the last prompt line
        let (header, prompt) = match prompt.rsplit_once('\n') {
            Some((header, prompt)) => (Some(header), prompt),
            None => (None, prompt),
        };
        if let Some(header) = header {
            println!("{}", header);
        }

        let readline = tokio::task::block_in_place(|| self.editor.readline(prompt));
        match readline {
            Ok(line) => Ok(Some(line)),
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
            Err(e) => Err(anyhow!("failed to read interactive input: {e}")),
        }
    }
}

/// A whole pasted block per turn, read until end-of-stream
pub struct MultilineInput<R, W> {
    reader: R,
    console: W,
}

impl MultilineInput<std::io::Stdin, std::io::Stdout> {
    pub fn stdin() -> Self {
        Self::new(std::io::stdin(), std::io::stdout())
    }
}

impl<R: Read, W: Write> MultilineInput<R, W> {
    pub fn new(reader: R, console: W) -> Self {
        Self { reader, console }
    }
}

impl<R: Read, W: Write> InputSource for MultilineInput<R, W> {
    fn read_input(&mut self, prompt: &str) -> Result<Option<String>> {
        writeln!(self.console, "{}", prompt)?;
        writeln!(self.console, "[Send message: {}]", SEND_HINT)?;
        self.console.flush()?;

        let mut buf = Vec::new();
        if self.reader.read_to_end(&mut buf)? == 0 {
            return Ok(None);
        }
        Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
    }
}

pub struct ChatSession<'a> {
    client: &'a mut dyn SearchClient,
    model: ChatModel,
    timeout: Duration,
    cache: Option<ChatCache>,
}

impl<'a> ChatSession<'a> {
    pub fn new(client: &'a mut dyn SearchClient, model: ChatModel, timeout: Duration) -> Self {
        Self {
            client,
            model,
            timeout,
            cache: None,
        }
    }

    pub fn with_cache(mut self, cache: Option<ChatCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Restore the client's session from the cache file, if there is one.
    /// Returns whether anything was loaded.
    pub fn hydrate(&mut self) -> Result<bool> {
        let Some(cache) = &self.cache else {
            return Ok(false);
        };
        match cache.load()? {
            Some(state) => {
                info!(
                    "Resuming conversation from {} ({} messages)",
                    cache.path().display(),
                    state.messages.len()
                );
                self.client.set_session_state(state);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn prompt(&self) -> String {
        format!(
            "{}\nYou[model={} tokens={}]: ",
            "-".repeat(RULE_WIDTH),
            self.model.name(),
            self.client.session_state().tokens
        )
    }

    /// Send one turn verbatim. Blank input is ignored and returns `None`.
    pub async fn exchange(&mut self, input: &str, out: &mut dyn Write) -> Result<Option<String>> {
        if input.trim().is_empty() {
            return Ok(None);
        }

        debug!("Sending {} chars to {}", input.len(), self.model.name());
        let reply = self.client.chat(input, self.model, self.timeout).await?;
        writeln!(out, "{}", format!("AI: {}", reply).yellow())?;
        out.flush()?;

        if let Some(cache) = &self.cache {
            cache.save(&self.client.session_state())?;
        }
        Ok(Some(reply))
    }

    /// Run turns until the input source ends. Returns the number of
    /// exchanges made.
    pub async fn run(&mut self, input: &mut dyn InputSource, out: &mut dyn Write) -> Result<usize> {
        let mut exchanges = 0;
        while let Some(text) = input.read_input(&self.prompt())? {
            if self.exchange(&text, out).await?.is_some() {
                exchanges += 1;
            }
        }
        debug!("Chat input ended after {} exchanges", exchanges);
        Ok(exchanges)
    }
}

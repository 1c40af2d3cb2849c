//! Command trait, registry, and dispatch logic.
//!
//! Supports whitespace tokenization, case-insensitive command names, and a
//! single `| grep <pattern>` filter stage.

use std::collections::HashMap;

use cyberlab_platform::NetworkService;
use cyberlab_types::challenge::Challenge;
use cyberlab_types::config::TerminalConfig;
use cyberlab_vfs::FileStore;
use regex::Regex;

use crate::error::CommandError;

/// Output produced by a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutput {
    /// Plain text. Empty text appends nothing to the scrollback.
    Text(String),
    /// Command produced no visible output.
    None,
    /// Signal to clear the scrollback.
    Clear,
}

impl CommandOutput {
    /// Text carried by this output, if any.
    pub fn into_text(self) -> String {
        match self {
            CommandOutput::Text(text) => text,
            CommandOutput::None | CommandOutput::Clear => String::new(),
        }
    }
}

/// Shared environment passed to every command.
pub struct Environment<'a> {
    /// The challenge being investigated.
    pub challenge: &'a Challenge,
    /// Artifact store with its session cache.
    pub files: &'a mut FileStore,
    /// Outbound HTTP for `ping` and `curl` (and artifact fetches).
    pub network: &'a dyn NetworkService,
    /// Timeouts and limits.
    pub settings: &'a TerminalConfig,
}

impl Environment<'_> {
    /// Fetch an artifact, keeping "file not found" distinct from read errors.
    pub fn read_file(&mut self, command: &str, name: &str) -> Result<String, CommandError> {
        self.files
            .fetch_content(name, self.network)
            .map_err(|e| CommandError::from_store(command, &e))
    }

    /// Fetch an artifact, reporting every failure as "unable to read file".
    pub fn read_file_opaque(&mut self, command: &str, name: &str) -> Result<String, CommandError> {
        self.files
            .fetch_content(name, self.network)
            .map_err(|_| CommandError::read_failed(command))
    }
}

/// A single executable command.
pub trait Command {
    /// The command name (what the user types).
    fn name(&self) -> &str;

    /// One-line description for `help`.
    fn description(&self) -> &str;

    /// Usage string (e.g. "cat <file>").
    fn usage(&self) -> &str;

    /// Execute the command with the given arguments and environment.
    fn execute(
        &self,
        args: &[&str],
        env: &mut Environment<'_>,
    ) -> Result<CommandOutput, CommandError>;
}

/// Width of the usage column in `help` output.
const HELP_USAGE_WIDTH: usize = 29;

/// Registry of available commands with dispatch.
///
/// Commands keep their registration order so `help` lists them the way they
/// were registered.
pub struct CommandRegistry {
    commands: Vec<Box<dyn Command>>,
    index: HashMap<String, usize>,
}

impl CommandRegistry {
    /// Create an empty command registry.
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Register a command. Replaces any existing command with the same name.
    pub fn register(&mut self, cmd: Box<dyn Command>) {
        let name = cmd.name().to_ascii_lowercase();
        match self.index.get(&name) {
            Some(&slot) => self.commands[slot] = cmd,
            None => {
                self.index.insert(name, self.commands.len());
                self.commands.push(cmd);
            },
        }
    }

    /// Whether a command with this name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(&name.to_ascii_lowercase())
    }

    /// List registered commands as (name, description) in registration order.
    pub fn list_commands(&self) -> Vec<(&str, &str)> {
        self.commands
            .iter()
            .map(|c| (c.name(), c.description()))
            .collect()
    }

    /// Parse and execute a command line.
    ///
    /// Never fails: errors are rendered as text. A line containing `|` is
    /// split once at the first `|`; the right side must be
    /// `grep <pattern>`.
    pub fn execute(&self, line: &str, env: &mut Environment<'_>) -> CommandOutput {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return CommandOutput::None;
        }
        let result = match trimmed.split_once('|') {
            Some((left, right)) => self.execute_pipe(left, right, env),
            None => self.dispatch(&tokenize(trimmed), env),
        };
        result.unwrap_or_else(|e| {
            log::debug!("Command failed: {e}");
            CommandOutput::Text(e.to_string())
        })
    }

    /// `<left> | grep <pattern>`: filter the left output's lines.
    fn execute_pipe(
        &self,
        left: &str,
        right: &str,
        env: &mut Environment<'_>,
    ) -> Result<CommandOutput, CommandError> {
        let left_text = match self.dispatch(&tokenize(left), env) {
            Ok(output) => output.into_text(),
            Err(e) => e.to_string(),
        };
        let right_tokens = tokenize(right);
        match right_tokens.as_slice() {
            [cmd, pattern, ..] if cmd.eq_ignore_ascii_case("grep") => {
                let rx = compile_pattern("grep", pattern)?;
                Ok(CommandOutput::Text(filter_lines(&left_text, &rx)))
            },
            _ => Err(CommandError::Unsupported(
                "pipe: unsupported combination".to_string(),
            )),
        }
    }

    /// Dispatch a tokenized command.
    pub fn dispatch(
        &self,
        tokens: &[&str],
        env: &mut Environment<'_>,
    ) -> Result<CommandOutput, CommandError> {
        let Some((&name, args)) = tokens.split_first() else {
            return Err(CommandError::UnknownCommand(String::new()));
        };
        let name_lower = name.to_ascii_lowercase();

        // Intercepted here because it needs the registry itself.
        if name_lower == "help" {
            return Ok(CommandOutput::Text(self.help_text()));
        }

        match self.index.get(&name_lower) {
            Some(&slot) => {
                log::debug!("Dispatching {name_lower} with {} args", args.len());
                self.commands[slot].execute(args, env)
            },
            None => Err(CommandError::UnknownCommand(name.to_string())),
        }
    }

    fn help_text(&self) -> String {
        let mut lines = vec!["Available commands:".to_string()];
        for cmd in &self.commands {
            lines.push(format!(
                "  {:<width$}{}",
                cmd.usage(),
                cmd.description(),
                width = HELP_USAGE_WIDTH
            ));
        }
        lines.push(format!(
            "  {:<width$}{}",
            "help",
            "Show this help",
            width = HELP_USAGE_WIDTH
        ));
        lines.join("\n")
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Split a command line on runs of whitespace.
pub fn tokenize(input: &str) -> Vec<&str> {
    input.split_whitespace().collect()
}

/// Split text on `\n`, dropping one `\r` before each break.
///
/// A trailing newline yields a trailing empty line, so `"a\nb\n"` has three
/// lines.
pub fn split_lines(text: &str) -> Vec<&str> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect()
}

/// Build the regex used by `grep` and the pipe filter.
pub(crate) fn compile_pattern(command: &str, pattern: &str) -> Result<Regex, CommandError> {
    Regex::new(pattern).map_err(|_| CommandError::InvalidPattern {
        command: command.to_string(),
    })
}

/// Keep the lines of `text` that match `rx`, rejoined with `\n`.
pub(crate) fn filter_lines(text: &str, rx: &Regex) -> String {
    split_lines(text)
        .into_iter()
        .filter(|line| rx.is_match(line))
        .collect::<Vec<_>>()
        .join("\n")
}

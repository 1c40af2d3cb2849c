//! Interactive terminal session.
//!
//! Owns everything one challenge view needs: the command registry, the
//! artifact store with its cache, the scrollback, the input line and the
//! recall cursor. Lines run to completion before `submit_line` returns, so
//! at most one command is ever in flight.

use cyberlab_platform::NetworkService;
use cyberlab_types::challenge::Challenge;
use cyberlab_types::config::TerminalConfig;
use cyberlab_vfs::FileStore;

use crate::commands::register_builtins;
use crate::interpreter::{CommandOutput, CommandRegistry, Environment};

/// One scrollback entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrollbackEntry {
    /// A line the user entered, as typed.
    Input(String),
    /// Text a command produced.
    Output(String),
}

/// A terminal bound to one challenge.
pub struct TerminalSession {
    challenge: Challenge,
    registry: CommandRegistry,
    files: FileStore,
    network: Box<dyn NetworkService>,
    settings: TerminalConfig,
    scrollback: Vec<ScrollbackEntry>,
    input: String,
    /// Index into the entered lines while recalling, newest last.
    recall: Option<usize>,
}

impl TerminalSession {
    pub fn new(
        challenge: Challenge,
        network: Box<dyn NetworkService>,
        settings: TerminalConfig,
    ) -> Self {
        let files = FileStore::new(challenge.files.clone())
            .with_origin(settings.origin.clone())
            .with_timeout(settings.fetch_timeout());
        let mut registry = CommandRegistry::new();
        register_builtins(&mut registry);
        log::info!(
            "Terminal session opened for challenge {} ({} artifacts)",
            challenge.id,
            challenge.files.len()
        );
        Self {
            challenge,
            registry,
            files,
            network,
            settings,
            scrollback: Vec::new(),
            input: String::new(),
            recall: None,
        }
    }

    pub fn challenge(&self) -> &Challenge {
        &self.challenge
    }

    pub fn files(&self) -> &FileStore {
        &self.files
    }

    pub fn scrollback(&self) -> &[ScrollbackEntry] {
        &self.scrollback
    }

    // -- Input line --------------------------------------------------------

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: &str) {
        self.input = text.to_string();
    }

    pub fn push_char(&mut self, ch: char) {
        self.input.push(ch);
    }

    pub fn backspace(&mut self) {
        self.input.pop();
    }

    /// Run the current input line and clear it.
    pub fn enter(&mut self) {
        let line = std::mem::take(&mut self.input);
        self.submit_line(&line);
    }

    /// Record `line`, run it, and append its output.
    ///
    /// A blank line does nothing at all. `clear` empties the scrollback, the
    /// echoed `clear` line included. Empty output appends nothing.
    pub fn submit_line(&mut self, line: &str) {
        if line.trim().is_empty() {
            return;
        }
        self.scrollback.push(ScrollbackEntry::Input(line.to_string()));
        self.recall = None;

        let mut env = Environment {
            challenge: &self.challenge,
            files: &mut self.files,
            network: self.network.as_ref(),
            settings: &self.settings,
        };
        match self.registry.execute(line, &mut env) {
            CommandOutput::Clear => self.scrollback.clear(),
            CommandOutput::Text(text) if !text.is_empty() => {
                self.scrollback.push(ScrollbackEntry::Output(text));
            },
            CommandOutput::Text(_) | CommandOutput::None => {},
        }
    }

    /// Ctrl+L: wipe the scrollback without running anything.
    pub fn clear(&mut self) {
        self.scrollback.clear();
        self.recall = None;
    }

    // -- Recall ------------------------------------------------------------

    fn entered_lines(&self) -> Vec<&str> {
        self.scrollback
            .iter()
            .filter_map(|e| match e {
                ScrollbackEntry::Input(line) => Some(line.as_str()),
                ScrollbackEntry::Output(_) => None,
            })
            .collect()
    }

    /// Up: step to the previous entered line, stopping at the oldest.
    pub fn recall_previous(&mut self) {
        let lines = self.entered_lines();
        if lines.is_empty() {
            return;
        }
        let index = match self.recall {
            None => lines.len() - 1,
            Some(i) => i.saturating_sub(1),
        };
        self.input = lines[index].to_string();
        self.recall = Some(index);
    }

    /// Down: step to the next entered line, stopping at the newest.
    pub fn recall_next(&mut self) {
        let Some(current) = self.recall else {
            return;
        };
        let lines = self.entered_lines();
        if lines.is_empty() {
            return;
        }
        let index = (current + 1).min(lines.len() - 1);
        self.input = lines[index].to_string();
        self.recall = Some(index);
    }

    // -- Completion --------------------------------------------------------

    /// Tab: complete the last token to an artifact basename.
    ///
    /// Only a unique prefix match is applied; the line is rebuilt with single
    /// spaces. Returns whether the input changed.
    pub fn complete(&mut self) -> bool {
        let mut parts: Vec<String> = self.input.split_whitespace().map(str::to_string).collect();
        if parts.is_empty() {
            parts.push(String::new());
        }
        let Some(last) = parts.last_mut() else {
            return false;
        };

        let mut matches: Vec<&str> = self
            .files
            .artifacts()
            .iter()
            .map(|a| a.basename())
            .filter(|name| name.starts_with(last.as_str()))
            .collect();
        matches.sort_unstable();
        matches.dedup();
        let [only] = matches.as_slice() else {
            return false;
        };
        *last = (*only).to_string();

        let completed = parts.join(" ");
        let changed = completed != self.input;
        self.input = completed;
        changed
    }

    // -- Rendering ---------------------------------------------------------

    /// Display text of one entry; entered lines carry the challenge title.
    pub fn render_entry(&self, entry: &ScrollbackEntry) -> String {
        match entry {
            ScrollbackEntry::Input(line) => format!(
                "{}{}{line}",
                self.challenge.title, self.settings.prompt_separator
            ),
            ScrollbackEntry::Output(text) => text.clone(),
        }
    }

    /// The whole scrollback as copyable text.
    pub fn transcript(&self) -> String {
        self.scrollback
            .iter()
            .map(|e| self.render_entry(e))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

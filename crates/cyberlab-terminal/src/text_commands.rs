//! Line and byte oriented text builtins: grep, head, tail, strings, wc.

use crate::commands::join_args;
use crate::error::CommandError;
use crate::interpreter::{
    Command, CommandOutput, CommandRegistry, Environment, compile_pattern, filter_lines,
    split_lines,
};

/// Line count used by `head`/`tail` when `-n` is absent or unusable.
const DEFAULT_LINE_COUNT: usize = 10;

/// Minimum run length reported by `strings`.
const MIN_STRING_RUN: usize = 4;

/// Register grep, head, tail, strings.
pub fn register_text_commands(reg: &mut CommandRegistry) {
    reg.register(Box::new(GrepCmd));
    reg.register(Box::new(HeadCmd));
    reg.register(Box::new(TailCmd));
    reg.register(Box::new(StringsCmd));
}

/// Register wc.
pub fn register_count_commands(reg: &mut CommandRegistry) {
    reg.register(Box::new(WcCmd));
}

/// Parse the optional sign and leading decimal digits of `s`, ignoring
/// anything after them. `"12abc"` is 12, `"abc"` is `None`.
fn parse_leading_int(s: &str) -> Option<i64> {
    let (negative, rest) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
    let value: i64 = digits.parse().ok()?;
    Some(if negative { -value } else { value })
}

/// Split `[-n N] <file...>` into a line count and the file name.
///
/// A missing, zero or unparsable count means the default; a negative count
/// clamps to 1. `-n` without a following token is treated as part of the
/// file name.
fn parse_line_count<'a>(args: &[&'a str]) -> (usize, Vec<&'a str>) {
    match args {
        ["-n", count, rest @ ..] => {
            let n = match parse_leading_int(count) {
                None | Some(0) => DEFAULT_LINE_COUNT,
                Some(v) => usize::try_from(v.max(1)).unwrap_or(DEFAULT_LINE_COUNT),
            };
            (n, rest.to_vec())
        },
        _ => (DEFAULT_LINE_COUNT, args.to_vec()),
    }
}

// ---------------------------------------------------------------------------
// grep
// ---------------------------------------------------------------------------

struct GrepCmd;
impl Command for GrepCmd {
    fn name(&self) -> &str {
        "grep"
    }
    fn description(&self) -> &str {
        "Search pattern in file (regex)"
    }
    fn usage(&self) -> &str {
        "grep <pat> <file>"
    }
    fn execute(
        &self,
        args: &[&str],
        env: &mut Environment<'_>,
    ) -> Result<CommandOutput, CommandError> {
        let [pattern, file @ ..] = args else {
            return Err(CommandError::Usage("grep <pattern> <file>".to_string()));
        };
        if file.is_empty() {
            return Err(CommandError::Usage("grep <pattern> <file>".to_string()));
        }
        let rx = compile_pattern("grep", pattern)?;
        let content = env.read_file("grep", &join_args(file))?;
        Ok(CommandOutput::Text(filter_lines(&content, &rx)))
    }
}

// ---------------------------------------------------------------------------
// head
// ---------------------------------------------------------------------------

struct HeadCmd;
impl Command for HeadCmd {
    fn name(&self) -> &str {
        "head"
    }
    fn description(&self) -> &str {
        "First N lines (default 10)"
    }
    fn usage(&self) -> &str {
        "head [-n N] <file>"
    }
    fn execute(
        &self,
        args: &[&str],
        env: &mut Environment<'_>,
    ) -> Result<CommandOutput, CommandError> {
        if args.is_empty() {
            return Err(CommandError::Usage(self.usage().to_string()));
        }
        let (n, file) = parse_line_count(args);
        let content = env.read_file_opaque("head", &join_args(&file))?;
        let lines = split_lines(&content);
        let end = n.min(lines.len());
        Ok(CommandOutput::Text(lines[..end].join("\n")))
    }
}

// ---------------------------------------------------------------------------
// tail
// ---------------------------------------------------------------------------

struct TailCmd;
impl Command for TailCmd {
    fn name(&self) -> &str {
        "tail"
    }
    fn description(&self) -> &str {
        "Last N lines (default 10)"
    }
    fn usage(&self) -> &str {
        "tail [-n N] <file>"
    }
    fn execute(
        &self,
        args: &[&str],
        env: &mut Environment<'_>,
    ) -> Result<CommandOutput, CommandError> {
        if args.is_empty() {
            return Err(CommandError::Usage(self.usage().to_string()));
        }
        let (n, file) = parse_line_count(args);
        let content = env.read_file_opaque("tail", &join_args(&file))?;
        let lines = split_lines(&content);
        let start = lines.len().saturating_sub(n);
        Ok(CommandOutput::Text(lines[start..].join("\n")))
    }
}

// ---------------------------------------------------------------------------
// strings
// ---------------------------------------------------------------------------

/// Maximal runs of printable ASCII (0x20..=0x7E) at least four long.
fn printable_runs(text: &str) -> Vec<&str> {
    text.split(|c: char| !matches!(c, ' '..='~'))
        .filter(|run| run.len() >= MIN_STRING_RUN)
        .collect()
}

struct StringsCmd;
impl Command for StringsCmd {
    fn name(&self) -> &str {
        "strings"
    }
    fn description(&self) -> &str {
        "Extract printable strings"
    }
    fn usage(&self) -> &str {
        "strings <file>"
    }
    fn execute(
        &self,
        args: &[&str],
        env: &mut Environment<'_>,
    ) -> Result<CommandOutput, CommandError> {
        if args.is_empty() {
            return Err(CommandError::Usage(self.usage().to_string()));
        }
        let content = env.read_file_opaque("strings", &join_args(args))?;
        Ok(CommandOutput::Text(printable_runs(&content).join("\n")))
    }
}

// ---------------------------------------------------------------------------
// wc
// ---------------------------------------------------------------------------

struct WcCmd;
impl Command for WcCmd {
    fn name(&self) -> &str {
        "wc"
    }
    fn description(&self) -> &str {
        "Count lines/bytes"
    }
    fn usage(&self) -> &str {
        "wc [-l|-c] <file>"
    }
    fn execute(
        &self,
        args: &[&str],
        env: &mut Environment<'_>,
    ) -> Result<CommandOutput, CommandError> {
        let (mode, file) = match args {
            [] => return Err(CommandError::Usage(self.usage().to_string())),
            [flag @ ("-l" | "-c"), rest @ ..] => (Some(*flag), join_args(rest)),
            _ => (None, join_args(args)),
        };
        let content = env.read_file_opaque("wc", &file)?;
        let lines = split_lines(&content).len();
        let bytes = content.len();
        let text = match mode {
            Some("-l") => format!("{lines} {file}"),
            Some(_) => format!("{bytes} {file}"),
            None => format!("{bytes} {lines} {file}"),
        };
        Ok(CommandOutput::Text(text))
    }
}

//! Core builtins: ls, cat, echo, ip, clear.

use crate::error::CommandError;
use crate::interpreter::{Command, CommandOutput, CommandRegistry, Environment};

/// Register every builtin into a registry, in `help` order.
///
/// `help` itself is handled by the registry.
pub fn register_builtins(reg: &mut CommandRegistry) {
    reg.register(Box::new(LsCmd));
    reg.register(Box::new(CatCmd));
    crate::text_commands::register_text_commands(reg);
    crate::encode_commands::register_encode_commands(reg);
    crate::digest_commands::register_digest_commands(reg);
    crate::text_commands::register_count_commands(reg);
    reg.register(Box::new(EchoCmd));
    crate::network_commands::register_network_commands(reg);
    reg.register(Box::new(IpCmd));
    reg.register(Box::new(ClearCmd));
}

/// Remaining arguments rejoined with single spaces (file names may contain
/// spaces).
pub(crate) fn join_args(args: &[&str]) -> String {
    args.join(" ")
}

// ---------------------------------------------------------------------------
// ls
// ---------------------------------------------------------------------------

struct LsCmd;
impl Command for LsCmd {
    fn name(&self) -> &str {
        "ls"
    }
    fn description(&self) -> &str {
        "List available files"
    }
    fn usage(&self) -> &str {
        "ls"
    }
    fn execute(
        &self,
        _args: &[&str],
        env: &mut Environment<'_>,
    ) -> Result<CommandOutput, CommandError> {
        let names: Vec<&str> = env
            .files
            .artifacts()
            .iter()
            .map(|a| a.name.as_str())
            .collect();
        if names.is_empty() {
            return Ok(CommandOutput::Text("No files provided".to_string()));
        }
        Ok(CommandOutput::Text(names.join("\n")))
    }
}

// ---------------------------------------------------------------------------
// cat
// ---------------------------------------------------------------------------

struct CatCmd;
impl Command for CatCmd {
    fn name(&self) -> &str {
        "cat"
    }
    fn description(&self) -> &str {
        "Print file contents"
    }
    fn usage(&self) -> &str {
        "cat <file>"
    }
    fn execute(
        &self,
        args: &[&str],
        env: &mut Environment<'_>,
    ) -> Result<CommandOutput, CommandError> {
        if args.is_empty() {
            return Err(CommandError::Usage(self.usage().to_string()));
        }
        let content = env.read_file("cat", &join_args(args))?;
        Ok(CommandOutput::Text(content))
    }
}

// ---------------------------------------------------------------------------
// echo
// ---------------------------------------------------------------------------

struct EchoCmd;
impl Command for EchoCmd {
    fn name(&self) -> &str {
        "echo"
    }
    fn description(&self) -> &str {
        "Print text"
    }
    fn usage(&self) -> &str {
        "echo <text>"
    }
    fn execute(
        &self,
        args: &[&str],
        _env: &mut Environment<'_>,
    ) -> Result<CommandOutput, CommandError> {
        Ok(CommandOutput::Text(join_args(args)))
    }
}

// ---------------------------------------------------------------------------
// ip
// ---------------------------------------------------------------------------

struct IpCmd;
impl Command for IpCmd {
    fn name(&self) -> &str {
        "ip"
    }
    fn description(&self) -> &str {
        "Show room or platform info"
    }
    fn usage(&self) -> &str {
        "ip"
    }
    fn execute(
        &self,
        _args: &[&str],
        env: &mut Environment<'_>,
    ) -> Result<CommandOutput, CommandError> {
        Ok(CommandOutput::Text(env.challenge.connection_hint()))
    }
}

// ---------------------------------------------------------------------------
// clear
// ---------------------------------------------------------------------------

struct ClearCmd;
impl Command for ClearCmd {
    fn name(&self) -> &str {
        "clear"
    }
    fn description(&self) -> &str {
        "Clear the terminal"
    }
    fn usage(&self) -> &str {
        "clear"
    }
    fn execute(
        &self,
        _args: &[&str],
        _env: &mut Environment<'_>,
    ) -> Result<CommandOutput, CommandError> {
        Ok(CommandOutput::Clear)
    }
}

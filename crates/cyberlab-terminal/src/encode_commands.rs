//! Encoding builtins: base64, xxd.

use base64::Engine;
use base64::alphabet;
use base64::engine::general_purpose::STANDARD;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};

use crate::commands::join_args;
use crate::error::CommandError;
use crate::interpreter::{Command, CommandOutput, CommandRegistry, Environment};

/// Bytes per `xxd` row.
const XXD_ROW: usize = 16;

/// Register base64, xxd.
pub fn register_encode_commands(reg: &mut CommandRegistry) {
    reg.register(Box::new(Base64Cmd));
    reg.register(Box::new(XxdCmd));
}

/// Standard alphabet, padding optional on decode.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

// ---------------------------------------------------------------------------
// base64
// ---------------------------------------------------------------------------

fn decode_base64(text: &str) -> Option<String> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = LENIENT.decode(compact).ok()?;
    Some(String::from_utf8_lossy(&bytes).into_owned())
}

struct Base64Cmd;
impl Command for Base64Cmd {
    fn name(&self) -> &str {
        "base64"
    }
    fn description(&self) -> &str {
        "Encode or decode file"
    }
    fn usage(&self) -> &str {
        "base64 [-d] <file>"
    }
    fn execute(
        &self,
        args: &[&str],
        env: &mut Environment<'_>,
    ) -> Result<CommandOutput, CommandError> {
        let (decode, file) = match args {
            [] => return Err(CommandError::Usage(self.usage().to_string())),
            ["-d", rest @ ..] => (true, join_args(rest)),
            _ => (false, join_args(args)),
        };
        let content = env.read_file_opaque("base64", &file)?;
        if !decode {
            return Ok(CommandOutput::Text(STANDARD.encode(content.as_bytes())));
        }
        decode_base64(&content)
            .map(CommandOutput::Text)
            .ok_or_else(|| CommandError::InvalidInput {
                command: "base64".to_string(),
            })
    }
}

// ---------------------------------------------------------------------------
// xxd
// ---------------------------------------------------------------------------

/// Classic hexdump: offset, up to 16 space-separated hex bytes padded to a
/// fixed column, then the printable rendering.
fn hexdump(bytes: &[u8]) -> String {
    let hex_width = XXD_ROW * 3 - 1;
    bytes
        .chunks(XXD_ROW)
        .enumerate()
        .map(|(row, chunk)| {
            let hex = chunk
                .iter()
                .map(|b| format!("{b:02x}"))
                .collect::<Vec<_>>()
                .join(" ");
            let ascii: String = chunk
                .iter()
                .map(|&b| {
                    if (0x20..=0x7e).contains(&b) {
                        char::from(b)
                    } else {
                        '.'
                    }
                })
                .collect();
            format!("{:08x}: {hex:<hex_width$}  {ascii}", row * XXD_ROW)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

struct XxdCmd;
impl Command for XxdCmd {
    fn name(&self) -> &str {
        "xxd"
    }
    fn description(&self) -> &str {
        "Hexdump of file (text)"
    }
    fn usage(&self) -> &str {
        "xxd <file>"
    }
    fn execute(
        &self,
        args: &[&str],
        env: &mut Environment<'_>,
    ) -> Result<CommandOutput, CommandError> {
        if args.is_empty() {
            return Err(CommandError::Usage(self.usage().to_string()));
        }
        let content = env.read_file_opaque("xxd", &join_args(args))?;
        Ok(CommandOutput::Text(hexdump(content.as_bytes())))
    }
}

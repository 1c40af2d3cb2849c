//! Digest builtins: sha256, sha1, and an explicit md5 refusal.

use sha1::Sha1;
use sha2::{Digest, Sha256};

use crate::commands::join_args;
use crate::error::CommandError;
use crate::interpreter::{Command, CommandOutput, CommandRegistry, Environment};

/// Register sha256, sha1, md5.
pub fn register_digest_commands(reg: &mut CommandRegistry) {
    reg.register(Box::new(DigestCmd::<Sha256>::new(
        "sha256",
        "SHA-256 hash of file",
        "sha256 <file>",
    )));
    reg.register(Box::new(DigestCmd::<Sha1>::new(
        "sha1",
        "SHA-1 hash of file",
        "sha1 <file>",
    )));
    reg.register(Box::new(Md5Cmd));
}

/// Lowercase hex digest of the UTF-8 bytes of `text`.
fn hex_digest<D: Digest>(text: &str) -> String {
    hex::encode(D::digest(text.as_bytes()))
}

// ---------------------------------------------------------------------------
// sha256 / sha1
// ---------------------------------------------------------------------------

struct DigestCmd<D> {
    name: &'static str,
    description: &'static str,
    usage: &'static str,
    _algo: std::marker::PhantomData<D>,
}

impl<D> DigestCmd<D> {
    fn new(name: &'static str, description: &'static str, usage: &'static str) -> Self {
        Self {
            name,
            description,
            usage,
            _algo: std::marker::PhantomData,
        }
    }
}

impl<D: Digest> Command for DigestCmd<D> {
    fn name(&self) -> &str {
        self.name
    }
    fn description(&self) -> &str {
        self.description
    }
    fn usage(&self) -> &str {
        self.usage
    }
    fn execute(
        &self,
        args: &[&str],
        env: &mut Environment<'_>,
    ) -> Result<CommandOutput, CommandError> {
        if args.is_empty() {
            return Err(CommandError::Usage(self.usage.to_string()));
        }
        let file = join_args(args);
        let content = env.read_file_opaque(self.name, &file)?;
        Ok(CommandOutput::Text(format!(
            "{}  {file}",
            hex_digest::<D>(&content)
        )))
    }
}

// ---------------------------------------------------------------------------
// md5
// ---------------------------------------------------------------------------

struct Md5Cmd;
impl Command for Md5Cmd {
    fn name(&self) -> &str {
        "md5"
    }
    fn description(&self) -> &str {
        "MD5 hash of file (unsupported)"
    }
    fn usage(&self) -> &str {
        "md5 <file>"
    }
    fn execute(
        &self,
        args: &[&str],
        _env: &mut Environment<'_>,
    ) -> Result<CommandOutput, CommandError> {
        if args.is_empty() {
            return Err(CommandError::Usage(self.usage().to_string()));
        }
        Err(CommandError::Unsupported(
            "md5: MD5 is not available in the built-in digest set (use sha256 or sha1)".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{Fixture, run};

    #[test]
    fn known_vectors() {
        assert_eq!(
            hex_digest::<Sha256>("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(
            hex_digest::<Sha1>("abc"),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
    }

    #[test]
    fn sha256_command_format() {
        let mut fx = Fixture::standard();
        let out = run(&mut fx, "sha256 notes.txt");
        let (digest, file) = out.split_once("  ").unwrap();
        assert_eq!(digest.len(), 64);
        assert_eq!(file, "notes.txt");
    }

    #[test]
    fn digests_are_deterministic() {
        let mut fx = Fixture::standard();
        let a = run(&mut fx, "sha1 index.php");
        let b = run(&mut fx, "sha1 web/index.php");
        assert_eq!(a.split_once("  ").unwrap().0, b.split_once("  ").unwrap().0);
        assert_eq!(a.split_once("  ").unwrap().0.len(), 40);
    }

    #[test]
    fn digest_errors() {
        let mut fx = Fixture::standard();
        assert_eq!(run(&mut fx, "sha256"), "Usage: sha256 <file>");
        assert_eq!(run(&mut fx, "sha1 missing"), "sha1: unable to read file");
    }

    #[test]
    fn md5_is_refused_without_fetching() {
        let mut fx = Fixture::standard();
        assert_eq!(run(&mut fx, "md5"), "Usage: md5 <file>");
        assert_eq!(
            run(&mut fx, "md5 notes.txt"),
            "md5: MD5 is not available in the built-in digest set (use sha256 or sha1)"
        );
        assert_eq!(fx.network.total_requests(), 0);
    }
}

//! Shared test fixtures for terminal tests.

use cyberlab_platform::mock::MockNetwork;
use cyberlab_types::challenge::{Artifact, Challenge, Difficulty};
use cyberlab_types::config::TerminalConfig;
use cyberlab_vfs::FileStore;

use crate::interpreter::{CommandOutput, CommandRegistry, Environment};

pub const ORIGIN: &str = "http://ctf.test";

/// A challenge with a few text artifacts served by a [`MockNetwork`].
pub struct Fixture {
    pub challenge: Challenge,
    pub files: FileStore,
    pub network: MockNetwork,
    pub settings: TerminalConfig,
}

pub fn artifact(name: &str, href: Option<&str>) -> Artifact {
    Artifact {
        name: name.to_string(),
        size: "1 KB".to_string(),
        href: href.map(str::to_string),
    }
}

pub fn challenge(files: Vec<Artifact>) -> Challenge {
    Challenge {
        id: "1".to_string(),
        title: "Login Bypass".to_string(),
        category: "Web".to_string(),
        difficulty: Difficulty::Easy,
        points: 100,
        solved: 0,
        description: String::new(),
        hints: Vec::new(),
        files,
        room_ip: None,
        external_room: None,
        flags: Vec::new(),
    }
}

impl Fixture {
    /// Challenge with no artifacts and an empty network.
    pub fn new() -> Self {
        Self::with(Vec::new(), MockNetwork::new())
    }

    /// Standard fixture: `notes.txt`, `web/index.php`, `bin/blob.bin`,
    /// `data.b64`, and an href-less `locked.txt`.
    pub fn standard() -> Self {
        let files = vec![
            artifact("notes.txt", Some("/files/notes.txt")),
            artifact("web/index.php", Some("/files/index.php")),
            artifact("bin/blob.bin", Some("/files/blob.bin")),
            artifact("data.b64", Some("/files/data.b64")),
            artifact("locked.txt", None),
            artifact("broken.txt", Some("/files/broken.txt")),
        ];
        let network = MockNetwork::new()
            .with_text(
                "http://ctf.test/files/notes.txt",
                "line1\nline2\nline3\nline4\nline5\nline6\nline7\npassword=hunter2\n",
            )
            .with_text(
                "http://ctf.test/files/index.php",
                "<?php\r\n$user = $_POST['user'];\r\n// TODO: remove admin bypass\r\n?>",
            )
            .with_response(
                "http://ctf.test/files/blob.bin",
                200,
                b"\x00\x01ELF\x02flag{hidden}\x7f\xffab",
            )
            .with_text("http://ctf.test/files/data.b64", "aGVsbG8gd29ybGQ=\n")
            .with_response("http://ctf.test/files/broken.txt", 500, b"oops");
        Self::with(files, network)
    }

    pub fn with(files: Vec<Artifact>, network: MockNetwork) -> Self {
        let challenge = challenge(files.clone());
        Self {
            challenge,
            files: FileStore::new(files).with_origin(Some(ORIGIN.to_string())),
            network,
            settings: TerminalConfig {
                origin: Some(ORIGIN.to_string()),
                ..TerminalConfig::default()
            },
        }
    }

    pub fn env(&mut self) -> Environment<'_> {
        Environment {
            challenge: &self.challenge,
            files: &mut self.files,
            network: &self.network,
            settings: &self.settings,
        }
    }
}

/// Run `line` through a registry with every builtin and return its text.
pub fn run(fx: &mut Fixture, line: &str) -> String {
    let mut reg = CommandRegistry::new();
    crate::register_builtins(&mut reg);
    match reg.execute(line, &mut fx.env()) {
        CommandOutput::Text(s) => s,
        CommandOutput::None => String::new(),
        CommandOutput::Clear => "<clear>".to_string(),
    }
}

//! Challenge data model.
//!
//! Challenges are defined ahead of time in a catalog TOML file and are
//! immutable for the lifetime of a session. The answer key is *not* part
//! of this model; it lives with the validation authority.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CyberlabError, Result};

/// Sub-flag id used when a challenge has a single flag.
pub const MAIN_FLAG_ID: &str = "main";

/// Difficulty tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Expert,
}

/// A named, optionally fetchable file attached to a challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// Declared name, possibly path-like (`web/index.php`).
    pub name: String,
    /// Display-only size label (`"2.1 KB"`).
    #[serde(default)]
    pub size: String,
    /// Fetch location. Relative hrefs are joined to the configured origin.
    #[serde(default)]
    pub href: Option<String>,
}

impl Artifact {
    /// Final path segment of the declared name.
    pub fn basename(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }
}

/// Pointer to a room hosted on an external training platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalRoom {
    pub platform: String,
    pub room_id: String,
    pub room_url: String,
    #[serde(default)]
    pub note: String,
}

/// Public description of one sub-flag (no answer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagSpec {
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub format: String,
}

/// A single challenge as shown to players.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    pub id: String,
    pub title: String,
    pub category: String,
    pub difficulty: Difficulty,
    pub points: u32,
    #[serde(default)]
    pub solved: u32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub hints: Vec<String>,
    #[serde(default)]
    pub files: Vec<Artifact>,
    #[serde(default)]
    pub room_ip: Option<String>,
    #[serde(default)]
    pub external_room: Option<ExternalRoom>,
    /// Named sub-flags. Empty means a single `main` flag.
    #[serde(default)]
    pub flags: Vec<FlagSpec>,
}

impl Challenge {
    /// Whether the challenge is scored as independent named sub-flags.
    pub fn has_sub_flags(&self) -> bool {
        !self.flags.is_empty()
    }

    /// Connection hint shown by the `ip` builtin.
    pub fn connection_hint(&self) -> String {
        if let Some(ip) = self.room_ip.as_deref().filter(|ip| !ip.is_empty()) {
            return ip.to_string();
        }
        match &self.external_room {
            Some(room) => format!("External platform: {}", room.platform),
            None => "Room IP will be available during events".to_string(),
        }
    }

    /// Key under which the completion flag is stored.
    pub fn completion_key(&self) -> String {
        format!("ctf_done_{}", self.id)
    }

    /// Reward badge label shown once the challenge is complete.
    pub fn badge_label(&self) -> String {
        format!("{} Challenger", self.category)
    }
}

/// The full challenge catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub challenges: Vec<Challenge>,
}

impl Catalog {
    /// Parse a catalog from TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        let catalog: Catalog = toml::from_str(text)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Load a catalog from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let catalog = Self::from_toml(&text)?;
        log::info!(
            "Loaded {} challenges from {}",
            catalog.challenges.len(),
            path.display()
        );
        Ok(catalog)
    }

    /// Look up a challenge by id.
    pub fn get(&self, id: &str) -> Option<&Challenge> {
        self.challenges.iter().find(|c| c.id == id)
    }

    fn validate(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for c in &self.challenges {
            if c.id.is_empty() {
                return Err(CyberlabError::Config(format!(
                    "challenge '{}' has an empty id",
                    c.title
                )));
            }
            if !seen.insert(c.id.as_str()) {
                return Err(CyberlabError::Config(format!(
                    "duplicate challenge id: {}",
                    c.id
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"
[[challenges]]
id = "1"
title = "Login Bypass"
category = "Web"
difficulty = "Easy"
points = 100
files = [
    { name = "web/index.php", size = "1 KB", href = "/ctf/1/index.php" },
    { name = "readme.txt", size = "200 B" },
]

[[challenges]]
id = "2"
title = "Payment API Audit"
category = "API"
difficulty = "Hard"
points = 300
room_ip = "10.10.14.2"
flags = [
    { id = "user", description = "User flag", format = "HTB{...}" },
    { id = "root", description = "Root flag", format = "HTB{...}" },
]
"#;

    #[test]
    fn parse_catalog() {
        let catalog = Catalog::from_toml(CATALOG).unwrap();
        assert_eq!(catalog.challenges.len(), 2);
        let c = catalog.get("1").unwrap();
        assert_eq!(c.difficulty, Difficulty::Easy);
        assert_eq!(c.files[0].href.as_deref(), Some("/ctf/1/index.php"));
        assert!(c.files[1].href.is_none());
        assert!(!c.has_sub_flags());
        assert!(catalog.get("2").unwrap().has_sub_flags());
    }

    #[test]
    fn duplicate_ids_rejected() {
        let text = r#"
[[challenges]]
id = "1"
title = "a"
category = "Web"
difficulty = "Easy"
points = 1

[[challenges]]
id = "1"
title = "b"
category = "Web"
difficulty = "Easy"
points = 1
"#;
        assert!(matches!(
            Catalog::from_toml(text),
            Err(CyberlabError::Config(_))
        ));
    }

    #[test]
    fn unknown_difficulty_rejected() {
        let text = r#"
[[challenges]]
id = "1"
title = "a"
category = "Web"
difficulty = "Trivial"
points = 1
"#;
        assert!(Catalog::from_toml(text).is_err());
    }

    #[test]
    fn connection_hint_prefers_room_ip() {
        let catalog = Catalog::from_toml(CATALOG).unwrap();
        assert_eq!(catalog.get("2").unwrap().connection_hint(), "10.10.14.2");
        assert_eq!(
            catalog.get("1").unwrap().connection_hint(),
            "Room IP will be available during events"
        );
    }

    #[test]
    fn connection_hint_external_platform() {
        let mut c = Catalog::from_toml(CATALOG).unwrap().challenges.remove(0);
        c.external_room = Some(ExternalRoom {
            platform: "TryHackMe".into(),
            room_id: "basicpentesting".into(),
            room_url: "https://tryhackme.com/room/basicpentestingjt".into(),
            note: String::new(),
        });
        assert_eq!(c.connection_hint(), "External platform: TryHackMe");
    }

    #[test]
    fn completion_key_and_badge() {
        let catalog = Catalog::from_toml(CATALOG).unwrap();
        let c = catalog.get("1").unwrap();
        assert_eq!(c.completion_key(), "ctf_done_1");
        assert_eq!(c.badge_label(), "Web Challenger");
    }

    #[test]
    fn artifact_basename() {
        let a = Artifact {
            name: "web/admin/index.php".into(),
            size: String::new(),
            href: None,
        };
        assert_eq!(a.basename(), "index.php");
        let b = Artifact {
            name: "flag.txt".into(),
            size: String::new(),
            href: None,
        };
        assert_eq!(b.basename(), "flag.txt");
    }
}

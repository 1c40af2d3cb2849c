//! Server-held answer key.
//!
//! Loaded from TOML:
//!
//! ```toml
//! [challenges."1"]
//! flag = "THM{...}"
//!
//! [challenges."2"]
//! flags = [
//!     { id = "user", token = "HTB{...}" },
//!     { id = "root", token = "HTB{...}", points = 100 },
//! ]
//! ```
//!
//! or imported from the JSON written by the out-of-band mapping tool.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use cyberlab_types::challenge::MAIN_FLAG_ID;
use cyberlab_types::error::{CyberlabError, Result};
use serde::Deserialize;

/// One named sub-flag of a multi-part challenge.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SubFlag {
    pub id: String,
    pub token: String,
    /// Overrides the scoring policy for this sub-flag.
    #[serde(default)]
    pub points: Option<u32>,
}

/// Expected tokens for one challenge.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ChallengeKey {
    /// A single flag, addressed as `main`.
    Single { flag: String },
    /// Ordered sub-flags addressed by id.
    Parts { flags: Vec<SubFlag> },
}

impl ChallengeKey {
    /// Expected token and explicit points for `flag_id`, if the id exists.
    pub fn expected(&self, flag_id: &str) -> Option<(&str, Option<u32>)> {
        match self {
            ChallengeKey::Single { flag } => {
                (flag_id == MAIN_FLAG_ID).then_some((flag.as_str(), None))
            },
            ChallengeKey::Parts { flags } => flags
                .iter()
                .find(|f| f.id == flag_id)
                .map(|f| (f.token.as_str(), f.points)),
        }
    }

    /// Flag ids in declaration order.
    pub fn flag_ids(&self) -> Vec<&str> {
        match self {
            ChallengeKey::Single { .. } => vec![MAIN_FLAG_ID],
            ChallengeKey::Parts { flags } => flags.iter().map(|f| f.id.as_str()).collect(),
        }
    }
}

/// Answer key for every challenge, keyed by challenge id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AnswerKey {
    #[serde(default)]
    pub challenges: BTreeMap<String, ChallengeKey>,
}

/// Shape of the mapping tool's output.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MappingFile {
    #[serde(default)]
    mappings: Vec<Mapping>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Mapping {
    challenge_id: serde_json::Value,
    #[serde(default)]
    flags: Vec<MappedFlag>,
}

#[derive(Debug, Deserialize)]
struct MappedFlag {
    id: String,
    answer: Option<String>,
}

impl AnswerKey {
    pub fn from_toml(text: &str) -> Result<Self> {
        let key: AnswerKey = toml::from_str(text)?;
        key.validate()?;
        Ok(key)
    }

    /// Import the mapping tool's JSON. Flags without an answer are skipped,
    /// and so are challenges left with no flags.
    pub fn from_mapping_json(text: &str) -> Result<Self> {
        let file: MappingFile = serde_json::from_str(text)?;
        let mut challenges = BTreeMap::new();
        for mapping in file.mappings {
            let id = match &mapping.challenge_id {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Number(n) => n.to_string(),
                other => {
                    return Err(CyberlabError::Config(format!(
                        "mapping has a non-scalar challengeId: {other}"
                    )));
                },
            };
            let flags: Vec<SubFlag> = mapping
                .flags
                .into_iter()
                .filter_map(|f| {
                    let token = f.answer.filter(|a| !a.trim().is_empty())?;
                    Some(SubFlag {
                        id: f.id,
                        token,
                        points: None,
                    })
                })
                .collect();
            if flags.is_empty() {
                log::debug!("Mapping for challenge {id} has no answers, skipping");
                continue;
            }
            challenges.insert(id, ChallengeKey::Parts { flags });
        }
        let key = AnswerKey { challenges };
        key.validate()?;
        Ok(key)
    }

    /// Load from a path; `.json` files are read as mapping-tool output.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let key = if path.extension().is_some_and(|e| e.eq_ignore_ascii_case("json")) {
            Self::from_mapping_json(&text)?
        } else {
            Self::from_toml(&text)?
        };
        log::info!(
            "Loaded answer key for {} challenges from {}",
            key.challenges.len(),
            path.display()
        );
        Ok(key)
    }

    pub fn get(&self, challenge_id: &str) -> Option<&ChallengeKey> {
        self.challenges.get(challenge_id)
    }

    fn validate(&self) -> Result<()> {
        for (id, entry) in &self.challenges {
            if id.is_empty() {
                return Err(CyberlabError::Config("answer key has an empty challenge id".into()));
            }
            match entry {
                ChallengeKey::Single { flag } if flag.trim().is_empty() => {
                    return Err(CyberlabError::Config(format!(
                        "challenge {id}: empty flag"
                    )));
                },
                ChallengeKey::Single { .. } => {},
                ChallengeKey::Parts { flags } => {
                    if flags.is_empty() {
                        return Err(CyberlabError::Config(format!(
                            "challenge {id}: no sub-flags"
                        )));
                    }
                    let mut seen = HashSet::new();
                    for f in flags {
                        if f.id.is_empty() || f.token.trim().is_empty() {
                            return Err(CyberlabError::Config(format!(
                                "challenge {id}: sub-flag with empty id or token"
                            )));
                        }
                        if !seen.insert(f.id.as_str()) {
                            return Err(CyberlabError::Config(format!(
                                "challenge {id}: duplicate sub-flag {}",
                                f.id
                            )));
                        }
                    }
                },
            }
        }
        Ok(())
    }
}

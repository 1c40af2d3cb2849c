//! Runtime configuration loaded from `cyberlab.toml`.
//!
//! Every section and field is optional; missing values fall back to the
//! defaults below.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::Result;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CyberlabConfig {
    pub terminal: TerminalConfig,
    pub catalog: CatalogConfig,
    pub submission: SubmissionConfig,
    pub server: ServerConfig,
    pub storage: StorageConfig,
}

impl CyberlabConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load configuration from a file, or return defaults if it is missing.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }
}

/// Interpreter and network settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TerminalConfig {
    /// Base URL that relative artifact hrefs and `curl` targets resolve against.
    pub origin: Option<String>,
    pub fetch_timeout_ms: u64,
    pub ping_timeout_ms: u64,
    pub ping_attempts: u32,
    pub curl_max_chars: usize,
    /// Separator between the challenge title and the echoed input line.
    pub prompt_separator: String,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            origin: None,
            fetch_timeout_ms: 10_000,
            ping_timeout_ms: 2_000,
            ping_attempts: 4,
            curl_max_chars: 2048,
            prompt_separator: " > ".to_string(),
        }
    }
}

impl TerminalConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn ping_timeout(&self) -> Duration {
        Duration::from_millis(self.ping_timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub path: PathBuf,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("config/challenges.toml"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SubmissionConfig {
    /// Full URL of the flag submission endpoint.
    pub endpoint: String,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:3000/api/ctf/submit".to_string(),
        }
    }
}

/// Validation authority settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub answer_key: PathBuf,
    /// Sub-flag id worth `base_points`; every other id earns `privileged_points`.
    pub base_flag_id: String,
    pub base_points: u32,
    pub privileged_points: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
            answer_key: PathBuf::from("config/answers.toml"),
            base_flag_id: "user".to_string(),
            base_points: 50,
            privileged_points: 100,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// JSON file holding per-challenge completion flags.
    pub completion_file: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            completion_file: PathBuf::from(".cyberlab/completed.json"),
        }
    }
}

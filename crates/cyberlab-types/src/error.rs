//! Error types for cyberlab.

use std::io;

/// Errors produced by the cyberlab crates.
#[derive(Debug, thiserror::Error)]
pub enum CyberlabError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("fetch failed: {0}")]
    FetchFailed(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, CyberlabError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display() {
        let e = CyberlabError::NotFound("flag.txt".into());
        assert_eq!(format!("{e}"), "not found: flag.txt");
    }

    #[test]
    fn fetch_failed_display() {
        let e = CyberlabError::FetchFailed("HTTP 404".into());
        assert_eq!(format!("{e}"), "fetch failed: HTTP 404");
    }

    #[test]
    fn transport_error_display() {
        let e = CyberlabError::Transport("connection refused".into());
        assert_eq!(format!("{e}"), "transport error: connection refused");
    }

    #[test]
    fn io_error_from_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "gone");
        let e: CyberlabError = io_err.into();
        let msg = format!("{e}");
        assert!(msg.contains("I/O error"));
        assert!(msg.contains("gone"));
    }

    #[test]
    fn toml_error_from_conversion() {
        let toml_err = toml::from_str::<toml::Value>("this is [[[not valid toml").unwrap_err();
        let e: CyberlabError = toml_err.into();
        assert!(format!("{e}").contains("TOML parse error"));
    }

    #[test]
    fn json_error_from_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let e: CyberlabError = json_err.into();
        assert!(format!("{e}").contains("JSON error"));
    }
}

//! Wire types for `POST /api/ctf/submit`.

use cyberlab_types::challenge::MAIN_FLAG_ID;
use serde::{Deserialize, Serialize};

/// Submission sent by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    pub challenge_id: String,
    pub flag: String,
    pub flag_id: String,
}

impl SubmitRequest {
    /// Build a request, trimming the candidate. `None` targets the main flag.
    pub fn new(challenge_id: &str, flag_id: Option<&str>, candidate: &str) -> Self {
        Self {
            challenge_id: challenge_id.to_string(),
            flag: candidate.trim().to_string(),
            flag_id: flag_id.unwrap_or(MAIN_FLAG_ID).to_string(),
        }
    }
}

/// Verdict returned by the validation authority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub ok: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flag_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<u32>,
}

impl SubmitResponse {
    pub fn accepted(flag_id: &str, points: u32) -> Self {
        Self {
            ok: true,
            message: format!("Correct! {flag_id} flag accepted!"),
            flag_id: Some(flag_id.to_string()),
            points: Some(points),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
            flag_id: None,
            points: None,
        }
    }
}

//! Submission client.
//!
//! One request per submission, no retries and no client-side timeout beyond
//! the transport's own.

use crate::protocol::{SubmitRequest, SubmitResponse};
use crate::validator::Validator;

/// Why a submission produced no verdict.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    /// The endpoint rejected the request itself (HTTP 4xx).
    #[error("submission rejected: {0}")]
    Protocol(String),

    /// The endpoint failed internally (HTTP 5xx).
    #[error("server error: {0}")]
    Server(String),

    /// The request never completed.
    #[error("transport error: {0}")]
    Transport(String),
}

/// Sends a submission and returns the verdict.
pub trait SubmissionClient {
    fn submit(&self, req: &SubmitRequest) -> Result<SubmitResponse, SubmitError>;
}

/// Classify a non-2xx answer by status class.
fn status_error(status: u16, message: String) -> SubmitError {
    if (400..500).contains(&status) {
        SubmitError::Protocol(message)
    } else {
        SubmitError::Server(message)
    }
}

// ---------------------------------------------------------------------------
// HTTP
// ---------------------------------------------------------------------------

/// Posts JSON to the validation endpoint with `ureq`.
pub struct HttpSubmitter {
    endpoint: String,
    agent: ureq::Agent,
}

impl HttpSubmitter {
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            agent: ureq::AgentBuilder::new().build(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl SubmissionClient for HttpSubmitter {
    fn submit(&self, req: &SubmitRequest) -> Result<SubmitResponse, SubmitError> {
        log::info!(
            "Submitting challenge {} flag {} to {}",
            req.challenge_id,
            req.flag_id,
            self.endpoint
        );
        match self.agent.post(&self.endpoint).send_json(req) {
            Ok(resp) => resp
                .into_json::<SubmitResponse>()
                .map_err(|e| {
                    log::warn!("Submission endpoint sent an unreadable verdict: {e}");
                    SubmitError::Server(format!("unreadable verdict: {e}"))
                }),
            Err(ureq::Error::Status(status, resp)) => {
                let message = resp
                    .into_json::<SubmitResponse>()
                    .map(|r| r.message)
                    .unwrap_or_else(|_| format!("HTTP {status}"));
                log::warn!("Submission endpoint answered HTTP {status}: {message}");
                Err(status_error(status, message))
            },
            Err(ureq::Error::Transport(t)) => {
                log::warn!("Submission transport failure: {t}");
                Err(SubmitError::Transport(t.to_string()))
            },
        }
    }
}

// ---------------------------------------------------------------------------
// In-process
// ---------------------------------------------------------------------------

/// Validates against a local answer key without any network hop.
///
/// Used for offline play; status classes map exactly as over HTTP.
pub struct LocalSubmitter {
    validator: Validator,
}

impl LocalSubmitter {
    pub fn new(validator: Validator) -> Self {
        Self { validator }
    }
}

impl SubmissionClient for LocalSubmitter {
    fn submit(&self, req: &SubmitRequest) -> Result<SubmitResponse, SubmitError> {
        let verdict = self.validator.validate(req);
        if verdict.status == 200 {
            Ok(verdict.response)
        } else {
            Err(status_error(verdict.status, verdict.response.message))
        }
    }
}

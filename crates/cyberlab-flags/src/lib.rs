//! Flag submission protocol.
//!
//! The client sends `{challengeId, flag, flagId}` to the validation
//! authority, which compares the trimmed token against its answer key and
//! answers `{ok, message, flagId?, points?}`. A wrong flag is an ordinary
//! negative verdict (`ok: false`, HTTP 200). Malformed requests are 400s and
//! internal faults 500s.

pub mod answer_key;
pub mod client;
pub mod protocol;
pub mod server;
pub mod validator;

pub use answer_key::{AnswerKey, ChallengeKey, SubFlag};
pub use client::{HttpSubmitter, LocalSubmitter, SubmissionClient, SubmitError};
pub use protocol::{SubmitRequest, SubmitResponse};
pub use validator::{ScoringPolicy, Validator, Verdict};

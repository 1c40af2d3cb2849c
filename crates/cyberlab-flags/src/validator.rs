//! Submission validation against the answer key.

use cyberlab_types::challenge::MAIN_FLAG_ID;
use cyberlab_types::config::ServerConfig;
use serde_json::Value;

use crate::answer_key::AnswerKey;
use crate::protocol::{SubmitRequest, SubmitResponse};

/// Points awarded per accepted flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoringPolicy {
    /// The one sub-flag id worth `base_points` (the foothold flag).
    pub base_flag_id: String,
    pub base_points: u32,
    /// Every other flag id, `main` included.
    pub privileged_points: u32,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self::from(&ServerConfig::default())
    }
}

impl From<&ServerConfig> for ScoringPolicy {
    fn from(cfg: &ServerConfig) -> Self {
        Self {
            base_flag_id: cfg.base_flag_id.clone(),
            base_points: cfg.base_points,
            privileged_points: cfg.privileged_points,
        }
    }
}

impl ScoringPolicy {
    pub fn points_for(&self, flag_id: &str, explicit: Option<u32>) -> u32 {
        explicit.unwrap_or(if flag_id == self.base_flag_id {
            self.base_points
        } else {
            self.privileged_points
        })
    }
}

/// HTTP status plus the JSON body to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub status: u16,
    pub response: SubmitResponse,
}

impl Verdict {
    fn ok(response: SubmitResponse) -> Self {
        Self {
            status: 200,
            response,
        }
    }

    fn bad_request(message: &str) -> Self {
        Self {
            status: 400,
            response: SubmitResponse::rejected(message),
        }
    }

    pub fn server_error() -> Self {
        Self {
            status: 500,
            response: SubmitResponse::rejected("Server error"),
        }
    }
}

/// A string or number field. Empty strings and zero count as absent.
fn scalar(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        _ => None,
    }
}

/// The validation authority.
#[derive(Debug, Clone)]
pub struct Validator {
    key: AnswerKey,
    policy: ScoringPolicy,
}

impl Validator {
    pub fn new(key: AnswerKey, policy: ScoringPolicy) -> Self {
        Self { key, policy }
    }

    pub fn answer_key(&self) -> &AnswerKey {
        &self.key
    }

    /// Validate a decoded request body of any JSON shape.
    pub fn validate_value(&self, body: &Value) -> Verdict {
        let (Some(challenge_id), Some(flag)) = (
            scalar(body.get("challengeId")),
            scalar(body.get("flag")),
        ) else {
            return Verdict::bad_request("Missing challenge ID or flag");
        };
        let flag_id = match body.get("flagId") {
            None | Some(Value::Null) => MAIN_FLAG_ID.to_string(),
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(_) => return self.judge_unknown_flag(&challenge_id),
        };
        self.judge(&challenge_id, &flag_id, &flag)
    }

    pub fn validate(&self, req: &SubmitRequest) -> Verdict {
        if req.challenge_id.is_empty() || req.flag.is_empty() {
            return Verdict::bad_request("Missing challenge ID or flag");
        }
        self.judge(&req.challenge_id, &req.flag_id, &req.flag)
    }

    fn judge_unknown_flag(&self, challenge_id: &str) -> Verdict {
        if self.key.get(challenge_id).is_none() {
            return Verdict::bad_request("Invalid challenge ID");
        }
        Verdict::bad_request("Invalid flag ID")
    }

    fn judge(&self, challenge_id: &str, flag_id: &str, candidate: &str) -> Verdict {
        let Some(entry) = self.key.get(challenge_id) else {
            log::info!("Submission for unknown challenge {challenge_id}");
            return Verdict::bad_request("Invalid challenge ID");
        };
        let Some((expected, explicit_points)) = entry.expected(flag_id) else {
            log::info!("Submission for unknown flag {flag_id} of challenge {challenge_id}");
            return Verdict::bad_request("Invalid flag ID");
        };

        if candidate.trim() == expected {
            let points = self.policy.points_for(flag_id, explicit_points);
            log::info!("Challenge {challenge_id} flag {flag_id}: accepted ({points} points)");
            Verdict::ok(SubmitResponse::accepted(flag_id, points))
        } else {
            log::info!("Challenge {challenge_id} flag {flag_id}: rejected");
            Verdict::ok(SubmitResponse::rejected(format!(
                "Incorrect {flag_id} flag. Try again!"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const KEY: &str = r#"
[challenges."1"]
flag = "THM{FLAG_ONE}"

[challenges."2"]
flags = [
    { id = "user", token = "HTB{FLAG_USER}" },
    { id = "root", token = "HTB{FLAG_ROOT}" },
]
"#;

    fn validator() -> Validator {
        Validator::new(AnswerKey::from_toml(KEY).unwrap(), ScoringPolicy::default())
    }

    #[test]
    fn correct_main_flag() {
        let v = validator().validate_value(&json!({"challengeId": "1", "flag": "THM{FLAG_ONE}"}));
        assert_eq!(v.status, 200);
        assert!(v.response.ok);
        assert_eq!(v.response.message, "Correct! main flag accepted!");
        assert_eq!(v.response.flag_id.as_deref(), Some("main"));
        assert_eq!(v.response.points, Some(100));
    }

    #[test]
    fn candidate_is_trimmed() {
        let v = validator().validate_value(&json!({"challengeId": 1, "flag": "  THM{FLAG_ONE}\n"}));
        assert!(v.response.ok);
    }

    #[test]
    fn comparison_is_case_sensitive() {
        let v = validator().validate_value(&json!({"challengeId": "1", "flag": "thm{flag_one}"}));
        assert_eq!(v.status, 200);
        assert!(!v.response.ok);
        assert_eq!(v.response.message, "Incorrect main flag. Try again!");
        assert_eq!(v.response.points, None);
    }

    #[test]
    fn partial_credit_per_sub_flag() {
        let val = validator();
        let user = val.validate_value(
            &json!({"challengeId": "2", "flag": "HTB{FLAG_USER}", "flagId": "user"}),
        );
        assert_eq!(user.response.points, Some(50));
        assert_eq!(user.response.message, "Correct! user flag accepted!");
        let root = val.validate_value(
            &json!({"challengeId": "2", "flag": "HTB{FLAG_ROOT}", "flagId": "root"}),
        );
        assert_eq!(root.response.points, Some(100));
        let wrong = val.validate_value(
            &json!({"challengeId": "2", "flag": "HTB{FLAG_USER}", "flagId": "root"}),
        );
        assert!(!wrong.response.ok);
        assert_eq!(wrong.response.message, "Incorrect root flag. Try again!");
    }

    #[test]
    fn missing_fields_are_bad_requests() {
        let val = validator();
        for body in [
            json!({}),
            json!({"challengeId": "1"}),
            json!({"flag": "x"}),
            json!({"challengeId": "", "flag": "x"}),
            json!({"challengeId": "1", "flag": ""}),
            json!(null),
            json!([1, 2]),
        ] {
            let v = val.validate_value(&body);
            assert_eq!(v.status, 400, "{body}");
            assert_eq!(v.response.message, "Missing challenge ID or flag");
        }
    }

    #[test]
    fn unknown_ids_are_bad_requests() {
        let val = validator();
        let v = val.validate_value(&json!({"challengeId": "99", "flag": "x"}));
        assert_eq!((v.status, v.response.message.as_str()), (400, "Invalid challenge ID"));
        let v = val.validate_value(&json!({"challengeId": "2", "flag": "x"}));
        assert_eq!((v.status, v.response.message.as_str()), (400, "Invalid flag ID"));
        let v = val.validate_value(&json!({"challengeId": "2", "flag": "x", "flagId": "admin"}));
        assert_eq!(v.response.message, "Invalid flag ID");
        let v = val.validate_value(&json!({"challengeId": "2", "flag": "x", "flagId": ["user"]}));
        assert_eq!(v.response.message, "Invalid flag ID");
    }

    #[test]
    fn null_flag_id_means_main() {
        let v = validator()
            .validate_value(&json!({"challengeId": "1", "flag": "THM{FLAG_ONE}", "flagId": null}));
        assert!(v.response.ok);
    }

    #[test]
    fn explicit_points_override_policy() {
        let key = AnswerKey::from_toml(
            "[challenges.\"5\"]\nflags = [{ id = \"user\", token = \"t\", points = 75 }]\n",
        )
        .unwrap();
        let v = Validator::new(key, ScoringPolicy::default())
            .validate(&SubmitRequest::new("5", Some("user"), "t"));
        assert_eq!(v.response.points, Some(75));
    }

    #[test]
    fn policy_comes_from_server_config() {
        let cfg = ServerConfig {
            base_flag_id: "foothold".into(),
            base_points: 10,
            privileged_points: 30,
            ..ServerConfig::default()
        };
        let policy = ScoringPolicy::from(&cfg);
        assert_eq!(policy.points_for("foothold", None), 10);
        assert_eq!(policy.points_for("user", None), 30);
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn any_single_char_change_is_rejected(
                idx in 0usize..13,
                replacement in proptest::char::range('!', '~'),
            ) {
                let expected = "THM{FLAG_ONE}";
                let mut chars: Vec<char> = expected.chars().collect();
                prop_assume!(chars[idx] != replacement);
                chars[idx] = replacement;
                let candidate: String = chars.into_iter().collect();
                let v = validator().validate_value(&json!({"challengeId": "1", "flag": candidate}));
                prop_assert_eq!(v.status, 200);
                prop_assert!(!v.response.ok);
            }

            #[test]
            fn surrounding_whitespace_never_matters(pad in "[ \t\n]{0,4}") {
                let candidate = format!("{pad}HTB{{FLAG_ROOT}}{pad}");
                let v = validator().validate_value(
                    &json!({"challengeId": "2", "flag": candidate, "flagId": "root"}),
                );
                prop_assert!(v.response.ok);
            }
        }
    }
}

//! Challenge host: the terminal session plus flag submission state.

use std::collections::BTreeMap;

use cyberlab_flags::{SubmissionClient, SubmitError, SubmitRequest};
use cyberlab_platform::KeyValueStore;
use cyberlab_terminal::TerminalSession;
use cyberlab_types::challenge::Challenge;

/// Initial status line.
pub const READY_BANNER: &str = "Ready. Type commands to interact with the challenge...";

/// Prefix of the in-terminal submission command.
pub const SUBMIT_PREFIX: &str = ":submit";

/// Outcome of one named sub-flag submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagResult {
    pub success: bool,
    pub message: String,
}

/// One open challenge view.
pub struct ChallengeHost {
    session: TerminalSession,
    store: Box<dyn KeyValueStore>,
    client: Box<dyn SubmissionClient>,
    status: String,
    results: BTreeMap<String, FlagResult>,
    submitted: Option<bool>,
    completed: bool,
}

impl ChallengeHost {
    pub fn new(
        session: TerminalSession,
        store: Box<dyn KeyValueStore>,
        client: Box<dyn SubmissionClient>,
    ) -> Self {
        let completed = store.get(&session.challenge().completion_key());
        Self {
            session,
            store,
            client,
            status: READY_BANNER.to_string(),
            results: BTreeMap::new(),
            submitted: None,
            completed,
        }
    }

    pub fn session(&self) -> &TerminalSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut TerminalSession {
        &mut self.session
    }

    pub fn challenge(&self) -> &Challenge {
        self.session.challenge()
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn results(&self) -> &BTreeMap<String, FlagResult> {
        &self.results
    }

    /// Verdict of the last main-flag submission, if any.
    pub fn submitted(&self) -> Option<bool> {
        self.submitted
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Reward badge shown once the challenge is completed.
    pub fn badge(&self) -> Option<String> {
        self.completed.then(|| self.challenge().badge_label())
    }

    /// Enter key: run the input line, or submit a flag for `:submit` lines.
    ///
    /// Submission lines never reach the scrollback or the recall list.
    pub fn enter(&mut self) {
        let line = self.session.input().to_string();
        let Some(rest) = line.trim_start().strip_prefix(SUBMIT_PREFIX) else {
            self.session.enter();
            return;
        };
        if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
            self.session.enter();
            return;
        }
        self.session.set_input("");
        let (flag_id, candidate) = self.parse_submission(rest);
        self.submit(flag_id.as_deref(), &candidate);
    }

    /// `[flag-id] <flag>`: a leading token naming a declared sub-flag
    /// selects it, anything else targets the main flag.
    fn parse_submission(&self, rest: &str) -> (Option<String>, String) {
        let rest = rest.trim();
        if let Some((first, tail)) = rest.split_once(char::is_whitespace) {
            let declared = self.challenge().flags.iter().any(|f| f.id == first);
            if declared {
                return (Some(first.to_string()), tail.trim().to_string());
            }
        }
        (None, rest.to_string())
    }

    /// Submit `candidate` for a named sub-flag, or for the main flag when
    /// `flag_id` is `None`. Blank candidates send nothing.
    pub fn submit(&mut self, flag_id: Option<&str>, candidate: &str) {
        if candidate.trim().is_empty() {
            return;
        }
        let req = SubmitRequest::new(&self.challenge().id, flag_id, candidate);
        let outcome = self.client.submit(&req);

        match flag_id {
            Some(id) => {
                let result = match outcome {
                    Ok(resp) => FlagResult {
                        success: resp.ok,
                        message: if !resp.message.is_empty() {
                            resp.message
                        } else if resp.ok {
                            "Correct!".to_string()
                        } else {
                            "Incorrect flag".to_string()
                        },
                    },
                    Err(SubmitError::Protocol(message) | SubmitError::Server(message)) => {
                        FlagResult {
                            success: false,
                            message,
                        }
                    },
                    Err(SubmitError::Transport(_)) => FlagResult {
                        success: false,
                        message: "Error submitting flag".to_string(),
                    },
                };
                self.results.insert(id.to_string(), result);
            },
            None => match outcome {
                Ok(resp) if resp.ok => {
                    self.submitted = Some(true);
                    self.mark_completed();
                    self.status = format!(
                        "✅ Correct! Flag accepted. You earned {} points.",
                        self.challenge().points
                    );
                },
                Ok(_) | Err(SubmitError::Protocol(_)) => {
                    self.submitted = Some(false);
                    self.status = "❌ Incorrect flag. Try again.".to_string();
                },
                Err(e) => {
                    log::warn!("Main flag submission failed: {e}");
                    self.submitted = Some(false);
                    self.status = "❌ Submission failed. Please try again later.".to_string();
                },
            },
        }
    }

    /// Set and persist the completion flag. Written once, on first success.
    fn mark_completed(&mut self) {
        if self.completed {
            return;
        }
        self.completed = true;
        let key = self.challenge().completion_key();
        if let Err(e) = self.store.set(&key, true) {
            log::warn!("Failed to persist completion for {key}: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use cyberlab_flags::{AnswerKey, LocalSubmitter, ScoringPolicy, SubmitResponse, Validator};
    use cyberlab_platform::MemoryStore;
    use cyberlab_platform::mock::MockNetwork;
    use cyberlab_types::challenge::{Catalog, FlagSpec};
    use cyberlab_types::config::TerminalConfig;

    const CATALOG: &str = r#"
[[challenges]]
id = "1"
title = "Basic Pentesting"
category = "Web"
difficulty = "Easy"
points = 100

[[challenges]]
id = "2"
title = "Postman"
category = "Network"
difficulty = "Medium"
points = 150
flags = [
    { id = "user", description = "User flag" },
    { id = "root", description = "Root flag" },
]
"#;

    const KEY: &str = r#"
[challenges."1"]
flag = "THM{ONE}"

[challenges."2"]
flags = [{ id = "user", token = "HTB{U}" }, { id = "root", token = "HTB{R}" }]
"#;

    /// Store whose contents stay visible to the test after being boxed.
    #[derive(Clone, Default)]
    struct SharedStore(Rc<RefCell<MemoryStore>>);

    impl KeyValueStore for SharedStore {
        fn get(&self, key: &str) -> bool {
            self.0.borrow().get(key)
        }
        fn set(&mut self, key: &str, value: bool) -> cyberlab_types::error::Result<()> {
            self.0.borrow_mut().set(key, value)
        }
    }

    /// Store that counts writes.
    #[derive(Clone, Default)]
    struct CountingStore {
        inner: SharedStore,
        writes: Rc<Cell<usize>>,
    }

    impl KeyValueStore for CountingStore {
        fn get(&self, key: &str) -> bool {
            self.inner.get(key)
        }
        fn set(&mut self, key: &str, value: bool) -> cyberlab_types::error::Result<()> {
            self.writes.set(self.writes.get() + 1);
            self.inner.set(key, value)
        }
    }

    /// Client that always fails the same way.
    struct FailingClient(SubmitError);

    impl SubmissionClient for FailingClient {
        fn submit(&self, _req: &SubmitRequest) -> Result<SubmitResponse, SubmitError> {
            Err(self.0.clone())
        }
    }

    fn challenge(id: &str) -> Challenge {
        Catalog::from_toml(CATALOG).unwrap().get(id).unwrap().clone()
    }

    fn host_with(
        id: &str,
        store: Box<dyn KeyValueStore>,
        client: Box<dyn SubmissionClient>,
    ) -> ChallengeHost {
        let session = TerminalSession::new(
            challenge(id),
            Box::new(MockNetwork::new()),
            TerminalConfig::default(),
        );
        ChallengeHost::new(session, store, client)
    }

    fn local_client() -> Box<dyn SubmissionClient> {
        let validator = Validator::new(AnswerKey::from_toml(KEY).unwrap(), ScoringPolicy::default());
        Box::new(LocalSubmitter::new(validator))
    }

    fn host(id: &str) -> ChallengeHost {
        host_with(id, Box::new(MemoryStore::new()), local_client())
    }

    #[test]
    fn starts_with_banner() {
        let h = host("1");
        assert_eq!(h.status(), READY_BANNER);
        assert!(h.session().scrollback().is_empty());
        assert_eq!(h.badge(), None);
    }

    #[test]
    fn correct_main_flag_completes() {
        let store = SharedStore::default();
        let mut h = host_with("1", Box::new(store.clone()), local_client());
        h.submit(None, "  THM{ONE} ");
        assert_eq!(
            h.status(),
            "✅ Correct! Flag accepted. You earned 100 points."
        );
        assert_eq!(h.submitted(), Some(true));
        assert!(h.is_completed());
        assert_eq!(h.badge().as_deref(), Some("Web Challenger"));
        assert!(store.get("ctf_done_1"));
    }

    #[test]
    fn completion_survives_reopen() {
        let store = SharedStore::default();
        host_with("1", Box::new(store.clone()), local_client()).submit(None, "THM{ONE}");
        let reopened = host_with("1", Box::new(store), local_client());
        assert!(reopened.is_completed());
    }

    #[test]
    fn wrong_main_flag() {
        let mut h = host("1");
        h.submit(None, "THM{TWO}");
        assert_eq!(h.status(), "❌ Incorrect flag. Try again.");
        assert_eq!(h.submitted(), Some(false));
        assert!(!h.is_completed());
    }

    #[test]
    fn blank_candidate_sends_nothing() {
        let mut h = host_with(
            "1",
            Box::new(MemoryStore::new()),
            Box::new(FailingClient(SubmitError::Transport("boom".into()))),
        );
        h.submit(None, "   ");
        assert_eq!(h.status(), READY_BANNER);
        assert_eq!(h.submitted(), None);
    }

    #[test]
    fn transport_failure_on_main() {
        let mut h = host_with(
            "1",
            Box::new(MemoryStore::new()),
            Box::new(FailingClient(SubmitError::Transport("refused".into()))),
        );
        h.submit(None, "THM{ONE}");
        assert_eq!(h.status(), "❌ Submission failed. Please try again later.");
    }

    #[test]
    fn unreadable_verdict_is_a_failure_not_a_wrong_flag() {
        let mut h = host_with(
            "1",
            Box::new(MemoryStore::new()),
            Box::new(FailingClient(SubmitError::Server(
                "unreadable verdict: expected value".into(),
            ))),
        );
        h.submit(None, "THM{ONE}");
        assert_eq!(h.status(), "❌ Submission failed. Please try again later.");
        assert!(!h.is_completed());
    }

    #[test]
    fn completion_is_written_once() {
        let store = CountingStore::default();
        let mut h = host_with("1", Box::new(store.clone()), local_client());
        h.submit(None, "THM{ONE}");
        h.submit(None, "THM{ONE}");
        assert!(h.is_completed());
        assert_eq!(store.writes.get(), 1);

        let mut reopened = host_with("1", Box::new(store.clone()), local_client());
        reopened.submit(None, "THM{ONE}");
        assert_eq!(store.writes.get(), 1);
    }

    #[test]
    fn sub_flags_tracked_independently() {
        let mut h = host("2");
        h.submit(Some("user"), "HTB{U}");
        h.submit(Some("root"), "HTB{nope}");
        assert_eq!(
            h.results()["user"],
            FlagResult {
                success: true,
                message: "Correct! user flag accepted!".into()
            }
        );
        assert_eq!(
            h.results()["root"],
            FlagResult {
                success: false,
                message: "Incorrect root flag. Try again!".into()
            }
        );
        // Sub-flags alone never mark the challenge complete.
        h.submit(Some("root"), "HTB{R}");
        assert!(h.results()["root"].success);
        assert!(!h.is_completed());
        assert_eq!(h.status(), READY_BANNER);
    }

    #[test]
    fn sub_flag_transport_failure() {
        let mut h = host_with(
            "2",
            Box::new(MemoryStore::new()),
            Box::new(FailingClient(SubmitError::Transport("refused".into()))),
        );
        h.submit(Some("user"), "HTB{U}");
        assert_eq!(h.results()["user"].message, "Error submitting flag");
    }

    #[test]
    fn submit_line_targets_declared_sub_flag() {
        let mut h = host("2");
        h.session_mut().set_input(":submit user HTB{U}");
        h.enter();
        assert!(h.results()["user"].success);
        assert_eq!(h.session().input(), "");
        assert!(h.session().scrollback().is_empty());
    }

    #[test]
    fn submit_line_defaults_to_main() {
        let mut h = host("1");
        h.session_mut().set_input(":submit THM{ONE}");
        h.enter();
        assert!(h.is_completed());
    }

    #[test]
    fn other_lines_run_in_terminal() {
        let mut h = host("1");
        h.session_mut().set_input(":submitx");
        h.enter();
        assert_eq!(h.session().scrollback().len(), 2);
        h.session_mut().set_input("echo hi");
        h.enter();
        assert_eq!(h.session().transcript().lines().last(), Some("hi"));
    }

    #[test]
    fn flag_specs_come_from_catalog() {
        let c = challenge("2");
        assert_eq!(
            c.flags.iter().map(|f: &FlagSpec| f.id.as_str()).collect::<Vec<_>>(),
            vec!["user", "root"]
        );
    }
}

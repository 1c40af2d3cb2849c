//! Scripted network double for tests.

use std::cell::RefCell;
use std::collections::HashMap;
use std::time::Duration;

use cyberlab_types::error::{CyberlabError, Result};

use crate::services::{HttpResponse, NetworkService};

/// A [`NetworkService`] that answers from a fixed route table and counts
/// every request it sees. Unknown URLs fail as transport errors.
#[derive(Debug, Default)]
pub struct MockNetwork {
    routes: HashMap<String, HttpResponse>,
    requests: RefCell<Vec<String>>,
}

impl MockNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` with status 200 at `url`.
    pub fn with_text(mut self, url: &str, body: &str) -> Self {
        self.routes.insert(
            url.to_string(),
            HttpResponse {
                status_code: 200,
                body: body.as_bytes().to_vec(),
            },
        );
        self
    }

    /// Serve raw bytes with an explicit status at `url`.
    pub fn with_response(mut self, url: &str, status_code: u16, body: &[u8]) -> Self {
        self.routes.insert(
            url.to_string(),
            HttpResponse {
                status_code,
                body: body.to_vec(),
            },
        );
        self
    }

    /// Number of requests made for `url`.
    pub fn hits(&self, url: &str) -> usize {
        self.requests.borrow().iter().filter(|u| *u == url).count()
    }

    /// Total number of requests made.
    pub fn total_requests(&self) -> usize {
        self.requests.borrow().len()
    }
}

impl NetworkService for MockNetwork {
    fn http_get(&self, url: &str, _timeout: Duration) -> Result<HttpResponse> {
        self.requests.borrow_mut().push(url.to_string());
        self.routes
            .get(url)
            .cloned()
            .ok_or_else(|| CyberlabError::Transport(format!("connection refused: {url}")))
    }
}

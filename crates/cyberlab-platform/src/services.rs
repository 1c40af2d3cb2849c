//! Network service trait and desktop implementation.

use std::io::Read;
use std::time::Duration;

use cyberlab_types::error::{CyberlabError, Result};

/// Upper bound on a response body read into memory.
const MAX_BODY_BYTES: u64 = 16 * 1024 * 1024;

/// HTTP response from a network service.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code (e.g. 200, 404).
    pub status_code: u16,
    /// Response body as bytes.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Body decoded as text. Invalid UTF-8 sequences become U+FFFD.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Abstraction over outbound HTTP.
///
/// Any response, whatever its status, is `Ok`. `Err` means the request never
/// produced a response (DNS, connect, TLS, timeout).
pub trait NetworkService {
    /// Perform a blocking HTTP GET bounded by `timeout`.
    fn http_get(&self, url: &str, timeout: Duration) -> Result<HttpResponse>;
}

/// Desktop network service backed by a shared `ureq` agent.
pub struct UreqNetwork {
    agent: ureq::Agent,
}

impl UreqNetwork {
    pub fn new() -> Self {
        Self {
            agent: ureq::AgentBuilder::new().redirects(5).build(),
        }
    }
}

impl Default for UreqNetwork {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkService for UreqNetwork {
    fn http_get(&self, url: &str, timeout: Duration) -> Result<HttpResponse> {
        log::debug!("GET {url}");
        let response = match self.agent.get(url).timeout(timeout).call() {
            Ok(resp) => resp,
            // Non-2xx statuses still carry a body worth showing.
            Err(ureq::Error::Status(_, resp)) => resp,
            Err(ureq::Error::Transport(t)) => {
                return Err(CyberlabError::Transport(t.to_string()));
            },
        };
        let status_code = response.status();
        let mut body = Vec::new();
        response
            .into_reader()
            .take(MAX_BODY_BYTES)
            .read_to_end(&mut body)?;
        Ok(HttpResponse { status_code, body })
    }
}

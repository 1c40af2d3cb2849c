//! Network builtins: ping, curl.
//!
//! Both go through the session's [`NetworkService`](cyberlab_platform::NetworkService),
//! one request at a time.

use std::time::Instant;

use cyberlab_vfs::join_origin;
use rand::Rng;

use crate::error::CommandError;
use crate::interpreter::{Command, CommandOutput, CommandRegistry, Environment};

/// Register ping, curl.
pub fn register_network_commands(reg: &mut CommandRegistry) {
    reg.register(Box::new(PingCmd));
    reg.register(Box::new(CurlCmd));
}

// ---------------------------------------------------------------------------
// ping
// ---------------------------------------------------------------------------

/// Probe URL for a host: kept as-is when it already carries a scheme.
fn probe_url(host: &str) -> String {
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{host}")
    }
}

struct PingCmd;
impl Command for PingCmd {
    fn name(&self) -> &str {
        "ping"
    }
    fn description(&self) -> &str {
        "Measure reachability (simulated)"
    }
    fn usage(&self) -> &str {
        "ping <host>"
    }
    fn execute(
        &self,
        args: &[&str],
        env: &mut Environment<'_>,
    ) -> Result<CommandOutput, CommandError> {
        let Some(&host) = args.first() else {
            return Err(CommandError::Usage(self.usage().to_string()));
        };
        let url = probe_url(host);
        let timeout = env.settings.ping_timeout();
        let mut rng = rand::thread_rng();
        let mut lines = Vec::with_capacity(env.settings.ping_attempts as usize);

        // One probe at a time, in order.
        for attempt in 0..env.settings.ping_attempts {
            let started = Instant::now();
            match env.network.http_get(&url, timeout) {
                Ok(_) => {
                    let ms = started.elapsed().as_millis();
                    lines.push(format!("Reply from {host}: time={ms}ms"));
                },
                Err(e) => {
                    log::debug!("ping {url} attempt {attempt} failed: {e}");
                    let simulated: u32 = rng.gen_range(20..80);
                    lines.push(format!(
                        "Request to {host} timed out (unreachable or cross-origin blocked). Simulated time={simulated}ms"
                    ));
                },
            }
        }
        Ok(CommandOutput::Text(lines.join("\n")))
    }
}

// ---------------------------------------------------------------------------
// curl
// ---------------------------------------------------------------------------

/// Keep at most `max` characters, marking the cut.
fn truncate_body(body: &str, max: usize) -> String {
    match body.char_indices().nth(max) {
        Some((cut, _)) => format!("{}\n... [truncated]", &body[..cut]),
        None => body.to_string(),
    }
}

struct CurlCmd;
impl Command for CurlCmd {
    fn name(&self) -> &str {
        "curl"
    }
    fn description(&self) -> &str {
        "Fetch URL (CORS dependent)"
    }
    fn usage(&self) -> &str {
        "curl <url>"
    }
    fn execute(
        &self,
        args: &[&str],
        env: &mut Environment<'_>,
    ) -> Result<CommandOutput, CommandError> {
        let Some(&target) = args.first() else {
            return Err(CommandError::Usage(self.usage().to_string()));
        };
        let url = join_origin(env.settings.origin.as_deref(), target);
        let resp = env
            .network
            .http_get(&url, env.settings.fetch_timeout())
            .map_err(|e| {
                log::debug!("curl {url} failed: {e}");
                CommandError::Network(
                    "curl: failed (likely blocked by cross-origin restriction)".to_string(),
                )
            })?;
        let body = truncate_body(&resp.text(), env.settings.curl_max_chars);
        Ok(CommandOutput::Text(format!(
            "HTTP/{}\n{body}",
            resp.status_code
        )))
    }
}

//! Artifact lookup and the per-session content cache.

use std::borrow::Cow;
use std::collections::HashMap;
use std::time::Duration;

use cyberlab_platform::NetworkService;
use cyberlab_types::challenge::Artifact;
use cyberlab_types::error::{CyberlabError, Result};

/// Default bound on a single artifact fetch.
const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Fold runs of backslashes into a single forward slash.
///
/// Returns the input unchanged (zero-alloc) when it has no backslash.
pub fn normalize_name(name: &str) -> Cow<'_, str> {
    if !name.contains('\\') {
        return Cow::Borrowed(name);
    }
    let mut result = String::with_capacity(name.len());
    let mut prev_backslash = false;
    for ch in name.chars() {
        if ch == '\\' {
            if !prev_backslash {
                result.push('/');
            }
            prev_backslash = true;
        } else {
            result.push(ch);
            prev_backslash = false;
        }
    }
    Cow::Owned(result)
}

/// Resolve `target` against `origin` unless it is already absolute.
pub fn join_origin(origin: Option<&str>, target: &str) -> String {
    if target.starts_with("http://") || target.starts_with("https://") {
        return target.to_string();
    }
    match origin {
        Some(origin) => format!(
            "{}/{}",
            origin.trim_end_matches('/'),
            target.trim_start_matches('/')
        ),
        None => target.to_string(),
    }
}

/// Challenge-scoped file store.
///
/// Owns a copy of the challenge's artifact list and a cache of fetched
/// text. The cache lives as long as the store; drop the store (or call
/// [`FileStore::clear_cache`]) when the challenge view changes.
pub struct FileStore {
    artifacts: Vec<Artifact>,
    origin: Option<String>,
    timeout: Duration,
    cache: HashMap<String, String>,
}

impl FileStore {
    pub fn new(artifacts: Vec<Artifact>) -> Self {
        Self {
            artifacts,
            origin: None,
            timeout: DEFAULT_FETCH_TIMEOUT,
            cache: HashMap::new(),
        }
    }

    /// Base URL for relative artifact hrefs.
    pub fn with_origin(mut self, origin: Option<String>) -> Self {
        self.origin = origin;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Declared artifacts in declaration order.
    pub fn artifacts(&self) -> &[Artifact] {
        &self.artifacts
    }

    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    /// Find the artifact a user-typed name refers to.
    ///
    /// Exact match on the declared name wins. Otherwise the final path
    /// segment of `name` is matched against declared names, either exactly
    /// or as a `/`-separated suffix; the first declared match is returned.
    pub fn resolve(&self, name: &str) -> Option<&Artifact> {
        let normalized = normalize_name(name);
        if let Some(exact) = self
            .artifacts
            .iter()
            .find(|a| a.name == name || a.name == *normalized)
        {
            return Some(exact);
        }
        let base = normalized.rsplit('/').next().unwrap_or(&normalized);
        if base.is_empty() {
            return None;
        }
        let suffix = format!("/{base}");
        self.artifacts
            .iter()
            .find(|a| a.name == base || a.name.ends_with(&suffix))
    }

    /// Whether the artifact `name` resolves to is already cached.
    pub fn is_cached(&self, name: &str) -> bool {
        self.resolve(name)
            .is_some_and(|a| self.cache.contains_key(&*normalize_name(&a.name)))
    }

    /// Drop every cached artifact.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Return the text content of `name`, fetching it on first use.
    ///
    /// Fails with [`CyberlabError::NotFound`] when the name matches no
    /// artifact or the artifact has no fetch location, and with
    /// [`CyberlabError::FetchFailed`] when the request fails or answers with
    /// a non-success status.
    pub fn fetch_content(&mut self, name: &str, net: &dyn NetworkService) -> Result<String> {
        let artifact = self
            .resolve(name)
            .ok_or_else(|| CyberlabError::NotFound(name.to_string()))?;
        let key = normalize_name(&artifact.name).into_owned();
        if let Some(text) = self.cache.get(&key) {
            log::debug!("Artifact cache hit: {key}");
            return Ok(text.clone());
        }
        let href = artifact
            .href
            .as_deref()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| CyberlabError::NotFound(name.to_string()))?;
        let url = join_origin(self.origin.as_deref(), href);

        log::info!("Fetching artifact {key} from {url}");
        let resp = net.http_get(&url, self.timeout).map_err(|e| {
            log::warn!("Artifact fetch failed for {key}: {e}");
            CyberlabError::FetchFailed(format!("{url}: {e}"))
        })?;
        if !resp.is_success() {
            log::warn!("Artifact fetch for {key} returned HTTP {}", resp.status_code);
            return Err(CyberlabError::FetchFailed(format!(
                "{url}: HTTP {}",
                resp.status_code
            )));
        }
        let text = resp.text();
        self.cache.insert(key, text.clone());
        Ok(text)
    }
}

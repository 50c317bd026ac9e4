// Session cookie helpers and the on-disk cache.
//
// Kismet issues a `KISMET` session cookie. The reqwest jar is the source of truth
// while the engine lives; the cache file is a best-effort mirror so a new
// process can pick the session up without logging in again. Cache failures
// are logged and swallowed, never returned.

use std::path::{Path, PathBuf};

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use directories::BaseDirs;
use reqwest::cookie::{CookieStore, Jar};
use tracing::{debug, trace, warn};
use url::Url;

/// Name of the session cookie Kismet rotates.
pub const SESSION_COOKIE: &str = "KISMET";

/// File name prefix for derived cache paths.
const CACHE_FILE_PREFIX: &str = ".kismet_session_";

// ── Jar helpers ──────────────────────────────────────────────────────

/// Install `value` as the session cookie for `endpoint`.
///
/// Scoped to `/` so it rides along on every path under the endpoint,
/// including a reverse-proxy base path.
pub fn seed_session_cookie(jar: &Jar, endpoint: &Url, value: &str) {
    jar.add_cookie_str(&format!("{SESSION_COOKIE}={value}; Path=/"), endpoint);
}

/// Current session cookie the jar would send to `endpoint`.
///
/// Expired cookies are already gone from the jar, so this never returns
/// a token the server has revoked.
pub fn session_cookie(jar: &Jar, endpoint: &Url) -> Option<String> {
    let header = jar.cookies(endpoint)?;
    let header = header.to_str().ok()?;
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_owned())
        .filter(|value| !value.is_empty())
}

// ── SessionCache ─────────────────────────────────────────────────────

/// Plain-text file holding exactly the session cookie value.
///
/// Last writer wins; there is no locking. A stale value is harmless since
/// the server validates (and rotates) the cookie itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCache {
    path: PathBuf,
}

impl SessionCache {
    /// A cache at `path`, with a leading `~` expanded to the home directory.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: expand_home(path.as_ref()),
        }
    }

    /// The per-endpoint default cache under the user's home directory.
    pub fn for_endpoint(endpoint: &Url) -> Self {
        Self {
            path: default_cache_path(endpoint),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Seed `jar` with a previously cached cookie for `endpoint`, returning it.
    pub fn restore(&self, jar: &Jar, endpoint: &Url) -> Option<String> {
        if !self.path.is_file() {
            return None;
        }
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => {
                let cookie = raw.trim();
                if cookie.is_empty() {
                    return None;
                }
                debug!(path = %self.path.display(), "restored cached session");
                seed_session_cookie(jar, endpoint, cookie);
                Some(cookie.to_owned())
            }
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "failed to read session cache");
                None
            }
        }
    }

    /// Mirror the jar's session cookie to disk. Missing cookie is a no-op.
    pub fn persist(&self, jar: &Jar, endpoint: &Url) {
        let Some(cookie) = session_cookie(jar, endpoint) else {
            return;
        };
        match std::fs::write(&self.path, cookie.as_bytes()) {
            Ok(()) => trace!(path = %self.path.display(), "session cache updated"),
            Err(e) => warn!(path = %self.path.display(), error = %e, "failed to save session"),
        }
    }
}

// ── Path helpers ─────────────────────────────────────────────────────

/// Deterministic cache path for `endpoint`: `~/.kismet_session_<b64(uri)>`.
///
/// URL-safe base64 without padding keeps the suffix a valid file name, so
/// distinct endpoints never share a cache file.
pub fn default_cache_path(endpoint: &Url) -> PathBuf {
    let suffix = URL_SAFE_NO_PAD.encode(endpoint.as_str());
    home_dir().join(format!("{CACHE_FILE_PREFIX}{suffix}"))
}

fn home_dir() -> PathBuf {
    BaseDirs::new().map_or_else(|| PathBuf::from("."), |dirs| dirs.home_dir().to_path_buf())
}

fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => home_dir().join(rest),
        Err(_) => path.to_path_buf(),
    }
}

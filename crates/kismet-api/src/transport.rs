// Transport configuration and the retrying request sender.
//
// One `reqwest::Client` is built per engine. reqwest keeps a keep-alive
// pool per (scheme, host), so every request to the configured endpoint
// reuses the same TCP/TLS state. Retries are driven by `RetryPolicy`.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use reqwest::cookie::CookieStore;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};
use url::Url;

use crate::error::Error;

/// TLS verification mode.
#[derive(Debug, Clone, Default)]
pub enum TlsMode {
    /// Use the system certificate store.
    #[default]
    System,
    /// Use a custom CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate (for self-signed Kismet servers).
    DangerAcceptInvalid,
}

/// Shared transport configuration for building HTTP clients.
///
/// Timeouts are `None` by default, which keeps reqwest's own defaults.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub timeout: Option<Duration>,
    pub connect_timeout: Option<Duration>,
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::System,
            timeout: None,
            connect_timeout: None,
            user_agent: concat!("kismet-api/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config, wired to `cookies`.
    pub fn build_client<C>(&self, cookies: Arc<C>) -> Result<reqwest::Client, Error>
    where
        C: CookieStore + 'static,
    {
        let mut builder = reqwest::Client::builder()
            .user_agent(self.user_agent.as_str())
            .cookie_provider(cookies);

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = self.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }

        match &self.tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                let cert_pem = std::fs::read(path)
                    .map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
                let cert = reqwest::Certificate::from_pem(&cert_pem)
                    .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
            TlsMode::DangerAcceptInvalid => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }
}

// ── Retry policy ─────────────────────────────────────────────────────

/// Bounded retry with exponential backoff. Immutable once the engine is built.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Additional attempts after the first one.
    pub max_retries: u32,
    /// Response statuses that trigger a retry.
    pub retryable_statuses: BTreeSet<u16>,
    /// Verbs whose responses may be retried on a retryable status. POST
    /// commands are not idempotent, so only GET is retried by default.
    pub retry_methods: BTreeSet<Verb>,
    /// Base delay; retry `n` waits `backoff_factor * 2^(n-1)` (the first retry is immediate).
    pub backoff_factor: Duration,
    /// Upper bound on a single backoff delay.
    pub max_backoff: Duration,
    /// Also retry connect and timeout failures.
    pub retry_on_connect: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            retryable_statuses: BTreeSet::from([500]),
            retry_methods: BTreeSet::from([Verb::Get]),
            backoff_factor: Duration::from_secs(1),
            max_backoff: Duration::from_secs(120),
            retry_on_connect: false,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Whether a response with `status` to a `verb` request should be retried.
    pub fn retries_status(&self, verb: Verb, status: u16) -> bool {
        self.retry_methods.contains(&verb) && self.retryable_statuses.contains(&status)
    }

    /// Delay before the `retry`-th retry (1-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        if retry <= 1 {
            return Duration::ZERO;
        }
        let factor = 1_u32 << (retry - 1).min(20);
        self.backoff_factor
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

// ── Transport ────────────────────────────────────────────────────────

/// HTTP verbs the Kismet REST interface understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Verb {
    Get,
    Post,
}

impl Verb {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl std::fmt::Display for Verb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HTTP Basic credentials attached to every request.
#[derive(Debug, Clone)]
pub struct BasicAuth {
    pub username: String,
    pub password: SecretString,
}

/// Pooled HTTP client with retry and credential attachment.
pub(crate) struct Transport {
    http: reqwest::Client,
    retry: RetryPolicy,
    auth: RwLock<Option<BasicAuth>>,
}

impl Transport {
    pub(crate) fn new(http: reqwest::Client, retry: RetryPolicy, auth: Option<BasicAuth>) -> Self {
        Self {
            http,
            retry,
            auth: RwLock::new(auth),
        }
    }

    pub(crate) fn set_auth(&self, auth: BasicAuth) {
        debug!(username = %auth.username, "setting basic credentials");
        *self.auth.write().expect("auth lock poisoned") = Some(auth);
    }

    pub(crate) fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    fn build(&self, verb: Verb, url: &Url, form: Option<&str>) -> reqwest::RequestBuilder {
        let mut builder = match verb {
            Verb::Get => self.http.get(url.clone()),
            Verb::Post => self.http.post(url.clone()),
        };
        if let Some(json) = form {
            builder = builder.form(&[("json", json)]);
        }
        let guard = self.auth.read().expect("auth lock poisoned");
        match guard.as_ref() {
            Some(auth) => builder.basic_auth(&auth.username, Some(auth.password.expose_secret())),
            None => builder,
        }
    }

    /// Issue one logical request, retrying per the policy.
    ///
    /// Returns the final response, even when its status is still retryable
    /// after the budget is spent; classification is the engine's job.
    pub(crate) async fn send(
        &self,
        verb: Verb,
        url: &Url,
        form: Option<&str>,
    ) -> Result<reqwest::Response, Error> {
        let mut retry = 0;
        loop {
            match self.build(verb, url, form).send().await {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    if !self.retry.retries_status(verb, status) || retry >= self.retry.max_retries {
                        return Ok(resp);
                    }
                    retry += 1;
                    warn!(%url, status, retry, "retryable status, backing off");
                }
                Err(e) => {
                    let retryable =
                        self.retry.retry_on_connect && (e.is_connect() || e.is_timeout());
                    if !retryable || retry >= self.retry.max_retries {
                        return Err(Error::Connection {
                            url: url.to_string(),
                            source: e,
                        });
                    }
                    retry += 1;
                    warn!(%url, error = %e, retry, "connection failed, backing off");
                }
            }
            let delay = self.retry.backoff(retry);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_retry_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 5);
        assert!(policy.retries_status(Verb::Get, 500));
        assert!(!policy.retries_status(Verb::Get, 502));
        assert!(!policy.retries_status(Verb::Post, 500));
        assert_eq!(policy.backoff_factor, Duration::from_secs(1));
        assert!(!policy.retry_on_connect);
    }

    #[test]
    fn backoff_increases_exponentially() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(1), Duration::ZERO);
        assert_eq!(policy.backoff(2), Duration::from_secs(2));
        assert_eq!(policy.backoff(3), Duration::from_secs(4));
        assert_eq!(policy.backoff(4), Duration::from_secs(8));
    }

    #[test]
    fn backoff_caps_at_max() {
        let policy = RetryPolicy {
            max_backoff: Duration::from_secs(10),
            ..RetryPolicy::default()
        };
        assert_eq!(policy.backoff(10), Duration::from_secs(10));
        assert_eq!(policy.backoff(u32::MAX), Duration::from_secs(10));
    }

    #[test]
    fn verb_display() {
        assert_eq!(Verb::Get.to_string(), "GET");
        assert_eq!(Verb::Post.as_str(), "POST");
    }
}

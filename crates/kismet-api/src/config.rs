// Engine construction parameters.

use std::path::PathBuf;

use secrecy::SecretString;
use url::Url;

use crate::transport::{RetryPolicy, TransportConfig};

/// Default Kismet REST endpoint.
pub const DEFAULT_HOST_URI: &str = "http://127.0.0.1:2501";

/// Password sent when only a username is configured.
pub const DEFAULT_PASSWORD: &str = "nopass";

/// Where the session cookie is mirrored on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionCachePath {
    /// `~/.kismet_session_<encoded endpoint>`.
    #[default]
    Derived,
    /// An explicit file (`~` is expanded).
    Path(PathBuf),
    /// Keep the session in memory only.
    Disabled,
}

/// Everything a [`KismetClient`](crate::KismetClient) needs.
///
/// If Kismet sits behind a reverse proxy, include the base path in
/// `host_uri` (e.g. `https://proxy.example/kismet/`).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub host_uri: Url,
    pub username: Option<String>,
    pub password: SecretString,
    /// Installed as the session cookie, for servers configured with API keys.
    pub api_key: Option<SecretString>,
    pub session_cache: SessionCachePath,
    /// Echo request payloads in debug logs.
    pub debug: bool,
    pub transport: TransportConfig,
    pub retry: RetryPolicy,
}

impl ClientConfig {
    pub fn new(host_uri: Url) -> Self {
        Self {
            host_uri,
            username: None,
            password: SecretString::from(DEFAULT_PASSWORD.to_owned()),
            api_key: None,
            session_cache: SessionCachePath::default(),
            debug: false,
            transport: TransportConfig::default(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_login(mut self, username: impl Into<String>, password: SecretString) -> Self {
        self.username = Some(username.into());
        self.password = password;
        self
    }

    pub fn with_api_key(mut self, key: SecretString) -> Self {
        self.api_key = Some(key);
        self
    }

    pub fn with_session_cache(mut self, cache: SessionCachePath) -> Self {
        self.session_cache = cache;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_transport(mut self, transport: TransportConfig) -> Self {
        self.transport = transport;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(Url::parse(DEFAULT_HOST_URI).expect("default host URI is valid"))
    }
}

// Kismet REST interaction engine
//
// Every call goes through the same pipeline: build the full URL, send
// GET or POST (POST bodies are form-encoded as a single `json` field),
// classify the status once, then decode in bulk, line-by-line, as raw
// bytes, or not at all. After each successful call the session cookie is
// mirrored to the cache file. Resource methods (devices, alerts, ...) live
// in `endpoints/` and only supply paths and payloads.

use std::path::Path;
use std::sync::Arc;

use async_stream::try_stream;
use bytes::Bytes;
use reqwest::cookie::Jar;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, error, info};
use url::Url;

use crate::config::{ClientConfig, SessionCachePath};
use crate::decode::{ItJsonStream, decode_bulk, decode_lines, visit_bulk};
use crate::error::{Error, preview};
use crate::logging::LogLevel;
use crate::session::{SessionCache, seed_session_cookie, session_cookie};
use crate::transport::{BasicAuth, RetryPolicy, Transport, Verb};

/// Session-check endpoint; 200 means the current cookie/credentials are valid.
const CHECK_SESSION_PATH: &str = "session/check_session";

// ── URL joining ──────────────────────────────────────────────────────

/// Join a relative API path onto the endpoint base.
///
/// The base always ends in exactly one `/` and leading slashes on `path`
/// are dropped, so `"v1/x"`, `"/v1/x"` and `"//v1/x"` give the same URL,
/// with or without a trailing slash (or proxy base path) on `base`.
pub fn build_full_url(base: &Url, path: &str) -> Result<Url, Error> {
    let base = Url::parse(&format!("{}/", base.as_str().trim_end_matches('/')))?;
    // "./" keeps a first segment containing ':' from being read as a scheme.
    Ok(base.join(&format!("./{}", path.trim_start_matches('/')))?)
}

// ── Status classification ────────────────────────────────────────────

/// Outcome class of an HTTP status. Total: every status maps to exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Success,
    BadRequest,
    LoginRequired,
    ServerError,
    RequestFailed,
}

pub fn classify_status(status: u16) -> StatusClass {
    match status {
        200 => StatusClass::Success,
        400 => StatusClass::BadRequest,
        401 => StatusClass::LoginRequired,
        500 => StatusClass::ServerError,
        _ => StatusClass::RequestFailed,
    }
}

// ── Session ──────────────────────────────────────────────────────────

/// Cookie jar plus its optional on-disk mirror.
#[derive(Debug)]
struct Session {
    jar: Arc<Jar>,
    endpoint: Url,
    cache: Option<SessionCache>,
}

impl Session {
    fn cookie(&self) -> Option<String> {
        session_cookie(&self.jar, &self.endpoint)
    }

    fn refresh_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.persist(&self.jar, &self.endpoint);
        }
    }
}

// ── KismetClient ─────────────────────────────────────────────────────

/// Async client for the Kismet REST interface.
///
/// Owns its HTTP pool, cookie jar and cache path; nothing is shared across
/// instances except the cache file itself.
pub struct KismetClient {
    transport: Transport,
    base_url: Url,
    session: Arc<Session>,
    log_level: LogLevel,
}

impl KismetClient {
    /// Build a client from `config`.
    ///
    /// A cached session cookie is restored first; an `api_key`, when set,
    /// replaces it.
    pub fn new(config: ClientConfig) -> Result<Self, Error> {
        let jar = Arc::new(Jar::default());
        let cache = match &config.session_cache {
            SessionCachePath::Derived => Some(SessionCache::for_endpoint(&config.host_uri)),
            SessionCachePath::Path(path) => Some(SessionCache::new(path)),
            SessionCachePath::Disabled => None,
        };
        if let Some(cache) = &cache {
            cache.restore(&jar, &config.host_uri);
        }

        let http = config.transport.build_client(Arc::clone(&jar))?;
        let auth = config.username.clone().map(|username| BasicAuth {
            username,
            password: config.password.clone(),
        });
        let transport = Transport::new(http, config.retry.clone(), auth);

        if let Some(key) = &config.api_key {
            seed_session_cookie(&jar, &config.host_uri, key.expose_secret());
        }

        let log_level = LogLevel::from_debug(config.debug);
        debug!(host = %config.host_uri, ?log_level, "initialized Kismet client");

        Ok(Self {
            transport,
            session: Arc::new(Session {
                jar,
                endpoint: config.host_uri.clone(),
                cache,
            }),
            base_url: config.host_uri,
            log_level,
        })
    }

    /// The endpoint base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The current session cookie, if the server issued (or the cache held) one.
    pub fn session_cookie(&self) -> Option<String> {
        self.session.cookie()
    }

    /// Path of the session cache file, unless caching is disabled.
    pub fn session_cache_path(&self) -> Option<&Path> {
        self.session.cache.as_ref().map(SessionCache::path)
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        self.transport.retry_policy()
    }

    /// Attach HTTP Basic credentials to every subsequent request.
    pub fn set_login(&self, username: impl Into<String>, password: SecretString) {
        self.transport.set_auth(BasicAuth {
            username: username.into(),
            password,
        });
    }

    /// Use an API key as the session cookie.
    pub fn set_api_key(&self, key: &SecretString) {
        seed_session_cookie(&self.session.jar, &self.base_url, key.expose_secret());
    }

    // ── Session checks ───────────────────────────────────────────────

    /// Whether the current session (cookie or credentials) is accepted.
    ///
    /// Any non-200 answer is `false`, not an error. Connection failures
    /// still propagate.
    pub async fn check_session(&self) -> Result<bool, Error> {
        Ok(self.session_rejection().await?.is_none())
    }

    /// Validate (and cache) the session, logging why when it is rejected.
    pub async fn login(&self) -> Result<bool, Error> {
        match self.session_rejection().await? {
            None => {
                debug!("login: session valid");
                Ok(true)
            }
            Some((status, body)) => {
                debug!(status, body = preview(&body), "login: invalid session");
                Ok(false)
            }
        }
    }

    /// Hit the session-check endpoint. On 200 the cache is refreshed and
    /// `None` returned; otherwise the rejecting status and body.
    async fn session_rejection(&self) -> Result<Option<(u16, String)>, Error> {
        let url = build_full_url(&self.base_url, CHECK_SESSION_PATH)?;
        let resp = self.transport.send(Verb::Get, &url, None).await?;
        let status = resp.status().as_u16();
        if status != 200 {
            let body = resp.text().await.unwrap_or_default();
            return Ok(Some((status, body)));
        }
        self.session.refresh_cache();
        Ok(None)
    }

    // ── Interaction variants ─────────────────────────────────────────

    /// Send a request and decode the whole body as one JSON value.
    pub async fn interact(
        &self,
        verb: Verb,
        path: &str,
        payload: Option<&Value>,
    ) -> Result<Value, Error> {
        let resp = self.dispatch(verb, path, payload, false).await?;
        let body = resp.text().await.map_err(Error::Transport)?;
        let value = decode_bulk(path, &body)?;
        self.session.refresh_cache();
        Ok(value)
    }

    /// Send a request, decode it in bulk, and visit each array element.
    pub async fn interact_each<F>(
        &self,
        verb: Verb,
        path: &str,
        payload: Option<&Value>,
        visitor: F,
    ) -> Result<(), Error>
    where
        F: FnMut(Value),
    {
        let value = self.interact(verb, path, payload).await?;
        visit_bulk(value, visitor);
        Ok(())
    }

    /// Send a request and lazily decode the line-delimited body.
    ///
    /// The status is classified before this returns; decode errors surface
    /// as stream items. The cache is refreshed once the body is drained.
    pub async fn interact_stream(
        &self,
        verb: Verb,
        path: &str,
        payload: Option<&Value>,
    ) -> Result<ItJsonStream, Error> {
        let resp = self.dispatch(verb, path, payload, true).await?;
        let values = decode_lines(path.to_owned(), resp.bytes_stream());
        let session = Arc::clone(&self.session);

        Ok(ItJsonStream::new(try_stream! {
            for await value in values {
                yield value?;
            }
            session.refresh_cache();
        }))
    }

    /// Stream a line-delimited body into `visitor`, one value per line.
    pub async fn stream_each<F>(
        &self,
        verb: Verb,
        path: &str,
        payload: Option<&Value>,
        visitor: F,
    ) -> Result<(), Error>
    where
        F: FnMut(Value),
    {
        self.interact_stream(verb, path, payload)
            .await?
            .for_each_value(visitor)
            .await
    }

    /// Send a command and report success without reading the body.
    ///
    /// Returns `true` for 200; every error status is returned as `Err`,
    /// never as `false`.
    pub async fn interact_status(
        &self,
        verb: Verb,
        path: &str,
        payload: Option<&Value>,
    ) -> Result<bool, Error> {
        self.dispatch(verb, path, payload, false).await?;
        self.session.refresh_cache();
        Ok(true)
    }

    /// Send a request and return the undecoded body.
    pub async fn interact_bytes(
        &self,
        verb: Verb,
        path: &str,
        payload: Option<&Value>,
    ) -> Result<Bytes, Error> {
        let resp = self.dispatch(verb, path, payload, false).await?;
        let body = resp.bytes().await.map_err(Error::Transport)?;
        self.session.refresh_cache();
        Ok(body)
    }

    // ── Request pipeline ─────────────────────────────────────────────

    /// Build, send, and classify one request.
    async fn dispatch(
        &self,
        verb: Verb,
        path: &str,
        payload: Option<&Value>,
        stream: bool,
    ) -> Result<reqwest::Response, Error> {
        let url = build_full_url(&self.base_url, path)?;
        let form = match verb {
            Verb::Get => None,
            Verb::Post => Some(encode_payload(payload)),
        };
        self.log_request(verb, &url, form.as_deref(), stream);

        let resp = self.transport.send(verb, &url, form.as_deref()).await?;
        classify_response(path, resp).await
    }

    fn log_request(&self, verb: Verb, url: &Url, form: Option<&str>, stream: bool) {
        let payload = form.unwrap_or("");
        if self.log_level.is_debug() {
            info!(%verb, %url, stream, payload, "interact");
        } else {
            debug!(%verb, %url, stream, payload_bytes = payload.len(), "interact");
        }
    }
}

impl std::fmt::Debug for KismetClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KismetClient")
            .field("base_url", &self.base_url.as_str())
            .field("session_cache", &self.session_cache_path())
            .field("log_level", &self.log_level)
            .finish_non_exhaustive()
    }
}

/// Serialize a POST payload; a missing or empty payload becomes `{}`.
fn encode_payload(payload: Option<&Value>) -> String {
    match payload {
        None | Some(Value::Null) => "{}".to_owned(),
        Some(Value::Object(map)) if map.is_empty() => "{}".to_owned(),
        Some(value) => value.to_string(),
    }
}

/// Turn a non-200 response into the matching error.
async fn classify_response(path: &str, resp: reqwest::Response) -> Result<reqwest::Response, Error> {
    let status = resp.status().as_u16();
    match classify_status(status) {
        StatusClass::Success => Ok(resp),
        StatusClass::BadRequest => {
            let body = resp.text().await.unwrap_or_default();
            let err = Error::BadRequest {
                path: path.to_owned(),
                status,
                body: preview(&body).to_owned(),
            };
            error!("{err}");
            Err(err)
        }
        StatusClass::LoginRequired => {
            let err = Error::LoginRequired {
                path: path.to_owned(),
                status,
            };
            error!("{err}");
            Err(err)
        }
        StatusClass::ServerError => {
            let body = resp.text().await.unwrap_or_default();
            let err = Error::Server {
                path: path.to_owned(),
                status,
                body: preview(&body).to_owned(),
            };
            error!("{err}");
            Err(err)
        }
        StatusClass::RequestFailed => {
            let err = Error::RequestFailed {
                path: path.to_owned(),
                status,
            };
            error!("{err}");
            Err(err)
        }
    }
}

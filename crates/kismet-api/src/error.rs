use thiserror::Error;

/// Longest body excerpt embedded into an error message.
const BODY_PREVIEW_CHARS: usize = 200;

/// Top-level error type for the `kismet-api` crate.
///
/// Every HTTP status classification happens once, in the interaction
/// engine; resource methods only propagate what the engine returns.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// The server could not be reached (DNS failure, refused, timeout).
    #[error("Unable to connect to Kismet at {url}: {source}")]
    Connection {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// HTTP transport error after the response started (body read failure).
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS configuration or HTTP client construction error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Status classification ───────────────────────────────────────
    /// HTTP 400: the server rejected the request as malformed.
    #[error("Kismet 400 Error response from {path}: {body}")]
    BadRequest {
        path: String,
        status: u16,
        body: String,
    },

    /// HTTP 401: the endpoint needs a valid login or session cookie.
    #[error("Login required for {path}")]
    LoginRequired { path: String, status: u16 },

    /// HTTP 500: application error raised by the server.
    #[error("Kismet 500 Error response from {path}: {body}")]
    Server {
        path: String,
        status: u16,
        body: String,
    },

    /// Any other non-200 status.
    #[error("Request failed {path} {status}")]
    RequestFailed { path: String, status: u16 },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw text for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// Resource-level semantic error (unexpected response shape, bad argument).
    #[error("Kismet service error: {message}")]
    Service { message: String },
}

impl Error {
    /// The HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::BadRequest { status, .. }
            | Self::LoginRequired { status, .. }
            | Self::Server { status, .. }
            | Self::RequestFailed { status, .. } => Some(*status),
            Self::Connection { source, .. } | Self::Transport(source) => {
                source.status().map(|s| s.as_u16())
            }
            _ => None,
        }
    }

    /// Returns `true` if logging in (or refreshing the session) might resolve it.
    pub fn is_auth_required(&self) -> bool {
        matches!(self, Self::LoginRequired { .. })
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Connection { .. } => true,
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    pub(crate) fn service(message: impl Into<String>) -> Self {
        Self::Service {
            message: message.into(),
        }
    }

    pub(crate) fn deserialization(context: &str, err: &serde_json::Error, body: &str) -> Self {
        Self::Deserialization {
            message: format!("{context}: {err} (body preview: {:?})", preview(body)),
            body: body.to_owned(),
        }
    }
}

/// The first [`BODY_PREVIEW_CHARS`] characters of a response body.
pub(crate) fn preview(body: &str) -> &str {
    match body.char_indices().nth(BODY_PREVIEW_CHARS) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

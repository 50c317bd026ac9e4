//! Configuration profiles for Kismet REST clients.
//!
//! TOML profiles, environment overrides, password resolution, and
//! translation to `kismet_api::ClientConfig`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use kismet_api::config::DEFAULT_PASSWORD;
use kismet_api::logging::debug_from_env;
use kismet_api::{ClientConfig, RetryPolicy, SessionCachePath, TlsMode, TransportConfig};

/// Prefix for environment overrides; `__` separates nested keys
/// (`KISMET_PROFILES__LAB__HOST_URI`).
pub const ENV_PREFIX: &str = "KISMET_";

/// `session_cache` value that keeps the session in memory only.
const CACHE_DISABLED: &str = "off";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no profile named '{profile}'")]
    UnknownProfile { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when none is named explicitly.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named Kismet servers.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default)]
    pub debug: bool,

    /// Total request timeout in seconds, body included; 0 (the default)
    /// keeps the HTTP client's default so long streams are not cut off.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            debug: false,
            timeout: default_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_timeout() -> u64 {
    0
}
fn default_max_retries() -> u32 {
    5
}

/// A named Kismet server.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Profile {
    /// REST base URL, including any reverse-proxy path.
    pub host_uri: Option<String>,

    pub username: Option<String>,

    /// Plaintext password (prefer `password_env`).
    pub password: Option<String>,

    /// Environment variable holding the password.
    pub password_env: Option<String>,

    /// API key installed as the session cookie.
    pub api_key: Option<String>,

    /// Session cache file; `"off"` disables caching. Unset derives a
    /// per-endpoint file in the home directory.
    pub session_cache: Option<String>,

    pub debug: Option<bool>,

    /// Override `defaults.timeout`.
    pub timeout: Option<u64>,

    /// Accept any TLS certificate.
    pub insecure: Option<bool>,

    /// Path to a custom CA certificate (PEM).
    pub ca_cert: Option<PathBuf>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("org", "kismet", "kismet-rest").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("kismet-rest");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the full Config from `path` + environment.
///
/// A missing file is not an error; defaults and environment still apply.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if it cannot be read.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(&config_path(), cfg)
}

pub fn save_config_to(path: &Path, cfg: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Profile resolution ──────────────────────────────────────────────

/// Name of the profile to use: the explicit one, else `default_profile`,
/// else `"default"`.
pub fn active_profile_name<'a>(config: &'a Config, requested: Option<&'a str>) -> &'a str {
    requested
        .or(config.default_profile.as_deref())
        .unwrap_or("default")
}

/// Password from `password_env`, then plaintext, then the Kismet default.
pub fn resolve_password(profile: &Profile) -> SecretString {
    if let Some(ref env_name) = profile.password_env {
        if let Ok(val) = std::env::var(env_name) {
            return SecretString::from(val);
        }
    }
    let password = profile
        .password
        .clone()
        .unwrap_or_else(|| DEFAULT_PASSWORD.to_owned());
    SecretString::from(password)
}

/// Build a `ClientConfig` for the named profile.
///
/// The default profile may be absent, in which case the built-in defaults
/// (local Kismet on port 2501) are used. Any other missing profile is an
/// error.
pub fn resolve_profile(config: &Config, requested: Option<&str>) -> Result<ClientConfig, ConfigError> {
    let name = active_profile_name(config, requested);
    let fallback = Profile::default();
    let profile = match config.profiles.get(name) {
        Some(profile) => profile,
        None if requested.is_none() => &fallback,
        None => {
            return Err(ConfigError::UnknownProfile {
                profile: name.into(),
            });
        }
    };
    profile_to_client_config(profile, &config.defaults)
}

/// Translate one profile (plus global defaults) into a `ClientConfig`.
pub fn profile_to_client_config(
    profile: &Profile,
    defaults: &Defaults,
) -> Result<ClientConfig, ConfigError> {
    let mut client = match profile.host_uri.as_deref() {
        Some(raw) => {
            let url: url::Url = raw.parse().map_err(|_| ConfigError::Validation {
                field: "host_uri".into(),
                reason: format!("invalid URL: {raw}"),
            })?;
            ClientConfig::new(url)
        }
        None => ClientConfig::default(),
    };

    client.password = resolve_password(profile);
    client.username.clone_from(&profile.username);
    client.api_key = profile.api_key.clone().map(SecretString::from);

    client.session_cache = match profile.session_cache.as_deref() {
        None => SessionCachePath::Derived,
        Some(CACHE_DISABLED) => SessionCachePath::Disabled,
        Some(path) => SessionCachePath::Path(PathBuf::from(path)),
    };

    client.debug = profile.debug.unwrap_or(false) || defaults.debug || debug_from_env();

    let tls = if profile.insecure.unwrap_or(false) {
        TlsMode::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsMode::CustomCa(ca_path.clone())
    } else {
        TlsMode::System
    };
    let timeout = profile.timeout.unwrap_or(defaults.timeout);
    client.transport = TransportConfig {
        tls,
        timeout: (timeout > 0).then(|| Duration::from_secs(timeout)),
        ..TransportConfig::default()
    };

    client.retry = RetryPolicy {
        max_retries: defaults.max_retries,
        ..RetryPolicy::default()
    };

    Ok(client)
}

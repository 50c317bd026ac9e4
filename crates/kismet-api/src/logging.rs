//! Logging setup.
//!
//! The library only emits `tracing` events. Applications that want the
//! traditional "DEBUG=true turns on verbose output" behaviour call
//! [`init_tracing`] once, with the flag resolved by [`debug_from_env`] or
//! taken from configuration.

use tracing_subscriber::EnvFilter;

/// Environment variable consulted by [`debug_from_env`].
pub const DEBUG_ENV: &str = "DEBUG";

/// Verbosity decided once, at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    #[default]
    Info,
    Debug,
}

impl LogLevel {
    pub fn from_debug(debug: bool) -> Self {
        if debug { Self::Debug } else { Self::Info }
    }

    pub fn is_debug(self) -> bool {
        self == Self::Debug
    }

    fn directive(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Debug => "debug",
        }
    }
}

/// `true` iff `DEBUG` is set to `True` or `true`.
pub fn debug_from_env() -> bool {
    is_debug_value(std::env::var(DEBUG_ENV).ok().as_deref())
}

fn is_debug_value(value: Option<&str>) -> bool {
    matches!(value, Some("True" | "true"))
}

/// Install a `fmt` subscriber at the given level.
///
/// `RUST_LOG` wins when set. Calling this more than once is harmless; only
/// the first subscriber is installed.
pub fn init_tracing(level: LogLevel) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(level.directive())),
        )
        .with_target(true)
        .try_init();
}

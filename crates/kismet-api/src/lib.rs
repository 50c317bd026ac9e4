// kismet-api: Async Rust client for the Kismet wireless monitoring REST API

pub mod client;
pub mod config;
pub mod decode;
pub mod endpoints;
pub mod error;
pub mod fields;
pub mod logging;
pub mod session;
pub mod transport;

pub use client::{KismetClient, StatusClass, build_full_url, classify_status};
pub use config::{ClientConfig, SessionCachePath};
pub use decode::ItJsonStream;
pub use endpoints::{
    AccessPointQuery, DeviceKeyQuery, DeviceQuery, PacketCategory, PcapQuery, SystemTime,
    TimeFormat, Timeline, TimestampQuery,
};
pub use error::Error;
pub use fields::{Field, RegexFilter};
pub use logging::{LogLevel, init_tracing};
pub use session::{SESSION_COOKIE, SessionCache, seed_session_cookie, session_cookie};
pub use transport::{RetryPolicy, TlsMode, TransportConfig, Verb};

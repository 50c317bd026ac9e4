// Kismet resource endpoints
//
// Thin, typed mappings from options structs to URL paths and payloads.
// Each module adds inherent methods to `KismetClient`; none of them look at
// status codes or bodies themselves, the engine in `client.rs` does that.

pub mod alerts;
pub mod datasources;
pub mod devices;
pub mod gps;
pub mod kismetdb;
pub mod messages;
pub mod packetchain;
pub mod system;

use serde_json::{Map, Value};

pub use alerts::TimestampQuery;
pub use devices::{AccessPointQuery, DeviceKeyQuery, DeviceQuery};
pub use kismetdb::PcapQuery;
pub use packetchain::{PacketCategory, Timeline};
pub use system::{SystemTime, TimeFormat};

/// Payload builder that only includes the keys a caller actually set.
#[derive(Debug, Default)]
pub(crate) struct Payload(Map<String, Value>);

impl Payload {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_owned(), value.into());
        self
    }

    /// Insert `key` only when `values` is non-empty.
    pub(crate) fn set_list<T: serde::Serialize>(mut self, key: &str, values: &[T]) -> Self {
        if !values.is_empty() {
            self.0.insert(key.to_owned(), serde_json::json!(values));
        }
        self
    }

    pub(crate) fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

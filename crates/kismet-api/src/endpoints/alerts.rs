// Alert endpoints

use tracing::debug;

use crate::client::KismetClient;
use crate::decode::ItJsonStream;
use crate::error::Error;
use crate::transport::Verb;

/// "Everything since" timestamp; the zero default means all records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimestampQuery {
    pub ts_sec: u64,
    pub ts_usec: u64,
}

impl TimestampQuery {
    pub fn since(ts_sec: u64) -> Self {
        Self { ts_sec, ts_usec: 0 }
    }
}

impl KismetClient {
    /// Stream alerts raised after the given timestamp.
    ///
    /// `GET /alerts/last-time/{ts_sec}.{ts_usec}/alerts.ekjson`
    pub async fn alerts(&self, query: TimestampQuery) -> Result<ItJsonStream, Error> {
        let path = format!(
            "alerts/last-time/{}.{}/alerts.ekjson",
            query.ts_sec, query.ts_usec
        );
        debug!(?query, "streaming alerts");
        self.interact_stream(Verb::Get, &path, None).await
    }
}

// KismetDB log endpoints

use bytes::Bytes;
use serde_json::{Value, json};
use tracing::debug;

use crate::client::KismetClient;
use crate::error::Error;
use crate::transport::Verb;

/// Options for [`KismetClient::kismetdb_packets`].
#[derive(Debug, Clone)]
pub struct PcapQuery {
    /// Download title; does not affect which packets are returned.
    pub title: String,
    /// Server-side packet filter document.
    pub filter: Option<Value>,
}

impl Default for PcapQuery {
    fn default() -> Self {
        Self {
            title: "packets".into(),
            filter: None,
        }
    }
}

impl KismetClient {
    /// Download matching packets from the kismetdb log as pcap-ng.
    ///
    /// `POST /logging/kismetdb/pcap/{title}.pcapng`
    pub async fn kismetdb_packets(&self, query: &PcapQuery) -> Result<Bytes, Error> {
        let path = format!("logging/kismetdb/pcap/{}.pcapng", query.title);
        let payload = match &query.filter {
            Some(filter) => json!({ "filter": filter }),
            None => json!({}),
        };
        debug!(title = %query.title, "downloading kismetdb packets");
        self.interact_bytes(Verb::Post, &path, Some(&payload)).await
    }

    /// Purge logged packets older than `drop_before` (epoch seconds).
    ///
    /// `POST /logging/kismetdb/pcap/drop.cmd`
    pub async fn drop_packets(&self, drop_before: i64) -> Result<bool, Error> {
        debug!(drop_before, "dropping kismetdb packets");
        let payload = json!({ "drop_before": drop_before });
        self.interact_status(Verb::Post, "logging/kismetdb/pcap/drop.cmd", Some(&payload))
            .await
    }
}

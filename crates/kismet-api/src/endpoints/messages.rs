// Message bus endpoints

use serde_json::Value;

use crate::client::KismetClient;
use crate::endpoints::TimestampQuery;
use crate::error::Error;
use crate::transport::Verb;

impl KismetClient {
    /// Fetch message-bus entries newer than the given timestamp.
    ///
    /// `GET /messagebus/last-time/{ts_sec}.{ts_usec}/messages.json`
    ///
    /// The endpoint answers with one JSON array rather than itjson lines.
    pub async fn messages(&self, query: TimestampQuery) -> Result<Value, Error> {
        let path = format!(
            "messagebus/last-time/{}.{}/messages.json",
            query.ts_sec, query.ts_usec
        );
        self.interact(Verb::Get, &path, None).await
    }
}

// GPS endpoints

use serde_json::Value;

use crate::client::KismetClient;
use crate::error::Error;
use crate::transport::Verb;

impl KismetClient {
    /// Current server location.
    ///
    /// `GET /gps/location.json`
    ///
    /// Keys include `kismet.common.location.lat`, `.lon`, `.alt`, `.heading`,
    /// `.speed`, `.time_sec`, `.time_usec`, `.fix` and `.valid`.
    pub async fn gps_location(&self) -> Result<Value, Error> {
        self.interact(Verb::Get, "gps/location.json", None).await
    }
}

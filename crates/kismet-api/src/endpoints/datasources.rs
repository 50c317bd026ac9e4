// Datasource endpoints
//
// Listing sources and interfaces, plus the `.cmd` commands that change
// channels, hopping, and source state. Commands need a valid login and
// report plain success; failures come back as errors.

use serde_json::json;
use tracing::debug;

use crate::client::KismetClient;
use crate::decode::ItJsonStream;
use crate::error::Error;
use crate::transport::Verb;

impl KismetClient {
    /// Stream every configured datasource.
    ///
    /// `GET /datasource/all_sources.itjson`
    pub async fn datasources(&self) -> Result<ItJsonStream, Error> {
        self.interact_stream(Verb::Get, "datasource/all_sources.itjson", None)
            .await
    }

    /// Stream the capture interfaces Kismet can see.
    ///
    /// `GET /datasource/list_interfaces.itjson`
    pub async fn datasource_interfaces(&self) -> Result<ItJsonStream, Error> {
        self.interact_stream(Verb::Get, "datasource/list_interfaces.itjson", None)
            .await
    }

    /// Lock a source to one channel; complex channels like `6HT40+` are fine.
    ///
    /// `POST /datasource/by-uuid/{uuid}/set_channel.cmd`
    pub async fn set_channel(&self, uuid: &str, channel: &str) -> Result<bool, Error> {
        debug!(uuid, channel, "locking datasource channel");
        let path = format!("datasource/by-uuid/{uuid}/set_channel.cmd");
        self.interact_status(Verb::Post, &path, Some(&json!({ "channel": channel })))
            .await
    }

    /// Change a source's hop rate without touching its channel list.
    ///
    /// `POST /datasource/by-uuid/{uuid}/set_channel.cmd`
    pub async fn set_hop_rate(&self, uuid: &str, rate: f64) -> Result<bool, Error> {
        debug!(uuid, rate, "setting datasource hop rate");
        let path = format!("datasource/by-uuid/{uuid}/set_channel.cmd");
        self.interact_status(Verb::Post, &path, Some(&json!({ "rate": rate })))
            .await
    }

    /// Hop at `rate` over `channels`.
    ///
    /// `POST /datasource/by-uuid/{uuid}/set_channel.cmd`
    pub async fn set_hop_channels(
        &self,
        uuid: &str,
        rate: f64,
        channels: &[String],
    ) -> Result<bool, Error> {
        debug!(uuid, rate, count = channels.len(), "setting datasource hop channels");
        let path = format!("datasource/by-uuid/{uuid}/set_channel.cmd");
        let payload = json!({ "rate": rate, "channels": channels });
        self.interact_status(Verb::Post, &path, Some(&payload)).await
    }

    /// Return a source to hopping with its existing settings.
    ///
    /// `POST /datasource/by-uuid/{uuid}/set_hop.cmd`
    pub async fn set_hop(&self, uuid: &str) -> Result<bool, Error> {
        let path = format!("datasource/by-uuid/{uuid}/set_hop.cmd");
        self.interact_status(Verb::Post, &path, Some(&json!({ "hop": true })))
            .await
    }

    /// Add a source from a standard definition string (`wlan0:name=foo`).
    ///
    /// `POST /datasource/add_source.cmd`
    pub async fn add_datasource(&self, definition: &str) -> Result<bool, Error> {
        debug!(definition, "adding datasource");
        let payload = json!({ "definition": definition });
        self.interact_status(Verb::Post, "datasource/add_source.cmd", Some(&payload))
            .await
    }

    /// `GET /datasource/by-uuid/{uuid}/pause_source.cmd`
    pub async fn pause_datasource(&self, uuid: &str) -> Result<bool, Error> {
        self.source_command(uuid, "pause_source").await
    }

    /// `GET /datasource/by-uuid/{uuid}/resume_source.cmd`
    pub async fn resume_datasource(&self, uuid: &str) -> Result<bool, Error> {
        self.source_command(uuid, "resume_source").await
    }

    /// Close a source; it stays closed until reopened.
    ///
    /// `GET /datasource/by-uuid/{uuid}/close_source.cmd`
    pub async fn close_datasource(&self, uuid: &str) -> Result<bool, Error> {
        self.source_command(uuid, "close_source").await
    }

    /// `GET /datasource/by-uuid/{uuid}/open_source.cmd`
    pub async fn open_datasource(&self, uuid: &str) -> Result<bool, Error> {
        self.source_command(uuid, "open_source").await
    }

    async fn source_command(&self, uuid: &str, command: &str) -> Result<bool, Error> {
        debug!(uuid, command, "datasource command");
        let path = format!("datasource/by-uuid/{uuid}/{command}.cmd");
        self.interact_status(Verb::Get, &path, None).await
    }
}

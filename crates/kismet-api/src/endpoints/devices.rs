// Device endpoints
//
// Device views, multi-MAC lookup, by-key fetch and 802.11 helpers. Every
// list endpoint uses itjson so results can be consumed one device at a time.

use serde_json::Value;
use tracing::debug;

use crate::client::KismetClient;
use crate::decode::ItJsonStream;
use crate::endpoints::Payload;
use crate::error::Error;
use crate::fields::{Field, RegexFilter};
use crate::transport::Verb;

/// Options for [`KismetClient::devices`].
#[derive(Debug, Clone, Default)]
pub struct DeviceQuery {
    /// Only devices seen at or after this epoch second; 0 means all devices.
    pub last_time: i64,
    pub fields: Vec<Field>,
}

/// Options for [`KismetClient::device_by_key`].
#[derive(Debug, Clone, Default)]
pub struct DeviceKeyQuery {
    /// Fetch only this sub-field (path appended to the URL). Ignored when
    /// `fields` is non-empty.
    pub field: Option<String>,
    pub fields: Vec<Field>,
}

/// Options for [`KismetClient::dot11_access_points`].
#[derive(Debug, Clone, Default)]
pub struct AccessPointQuery {
    /// Only access points modified after this epoch second.
    pub last_time: Option<i64>,
    pub regex: Vec<RegexFilter>,
    pub fields: Vec<Field>,
}

impl KismetClient {
    /// Stream all devices seen since `query.last_time`.
    ///
    /// `POST /devices/last-time/{ts}/devices.itjson`
    pub async fn devices(&self, query: &DeviceQuery) -> Result<ItJsonStream, Error> {
        let path = format!("devices/last-time/{}/devices.itjson", query.last_time);
        let payload = Payload::new().set_list("fields", &query.fields).into_value();
        debug!(last_time = query.last_time, "streaming devices");
        self.interact_stream(Verb::Post, &path, Some(&payload)).await
    }

    /// Stream devices matching MAC addresses or masked MAC groups
    /// (`aa:bb:cc:00:00:00/ff:ff:ff:00:00:00`).
    ///
    /// `POST /devices/multimac/devices.itjson`
    pub async fn devices_by_mac(
        &self,
        macs: &[String],
        fields: &[Field],
    ) -> Result<ItJsonStream, Error> {
        let payload = Payload::new()
            .set("devices", macs.to_vec())
            .set_list("fields", fields)
            .into_value();
        debug!(count = macs.len(), "streaming devices by MAC");
        self.interact_stream(Verb::Post, "devices/multimac/devices.itjson", Some(&payload))
            .await
    }

    /// Fetch one device by its Kismet key, optionally a single sub-field.
    ///
    /// `POST /devices/by-key/{key}/device.json[/{field}]`
    pub async fn device_by_key(&self, key: &str, query: &DeviceKeyQuery) -> Result<Value, Error> {
        let path = format!("devices/by-key/{key}/device.json");
        if !query.fields.is_empty() {
            let payload = Payload::new().set_list("fields", &query.fields).into_value();
            return self.interact(Verb::Post, &path, Some(&payload)).await;
        }
        let path = match &query.field {
            Some(field) => format!("{path}/{field}"),
            None => path,
        };
        self.interact(Verb::Post, &path, None).await
    }

    /// Stream the clients associated with an 802.11 access point.
    ///
    /// `POST /phy/phy80211/clients-of/{ap}/clients.itjson`
    pub async fn dot11_clients_of(
        &self,
        ap_key: &str,
        fields: &[Field],
    ) -> Result<ItJsonStream, Error> {
        let path = format!("phy/phy80211/clients-of/{ap_key}/clients.itjson");
        let payload = Payload::new().set_list("fields", fields).into_value();
        debug!(ap_key, "streaming 802.11 clients");
        self.interact_stream(Verb::Post, &path, Some(&payload)).await
    }

    /// Stream devices Kismet considers 802.11 access points.
    ///
    /// `POST /devices/views/phydot11_accesspoints/devices.itjson`
    pub async fn dot11_access_points(
        &self,
        query: &AccessPointQuery,
    ) -> Result<ItJsonStream, Error> {
        let mut payload = Payload::new();
        if let Some(ts) = query.last_time {
            payload = payload.set("last_time", ts);
        }
        let payload = payload
            .set_list("regex", &query.regex)
            .set_list("fields", &query.fields)
            .into_value();
        debug!(last_time = ?query.last_time, "streaming 802.11 access points");
        self.interact_stream(
            Verb::Post,
            "devices/views/phydot11_accesspoints/devices.itjson",
            Some(&payload),
        )
        .await
    }
}

// Packet statistics
//
// The packetchain keeps RRD rings per counter. Kismet serializes each ring
// starting at slot 0, so the samples are rotated here to put the oldest
// first, using the ring's serialization time.

use serde_json::Value;
use strum::{Display, EnumString};

use crate::client::KismetClient;
use crate::endpoints::Payload;
use crate::error::Error;
use crate::fields::Field;
use crate::transport::Verb;

const SERIAL_TIME_FIELD: &str = "kismet.common.rrd.serial_time";

/// Packet counter to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum PacketCategory {
    Processed,
    Dropped,
    Queued,
    Peak,
    Dupe,
    Packets,
}

impl PacketCategory {
    /// Parse a category name, rejecting unknown ones as a service error.
    pub fn parse_name(name: &str) -> Result<Self, Error> {
        name.parse()
            .map_err(|_| Error::service(format!("Invalid category: {name}")))
    }

    fn rrd_field(self) -> &'static str {
        match self {
            Self::Processed => "kismet.packetchain.processed_packets_rrd",
            Self::Dropped => "kismet.packetchain.dropped_packets_rrd",
            Self::Queued => "kismet.packetchain.queued_packets_rrd",
            Self::Peak => "kismet.packetchain.peak_packets_rrd",
            Self::Dupe => "kismet.packetchain.dupe_packets_rrd",
            Self::Packets => "kismet.packetchain.packets_rrd",
        }
    }
}

/// RRD resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Timeline {
    Minute,
    Hour,
    Day,
}

impl Timeline {
    /// Parse a timeline name, rejecting unknown ones as a service error.
    pub fn parse_name(name: &str) -> Result<Self, Error> {
        name.parse()
            .map_err(|_| Error::service(format!("Invalid timeline: {name}")))
    }

    fn vec_field(self) -> &'static str {
        match self {
            Self::Minute => "kismet.common.rrd.minute_vec",
            Self::Hour => "kismet.common.rrd.hour_vec",
            Self::Day => "kismet.common.rrd.day_vec",
        }
    }

    /// Seconds covered by one slot.
    fn slot_seconds(self) -> u64 {
        match self {
            Self::Minute => 1,
            Self::Hour => 60,
            Self::Day => 3600,
        }
    }
}

impl KismetClient {
    /// Fetch one ring per category, each ordered oldest sample first.
    ///
    /// `POST /packetchain/packet_stats.json`
    pub async fn packet_stats(
        &self,
        categories: &[PacketCategory],
        timeline: Timeline,
    ) -> Result<Vec<Vec<Value>>, Error> {
        let fields: Vec<Field> = categories
            .iter()
            .flat_map(|&c| {
                [
                    Field::alias(format!("{}/{SERIAL_TIME_FIELD}", c.rrd_field()), format!("{c}_time")),
                    Field::alias(
                        format!("{}/{}", c.rrd_field(), timeline.vec_field()),
                        format!("{c}_data"),
                    ),
                ]
            })
            .collect();
        let payload = Payload::new().set_list("fields", &fields).into_value();

        let data = self
            .interact(Verb::Post, "packetchain/packet_stats.json", Some(&payload))
            .await?;

        categories
            .iter()
            .map(|&c| {
                let (ring, ts) = ring_for(&data, c)?;
                Ok(order_rrd(ring, timeline, ts))
            })
            .collect()
    }

    /// Single-category form of [`packet_stats`](Self::packet_stats).
    pub async fn packet_stats_for(
        &self,
        category: PacketCategory,
        timeline: Timeline,
    ) -> Result<Vec<Value>, Error> {
        let mut rings = self.packet_stats(&[category], timeline).await?;
        rings
            .pop()
            .ok_or_else(|| Error::service(format!("no data returned for {category}")))
    }
}

fn ring_for(data: &Value, category: PacketCategory) -> Result<(&[Value], u64), Error> {
    let data_key = format!("{category}_data");
    let time_key = format!("{category}_time");
    let missing = || Error::service(format!("Missing response {data_key} / {time_key} in data"));

    let ring = data
        .get(&data_key)
        .and_then(Value::as_array)
        .ok_or_else(missing)?;
    let ts = data.get(&time_key).and_then(Value::as_u64).ok_or_else(missing)?;
    Ok((ring, ts))
}

/// Rotate a serialized ring so the slot after the current one comes first.
fn order_rrd(ring: &[Value], timeline: Timeline, timestamp: u64) -> Vec<Value> {
    let len = ring.len() as u64;
    if len == 0 {
        return Vec::new();
    }
    let slot = usize::try_from((timestamp / timeline.slot_seconds()) % len).unwrap_or(0);
    let split = slot + 1;
    ring[split..].iter().chain(&ring[..split]).cloned().collect()
}

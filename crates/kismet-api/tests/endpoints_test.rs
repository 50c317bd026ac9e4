#![allow(clippy::unwrap_used)]
// Integration tests for the resource methods on `KismetClient` using wiremock.

use futures_util::StreamExt;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use kismet_api::{
    AccessPointQuery, ClientConfig, DeviceKeyQuery, DeviceQuery, Error, Field, KismetClient,
    PacketCategory, PcapQuery, RegexFilter, RetryPolicy, SessionCachePath, SystemTime, TimeFormat,
    Timeline, TimestampQuery,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, KismetClient) {
    let server = MockServer::start().await;
    let config = ClientConfig::new(Url::parse(&server.uri()).unwrap())
        .with_session_cache(SessionCachePath::Disabled)
        .with_retry(RetryPolicy::none());
    let client = KismetClient::new(config).unwrap();
    (server, client)
}

/// Decode the `json` form field of the most recent request.
async fn posted_json(server: &MockServer) -> Value {
    let requests = server.received_requests().await.unwrap();
    let last = requests.last().unwrap();
    let (_, raw) = url::form_urlencoded::parse(&last.body)
        .find(|(key, _)| key == "json")
        .expect("request has no json form field");
    serde_json::from_str(&raw).unwrap()
}

fn ok_stream(lines: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_string(lines)
}

// ── Device tests ────────────────────────────────────────────────────

#[tokio::test]
async fn test_devices_posts_fields() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/devices/last-time/-300/devices.itjson"))
        .respond_with(ok_stream(
            "{\"kismet.device.base.macaddr\":\"AA:BB:CC:DD:EE:FF\"}\n\
             {\"kismet.device.base.macaddr\":\"11:22:33:44:55:66\"}\n",
        ))
        .mount(&server)
        .await;

    let query = DeviceQuery {
        last_time: -300,
        fields: vec![
            Field::from("kismet.device.base.macaddr"),
            Field::alias("kismet.device.base.name", "name"),
        ],
    };
    let devices = client
        .devices(&query)
        .await
        .unwrap()
        .try_collect_values()
        .await
        .unwrap();

    assert_eq!(devices.len(), 2);
    assert_eq!(devices[1]["kismet.device.base.macaddr"], "11:22:33:44:55:66");
    assert_eq!(
        posted_json(&server).await,
        json!({"fields": ["kismet.device.base.macaddr", ["kismet.device.base.name", "name"]]})
    );
}

#[tokio::test]
async fn test_devices_without_fields_posts_empty_object() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/devices/last-time/0/devices.itjson"))
        .respond_with(ok_stream(""))
        .mount(&server)
        .await;

    let mut stream = client.devices(&DeviceQuery::default()).await.unwrap();
    assert!(stream.next().await.is_none());
    assert_eq!(posted_json(&server).await, json!({}));
}

#[tokio::test]
async fn test_devices_by_mac() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/devices/multimac/devices.itjson"))
        .respond_with(ok_stream("{\"key\":\"a\"}\n"))
        .mount(&server)
        .await;

    let macs = vec!["AA:BB:CC:00:00:00/FF:FF:FF:00:00:00".to_string()];
    let devices = client
        .devices_by_mac(&macs, &[])
        .await
        .unwrap()
        .try_collect_values()
        .await
        .unwrap();

    assert_eq!(devices, vec![json!({"key": "a"})]);
    assert_eq!(
        posted_json(&server).await,
        json!({"devices": ["AA:BB:CC:00:00:00/FF:FF:FF:00:00:00"]})
    );
}

#[tokio::test]
async fn test_device_by_key_sub_field() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(
            "/devices/by-key/4202770D00000000_1A2B/device.json/kismet.device.base.name",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("office-ap")))
        .mount(&server)
        .await;

    let query = DeviceKeyQuery {
        field: Some("kismet.device.base.name".into()),
        fields: Vec::new(),
    };
    let name = client
        .device_by_key("4202770D00000000_1A2B", &query)
        .await
        .unwrap();
    assert_eq!(name, json!("office-ap"));
}

#[tokio::test]
async fn test_device_by_key_fields_override_sub_field() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/devices/by-key/k1/device.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "x"})))
        .mount(&server)
        .await;

    let query = DeviceKeyQuery {
        field: Some("ignored".into()),
        fields: vec![Field::alias("kismet.device.base.name", "name")],
    };
    let device = client.device_by_key("k1", &query).await.unwrap();

    assert_eq!(device, json!({"name": "x"}));
    assert_eq!(
        posted_json(&server).await,
        json!({"fields": [["kismet.device.base.name", "name"]]})
    );
}

#[tokio::test]
async fn test_dot11_access_points_payload() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/devices/views/phydot11_accesspoints/devices.itjson"))
        .respond_with(ok_stream("{}\n{}\n"))
        .mount(&server)
        .await;

    let query = AccessPointQuery {
        last_time: Some(1_700_000_000),
        regex: vec![RegexFilter(
            "dot11.device/dot11.device.last_beaconed_ssid".into(),
            "^Guest".into(),
        )],
        fields: Vec::new(),
    };
    let count = client
        .dot11_access_points(&query)
        .await
        .unwrap()
        .try_collect_values()
        .await
        .unwrap()
        .len();

    assert_eq!(count, 2);
    assert_eq!(
        posted_json(&server).await,
        json!({
            "last_time": 1_700_000_000,
            "regex": [["dot11.device/dot11.device.last_beaconed_ssid", "^Guest"]]
        })
    );
}

#[tokio::test]
async fn test_dot11_clients_of() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/phy/phy80211/clients-of/ap-key/clients.itjson"))
        .respond_with(ok_stream("{\"c\":1}\n"))
        .mount(&server)
        .await;

    let mut seen = Vec::new();
    client
        .dot11_clients_of("ap-key", &[])
        .await
        .unwrap()
        .for_each_value(|v| seen.push(v))
        .await
        .unwrap();
    assert_eq!(seen, vec![json!({"c": 1})]);
}

// ── Datasource tests ────────────────────────────────────────────────

#[tokio::test]
async fn test_datasources_stream() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/datasource/all_sources.itjson"))
        .respond_with(ok_stream("{\"uuid\":\"a\"}\n{\"uuid\":\"b\"}\n"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/datasource/list_interfaces.itjson"))
        .respond_with(ok_stream("{\"interface\":\"wlan0\"}\n"))
        .mount(&server)
        .await;

    let sources = client
        .datasources()
        .await
        .unwrap()
        .try_collect_values()
        .await
        .unwrap();
    assert_eq!(sources, vec![json!({"uuid": "a"}), json!({"uuid": "b"})]);

    let interfaces = client
        .datasource_interfaces()
        .await
        .unwrap()
        .try_collect_values()
        .await
        .unwrap();
    assert_eq!(interfaces, vec![json!({"interface": "wlan0"})]);
}

#[tokio::test]
async fn test_set_channel_and_hop() {
    let (server, client) = setup().await;
    let uuid = "5FE308BD-0000-0000-0000-00C0CAE5A9C1";

    Mock::given(method("POST"))
        .and(path(format!("/datasource/by-uuid/{uuid}/set_channel.cmd")))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("/datasource/by-uuid/{uuid}/set_hop.cmd")))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    assert!(client.set_channel(uuid, "6HT40+").await.unwrap());
    assert_eq!(posted_json(&server).await, json!({"channel": "6HT40+"}));

    assert!(client.set_hop_rate(uuid, 5.0).await.unwrap());
    assert_eq!(posted_json(&server).await, json!({"rate": 5.0}));

    let channels = vec!["1".to_string(), "6".to_string(), "11".to_string()];
    assert!(client.set_hop_channels(uuid, 10.0, &channels).await.unwrap());
    assert_eq!(
        posted_json(&server).await,
        json!({"rate": 10.0, "channels": ["1", "6", "11"]})
    );

    assert!(client.set_hop(uuid).await.unwrap());
    assert_eq!(posted_json(&server).await, json!({"hop": true}));
}

#[tokio::test]
async fn test_add_datasource() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/datasource/add_source.cmd"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    assert!(client.add_datasource("wlan1:name=second").await.unwrap());
    assert_eq!(posted_json(&server).await, json!({"definition": "wlan1:name=second"}));
}

#[tokio::test]
async fn test_source_commands_are_gets() {
    let (server, client) = setup().await;

    for command in ["pause_source", "resume_source", "close_source", "open_source"] {
        Mock::given(method("GET"))
            .and(path(format!("/datasource/by-uuid/u1/{command}.cmd")))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
    }

    assert!(client.pause_datasource("u1").await.unwrap());
    assert!(client.resume_datasource("u1").await.unwrap());
    assert!(client.close_datasource("u1").await.unwrap());
    assert!(client.open_datasource("u1").await.unwrap());
}

#[tokio::test]
async fn test_source_command_rejected() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = client.pause_datasource("u1").await.unwrap_err();
    assert!(err.is_auth_required(), "got: {err:?}");
}

// ── Alerts / messages / GPS ─────────────────────────────────────────

#[tokio::test]
async fn test_alerts_since_timestamp() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/alerts/last-time/1700000000.250/alerts.ekjson"))
        .respond_with(ok_stream("{\"kismet.alert.header\":\"DEAUTHFLOOD\"}\n"))
        .mount(&server)
        .await;

    let query = TimestampQuery {
        ts_sec: 1_700_000_000,
        ts_usec: 250,
    };
    let alerts = client
        .alerts(query)
        .await
        .unwrap()
        .try_collect_values()
        .await
        .unwrap();
    assert_eq!(alerts[0]["kismet.alert.header"], "DEAUTHFLOOD");
}

#[tokio::test]
async fn test_messages_and_gps() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/messagebus/last-time/0.0/messages.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"m": 1}])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/gps/location.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"kismet.common.location.fix": 3})))
        .mount(&server)
        .await;

    let messages = client.messages(TimestampQuery::default()).await.unwrap();
    assert_eq!(messages, json!([{"m": 1}]));

    let location = client.gps_location().await.unwrap();
    assert_eq!(location["kismet.common.location.fix"], 3);
}

// ── System tests ────────────────────────────────────────────────────

#[tokio::test]
async fn test_system_time_formats() {
    let (server, client) = setup().await;

    let raw = json!({
        "kismet.system.timestamp.sec": 1_588_334_400,
        "kismet.system.timestamp.usec": 5
    });
    Mock::given(method("GET"))
        .and(path("/system/timestamp.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&raw))
        .mount(&server)
        .await;

    assert_eq!(
        client.system_time(TimeFormat::Raw).await.unwrap(),
        SystemTime::Raw(raw)
    );
    assert_eq!(
        client.system_time(TimeFormat::Iso).await.unwrap(),
        SystemTime::Iso("2020-05-01T12:00:00.000005Z".into())
    );
}

#[tokio::test]
async fn test_system_status() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/system/status.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"kismet.system.devices.count": 42})))
        .mount(&server)
        .await;

    let status = client.system_status().await.unwrap();
    assert_eq!(status["kismet.system.devices.count"], 42);
}

// ── Packet statistics tests ─────────────────────────────────────────

#[tokio::test]
async fn test_packet_stats_rotates_rings() {
    let (server, client) = setup().await;

    let ring: Vec<u64> = (0..60).collect();
    Mock::given(method("POST"))
        .and(path("/packetchain/packet_stats.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "processed_time": 125,
            "processed_data": ring,
            "dropped_time": 59,
            "dropped_data": ring,
        })))
        .mount(&server)
        .await;

    let rings = client
        .packet_stats(
            &[PacketCategory::Processed, PacketCategory::Dropped],
            Timeline::Minute,
        )
        .await
        .unwrap();

    assert_eq!(rings.len(), 2);
    assert_eq!(rings[0][0], json!(6));
    assert_eq!(rings[0][59], json!(5));
    assert_eq!(rings[1][0], json!(0));
    assert_eq!(rings[1][59], json!(59));

    let posted = posted_json(&server).await;
    assert_eq!(
        posted["fields"][0],
        json!([
            "kismet.packetchain.processed_packets_rrd/kismet.common.rrd.serial_time",
            "processed_time"
        ])
    );
    assert_eq!(
        posted["fields"][3],
        json!([
            "kismet.packetchain.dropped_packets_rrd/kismet.common.rrd.minute_vec",
            "dropped_data"
        ])
    );
}

#[tokio::test]
async fn test_packet_stats_missing_data_is_service_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/packetchain/packet_stats.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let err = client
        .packet_stats_for(PacketCategory::Dupe, Timeline::Hour)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Service { .. }), "got: {err:?}");
}

// ── kismetdb tests ──────────────────────────────────────────────────

#[tokio::test]
async fn test_kismetdb_packets_returns_raw_bytes() {
    let (server, client) = setup().await;

    let pcap = vec![0x0a, 0x0d, 0x0d, 0x0a, 0x00, 0xff];
    Mock::given(method("POST"))
        .and(path("/logging/kismetdb/pcap/capture.pcapng"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(pcap.clone()))
        .mount(&server)
        .await;

    let query = PcapQuery {
        title: "capture".into(),
        filter: Some(json!({"timestamp_start": 1_700_000_000})),
    };
    let body = client.kismetdb_packets(&query).await.unwrap();

    assert_eq!(body.as_ref(), pcap.as_slice());
    assert_eq!(
        posted_json(&server).await,
        json!({"filter": {"timestamp_start": 1_700_000_000}})
    );
}

#[tokio::test]
async fn test_drop_packets() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/logging/kismetdb/pcap/drop.cmd"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    assert!(client.drop_packets(1_700_000_000).await.unwrap());
    assert_eq!(posted_json(&server).await, json!({"drop_before": 1_700_000_000}));
}

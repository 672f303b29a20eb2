//! End-to-end behaviour of the assembled Device: boot, tick ordering,
//! shell operations, and config commit side effects.

use envsense::app::config_store::{CONFIG_KEY, CONFIG_NAMESPACE, decode_image};
use envsense::app::network::{HEALTH_CHECK_INTERVAL_MS, NetworkState};
use envsense::app::ports::{ClimateSample, Clock};
use envsense::app::sensor::PollOutcome;
use envsense::app::service::Device;
use envsense::app::telemetry::DispatchOutcome;
use envsense::config::DeviceConfig;
use envsense::error::{ConfigError, DispatchError, StorageError};

use crate::mock_hw::{
    AP_IP, MockHttp, MockRadio, MockSensor, MockStorage, RadioCall, STA_IP, SimClock, TestDevice,
    home_device, storage_with, tick_at,
};

const INFLUX_URL: &str = "http://influxdb:8086/write?db=temp";

fn device_on(ssid: &str, radio: MockRadio, http: MockHttp) -> TestDevice {
    Device::new(
        storage_with(&[("ssid", ssid), ("wifi_pw", "password1")]),
        radio,
        MockSensor::healthy(72.0, 45.0),
        http,
        SimClock::default(),
    )
    .unwrap()
}

#[test]
fn unreadable_storage_fails_assembly() {
    let storage = MockStorage {
        fail_reads: true,
        ..MockStorage::default()
    };
    let result = Device::new(
        storage,
        MockRadio::default(),
        MockSensor::broken(),
        MockHttp::answering(204),
        SimClock::default(),
    );
    assert_eq!(result.err(), Some(ConfigError::Storage(StorageError::Io)));
}

#[test]
fn boot_joins_network_and_reports_first_interval() {
    let mut dev = home_device();
    assert_eq!(dev.begin(), NetworkState::StationConnected);
    assert_eq!(dev.network().local_ip(), Some(STA_IP));

    let first = tick_at(&mut dev, 10_000);
    assert_eq!(first.sensor, PollOutcome::Acquired);
    assert_eq!(first.telemetry, DispatchOutcome::NotDue);

    for t in (20_000..=50_000).step_by(10_000) {
        assert_eq!(tick_at(&mut dev, t).telemetry, DispatchOutcome::NotDue);
    }
    let report = tick_at(&mut dev, 60_000);
    assert_eq!(report.telemetry, DispatchOutcome::Sent);

    let posts = &dev.telemetry().http().posts;
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].url, INFLUX_URL);
    assert!(posts[0].body.contains("temperature=72.00,humidity=45.00"));
}

#[test]
fn telemetry_sees_the_sample_taken_in_the_same_tick() {
    let mut dev = home_device();
    for _ in 0..5 {
        dev.sensor_mut().port_mut().script.push_back(Ok(ClimateSample {
            temperature_f: 70.0,
            humidity: 45.0,
        }));
    }
    dev.begin();
    for t in (10_000..=50_000).step_by(10_000) {
        tick_at(&mut dev, t);
    }
    assert_eq!(dev.reading().temperature, Some(70.0));

    let report = tick_at(&mut dev, 60_000);

    assert_eq!(report.sensor, PollOutcome::Acquired);
    assert_eq!(report.telemetry, DispatchOutcome::Sent);
    assert!(dev.telemetry().http().posts[0].body.contains("temperature=72.00"));
}

#[test]
fn unreachable_network_leaves_device_in_access_point_mode() {
    let mut dev = device_on("neighbour", MockRadio::reaching("home"), MockHttp::answering(204));

    assert_eq!(dev.begin(), NetworkState::AccessPointMode);
    assert_eq!(dev.network().ap_ssid(), "ENV-123456");
    assert_eq!(dev.network().local_ip(), Some(AP_IP));

    let report = tick_at(&mut dev, 60_000);
    assert_eq!(report.sensor, PollOutcome::Acquired);
    assert_eq!(report.telemetry, DispatchOutcome::NotConnected);
    assert!(dev.telemetry().http().posts.is_empty());
}

#[test]
fn failed_delivery_is_retried_with_current_data_next_interval() {
    let mut dev = device_on("home", MockRadio::reaching("home"), MockHttp::answering(500));
    dev.begin();

    let report = tick_at(&mut dev, 60_000);
    assert_eq!(report.telemetry, DispatchOutcome::Failed(DispatchError::Status(500)));
    assert!(dev.reading().is_complete(), "a failed send must not touch the reading");

    dev.telemetry_mut().http_mut().response = Ok(204);
    assert_eq!(tick_at(&mut dev, 120_000).telemetry, DispatchOutcome::Sent);
    assert_eq!(dev.telemetry().http().posts.len(), 2);
    assert_eq!(dev.telemetry().failed_count(), 1);
    assert_eq!(dev.telemetry().sent_count(), 1);
}

#[test]
fn staged_backend_change_applies_only_after_commit() {
    let mut dev = home_device();
    dev.begin();
    tick_at(&mut dev, 60_000);

    dev.set_config("db_host", "db.lan").unwrap();
    tick_at(&mut dev, 120_000);
    assert_eq!(dev.telemetry().http().posts[1].url, INFLUX_URL);

    dev.commit_config().unwrap();
    assert!(!dev.needs_reconnect());
    tick_at(&mut dev, 180_000);
    assert_eq!(dev.telemetry().http().posts[2].url, "http://db.lan:8086/write?db=temp");
}

#[test]
fn discarded_backend_change_never_reaches_the_wire() {
    let mut dev = home_device();
    dev.begin();

    dev.set_config("db_host", "elsewhere.lan").unwrap();
    dev.set_config("interval", "5").unwrap();
    assert_eq!(tick_at(&mut dev, 60_000).telemetry, DispatchOutcome::Sent);
    assert_eq!(dev.telemetry().http().posts[0].url, INFLUX_URL);

    dev.discard_config().unwrap();
    assert_eq!(dev.config().db_host.as_str(), "influxdb");
    assert_eq!(dev.telemetry().period_ms(), 60_000);

    assert_eq!(tick_at(&mut dev, 120_000).telemetry, DispatchOutcome::Sent);
    let urls: Vec<_> = dev.telemetry().http().posts.iter().map(|p| p.url.as_str()).collect();
    assert_eq!(urls, [INFLUX_URL, INFLUX_URL]);
}

#[test]
fn health_check_ignores_staged_credentials() {
    let mut dev = device_on("neighbour", MockRadio::reaching("home"), MockHttp::answering(204));
    assert_eq!(dev.begin(), NetworkState::AccessPointMode);

    dev.set_config("ssid", "home").unwrap();
    let booted = dev.clock().now_ms();
    tick_at(&mut dev, booted + HEALTH_CHECK_INTERVAL_MS);

    let last_station = dev.network().radio().calls.iter().rev().find_map(|c| match c {
        RadioCall::Station { ssid, .. } => Some(ssid.as_str()),
        RadioCall::AccessPoint { .. } => None,
    });
    assert_eq!(last_station, Some("neighbour"));
    assert!(!dev.network().is_connected());
    assert_eq!(dev.live_config().ssid.as_str(), "neighbour");
}

#[test]
fn committed_interval_change_reschedules_telemetry() {
    let mut dev = home_device();
    dev.begin();
    let committed_at = 250;
    assert_eq!(dev.config_store().storage().writes, 0);

    dev.set_config("interval", "10").unwrap();
    dev.commit_config().unwrap();
    assert_eq!(dev.telemetry().period_ms(), 10_000);
    assert_eq!(dev.config_store().storage().writes, 1);

    assert_eq!(tick_at(&mut dev, 10_000).telemetry, DispatchOutcome::NotDue);
    assert_eq!(tick_at(&mut dev, committed_at + 10_000).telemetry, DispatchOutcome::Sent);
}

#[test]
fn wifi_change_requests_reconnect_after_commit() {
    let mut dev = home_device();
    dev.begin();

    dev.set_config("ssid", "elsewhere").unwrap();
    assert!(!dev.needs_reconnect(), "staged credentials are not live");
    dev.commit_config().unwrap();
    assert!(dev.needs_reconnect());

    assert_eq!(dev.reconnect(), NetworkState::AccessPointMode);
    assert!(!dev.needs_reconnect());
}

#[test]
fn reset_restores_and_persists_defaults() {
    let mut dev = home_device();
    dev.begin();
    dev.set_config("location", "garage").unwrap();
    dev.commit_config().unwrap();

    dev.reset_config().unwrap();

    assert_eq!(dev.config(), &DeviceConfig::default());
    assert!(dev.needs_reconnect());
    let stored = dev.config_store().storage().blob(CONFIG_NAMESPACE, CONFIG_KEY).unwrap();
    assert_eq!(decode_image(stored), Some(DeviceConfig::default()));
}

#[test]
fn rejected_shell_input_changes_nothing() {
    let mut dev = home_device();
    let before = dev.config().clone();

    assert_eq!(dev.set_config("db_port", "70000"), Err(ConfigError::OutOfRange("db_port")));
    assert_eq!(dev.set_config("colour", "red"), Err(ConfigError::UnknownField));

    assert_eq!(dev.config(), &before);
}

#[test]
fn summaries_render_for_the_admin_shell() {
    let mut dev = home_device();
    dev.begin();

    let config = dev.config_summary().to_json().unwrap();
    assert!(config.contains(r#""mac":"24:0A:C4:12:34:56""#));
    assert!(config.contains(r#""ssid":"home""#));
    assert!(config.contains(r#""wifi_pw_set":true"#));
    assert!(!config.contains("password1"));

    let empty = dev.sensor_summary().to_json().unwrap();
    assert!(empty.contains(r#""temperature":null"#));

    tick_at(&mut dev, 10_000);
    let live = dev.sensor_summary().to_json().unwrap();
    assert!(live.contains(r#""temperature":72.0"#));
    assert!(live.contains(r#""analog":2048"#));
}

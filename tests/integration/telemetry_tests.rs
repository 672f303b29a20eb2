//! TelemetryDispatcher gating, delivery, and failure handling against a
//! recording HTTP mock.

use envsense::app::sensor::Reading;
use envsense::app::telemetry::{DispatchOutcome, TelemetryDispatcher};
use envsense::config::{ConfigField, DeviceConfig};
use envsense::error::DispatchError;

use crate::mock_hw::{MockHttp, Posted};

const PERIOD: u64 = 60_000;

fn complete() -> Reading {
    Reading {
        temperature: Some(72.0),
        humidity: Some(45.0),
        heat_index: Some(72.5),
        analog: Some(2048),
        pressure: Some(100.0),
        last_success_ms: Some(50_000),
    }
}

fn dispatcher(status: u16) -> (TelemetryDispatcher<MockHttp>, DeviceConfig) {
    let cfg = DeviceConfig::default();
    (TelemetryDispatcher::new(MockHttp::answering(status), &cfg, 0), cfg)
}

#[test]
fn posts_one_line_per_interval() {
    let (mut tx, cfg) = dispatcher(204);

    assert_eq!(tx.poll(&cfg, true, &complete(), PERIOD - 1), DispatchOutcome::NotDue);
    assert_eq!(tx.poll(&cfg, true, &complete(), PERIOD), DispatchOutcome::Sent);
    assert_eq!(tx.poll(&cfg, true, &complete(), PERIOD + 1), DispatchOutcome::NotDue);

    assert_eq!(
        tx.http().posts,
        vec![Posted {
            url: "http://influxdb:8086/write?db=temp".into(),
            content_type: "text/plain; charset=utf-8".into(),
            body: "ambient,host=envsense-1,location=unknown \
                   temperature=72.00,humidity=45.00,heat_index=72.50"
                .into(),
        }]
    );
    assert_eq!(tx.sent_count(), 1);
}

#[test]
fn disabled_backend_never_posts() {
    let (mut tx, mut cfg) = dispatcher(204);
    cfg.apply(ConfigField::BackendType, "none").unwrap();

    assert_eq!(tx.poll(&cfg, true, &complete(), PERIOD), DispatchOutcome::Disabled);
    assert!(tx.http().posts.is_empty());
}

#[test]
fn backend_without_encoder_is_unsupported() {
    let (mut tx, mut cfg) = dispatcher(204);
    cfg.apply(ConfigField::BackendType, "http").unwrap();

    assert_eq!(tx.poll(&cfg, true, &complete(), PERIOD), DispatchOutcome::Unsupported);
    assert!(tx.http().posts.is_empty());
}

#[test]
fn offline_interval_is_skipped_not_queued() {
    let (mut tx, cfg) = dispatcher(204);

    assert_eq!(tx.poll(&cfg, false, &complete(), PERIOD), DispatchOutcome::NotConnected);
    assert_eq!(tx.poll(&cfg, true, &complete(), 2 * PERIOD), DispatchOutcome::Sent);
    assert_eq!(tx.http().posts.len(), 1);
}

#[test]
fn incomplete_reading_is_not_sent() {
    let (mut tx, cfg) = dispatcher(204);
    let reading = Reading {
        heat_index: None,
        ..complete()
    };

    assert_eq!(tx.poll(&cfg, true, &reading, PERIOD), DispatchOutcome::InvalidReading);
    assert_eq!(
        tx.poll(&cfg, true, &Reading::default(), 2 * PERIOD),
        DispatchOutcome::InvalidReading
    );
    assert!(tx.http().posts.is_empty());
}

#[test]
fn server_error_is_dropped_and_next_interval_sends_fresh_data() {
    let (mut tx, cfg) = dispatcher(500);

    assert_eq!(
        tx.poll(&cfg, true, &complete(), PERIOD),
        DispatchOutcome::Failed(DispatchError::Status(500))
    );
    assert_eq!(tx.failed_count(), 1);

    tx.http_mut().response = Ok(204);
    let newer = Reading {
        temperature: Some(80.0),
        ..complete()
    };
    assert_eq!(tx.poll(&cfg, true, &newer, 2 * PERIOD), DispatchOutcome::Sent);

    let posts = &tx.http().posts;
    assert_eq!(posts.len(), 2);
    assert!(posts[1].body.contains("temperature=80.00"));
    assert_eq!(posts[1].body.lines().count(), 1, "no backlog in the body");
}

#[test]
fn success_means_exactly_204() {
    let (mut tx, cfg) = dispatcher(200);
    assert_eq!(
        tx.poll(&cfg, true, &complete(), PERIOD),
        DispatchOutcome::Failed(DispatchError::Status(200))
    );
}

#[test]
fn transport_error_is_reported() {
    let (mut tx, cfg) = dispatcher(204);
    tx.http_mut().response = Err(DispatchError::Connection);

    assert_eq!(
        tx.poll(&cfg, true, &complete(), PERIOD),
        DispatchOutcome::Failed(DispatchError::Connection)
    );
}

#[test]
fn destination_is_cached_until_invalidated() {
    let (mut tx, mut cfg) = dispatcher(204);
    tx.poll(&cfg, true, &complete(), PERIOD);
    assert_eq!(tx.destination(), Some("http://influxdb:8086/write?db=temp"));

    cfg.apply(ConfigField::BackendHost, "10.0.0.9").unwrap();
    tx.poll(&cfg, true, &complete(), 2 * PERIOD);
    assert_eq!(tx.http().posts[1].url, "http://influxdb:8086/write?db=temp");

    tx.invalidate(&cfg, 2 * PERIOD);
    assert_eq!(tx.destination(), None);
    tx.poll(&cfg, true, &complete(), 3 * PERIOD);
    assert_eq!(tx.http().posts[2].url, "http://10.0.0.9:8086/write?db=temp");
}

#[test]
fn special_characters_in_tags_are_escaped() {
    let (mut tx, mut cfg) = dispatcher(204);
    cfg.apply(ConfigField::Location, "living room, north").unwrap();
    tx.poll(&cfg, true, &complete(), PERIOD);

    assert!(tx.http().posts[0].body.contains(r"location=living\ room\,\ north "));
}

#[test]
fn interval_change_takes_effect_on_invalidate() {
    let (mut tx, mut cfg) = dispatcher(204);
    cfg.apply(ConfigField::SampleInterval, "10").unwrap();
    tx.invalidate(&cfg, 5_000);

    assert_eq!(tx.period_ms(), 10_000);
    assert_eq!(tx.poll(&cfg, true, &complete(), 14_999), DispatchOutcome::NotDue);
    assert_eq!(tx.poll(&cfg, true, &complete(), 15_000), DispatchOutcome::Sent);
}

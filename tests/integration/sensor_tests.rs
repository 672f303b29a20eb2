//! SensorMonitor cadence, calibration, fault tolerance and power-cycle
//! recovery against a scripted sensor.

use envsense::app::ports::{ClimateSample, Clock};
use envsense::app::sensor::{
    POWER_SETTLE_MS, PollOutcome, Reading, SAMPLE_PERIOD_MS, STABILISE_PERIODS, SensorMonitor,
};
use envsense::config::{ConfigField, DeviceConfig};
use envsense::error::SensorError;
use envsense::sensors::analog::ANALOG_SAMPLES;

use crate::mock_hw::{MockSensor, SensorCall, SimClock};

fn started(sensor: MockSensor) -> (SensorMonitor<MockSensor>, SimClock) {
    let clock = SimClock::default();
    let mut monitor = SensorMonitor::new(sensor, clock.now_ms());
    monitor.begin();
    (monitor, clock)
}

fn poll_at(
    monitor: &mut SensorMonitor<MockSensor>,
    cfg: &DeviceConfig,
    clock: &mut SimClock,
    ms: u64,
) -> PollOutcome {
    clock.set_ms(ms);
    monitor.poll(cfg, clock)
}

#[test]
fn begin_powers_then_starts_the_sensor() {
    let (monitor, _) = started(MockSensor::healthy(72.0, 45.0));
    assert_eq!(monitor.port().calls, vec![SensorCall::Power(true), SensorCall::Begin]);
}

#[test]
fn nothing_is_read_before_the_first_period() {
    let cfg = DeviceConfig::default();
    let (mut monitor, mut clock) = started(MockSensor::healthy(72.0, 45.0));

    assert_eq!(poll_at(&mut monitor, &cfg, &mut clock, SAMPLE_PERIOD_MS - 1), PollOutcome::NotDue);
    assert_eq!(monitor.port().count(SensorCall::Climate), 0);
    assert_eq!(monitor.reading(), Reading::default());
}

#[test]
fn good_sample_fills_every_field() {
    let cfg = DeviceConfig::default();
    let (mut monitor, mut clock) = started(MockSensor::healthy(72.0, 45.0));

    assert_eq!(poll_at(&mut monitor, &cfg, &mut clock, SAMPLE_PERIOD_MS), PollOutcome::Acquired);

    let r = monitor.reading();
    assert_eq!(r.temperature, Some(72.0));
    assert_eq!(r.humidity, Some(45.0));
    assert!(r.heat_index.is_some());
    assert_eq!(r.analog, Some(2048));
    let pressure = r.pressure.unwrap();
    assert!((pressure - 100.02).abs() < 0.01, "pressure {pressure}");
    assert_eq!(r.last_success_ms, Some(SAMPLE_PERIOD_MS));
    assert!(r.is_complete());
    assert_eq!(monitor.port().analog_reads, ANALOG_SAMPLES);
}

#[test]
fn analog_averaging_spaces_its_samples() {
    let cfg = DeviceConfig::default();
    let (mut monitor, mut clock) = started(MockSensor::healthy(72.0, 45.0));
    poll_at(&mut monitor, &cfg, &mut clock, SAMPLE_PERIOD_MS);
    assert_eq!(clock.slept_us, u64::from(ANALOG_SAMPLES) * 100);
}

#[test]
fn zero_analog_average_means_no_pressure() {
    let cfg = DeviceConfig::default();
    let mut sensor = MockSensor::healthy(72.0, 45.0);
    sensor.analog = 0;
    let (mut monitor, mut clock) = started(sensor);

    poll_at(&mut monitor, &cfg, &mut clock, SAMPLE_PERIOD_MS);

    assert_eq!(monitor.reading().analog, Some(0));
    assert_eq!(monitor.reading().pressure, None);
}

#[test]
fn temperature_offset_is_subtracted() {
    let mut cfg = DeviceConfig::default();
    cfg.apply(ConfigField::TempOffset, "2.5").unwrap();
    let (mut monitor, mut clock) = started(MockSensor::healthy(72.0, 45.0));

    poll_at(&mut monitor, &cfg, &mut clock, SAMPLE_PERIOD_MS);

    assert_eq!(monitor.reading().temperature, Some(69.5));
}

#[test]
fn overflowing_heat_index_is_no_data() {
    let cfg = DeviceConfig::default();
    let (mut monitor, mut clock) = started(MockSensor::healthy(1.0e30, 45.0));

    assert_eq!(poll_at(&mut monitor, &cfg, &mut clock, SAMPLE_PERIOD_MS), PollOutcome::Acquired);

    let r = monitor.reading();
    assert_eq!(r.heat_index, None);
    assert!(!r.is_complete());
}

#[test]
fn transient_fault_keeps_last_known_values() {
    let cfg = DeviceConfig::default();
    let mut sensor = MockSensor::healthy(72.0, 45.0);
    sensor.script.push_back(Ok(ClimateSample {
        temperature_f: 68.0,
        humidity: 50.0,
    }));
    sensor.script.push_back(Err(SensorError::Checksum));
    sensor.script.push_back(Ok(ClimateSample {
        temperature_f: f32::NAN,
        humidity: 50.0,
    }));
    let (mut monitor, mut clock) = started(sensor);

    assert_eq!(poll_at(&mut monitor, &cfg, &mut clock, 10_000), PollOutcome::Acquired);
    let good = monitor.reading();
    assert_eq!(poll_at(&mut monitor, &cfg, &mut clock, 20_000), PollOutcome::Invalid);
    assert_eq!(poll_at(&mut monitor, &cfg, &mut clock, 30_000), PollOutcome::Invalid);
    assert_eq!(monitor.reading(), good);

    assert_eq!(poll_at(&mut monitor, &cfg, &mut clock, 40_000), PollOutcome::Acquired);
    assert_eq!(monitor.reading().temperature, Some(72.0));
    assert_eq!(monitor.resets(), 0);
}

#[test]
fn sensor_dead_past_threshold_is_power_cycled_once() {
    let cfg = DeviceConfig::default();
    let mut sensor = MockSensor::broken();
    sensor.script.push_back(Ok(ClimateSample {
        temperature_f: 70.0,
        humidity: 40.0,
    }));
    let (mut monitor, mut clock) = started(sensor);

    assert_eq!(poll_at(&mut monitor, &cfg, &mut clock, 10_000), PollOutcome::Acquired);
    // Exactly 60 s since the last success is still within tolerance.
    for t in (20_000..=70_000).step_by(10_000) {
        assert_eq!(poll_at(&mut monitor, &cfg, &mut clock, t), PollOutcome::Invalid, "at {t}");
        assert_eq!(monitor.reading().temperature, Some(70.0));
    }

    let slept_before = clock.slept_us;
    assert_eq!(poll_at(&mut monitor, &cfg, &mut clock, 80_000), PollOutcome::Reset);

    assert_eq!(monitor.resets(), 1);
    assert_eq!(monitor.reading(), Reading::default());
    assert_eq!(clock.slept_us - slept_before, u64::from(POWER_SETTLE_MS) * 1_000);
    assert_eq!(
        monitor.port().calls[monitor.port().calls.len() - 3..],
        [SensorCall::Power(false), SensorCall::Power(true), SensorCall::Begin]
    );

    // Sampling resumes only after the stabilisation window.
    let resumed = 80_000 + u64::from(POWER_SETTLE_MS);
    let window = u64::from(STABILISE_PERIODS) * SAMPLE_PERIOD_MS;
    assert_eq!(
        poll_at(&mut monitor, &cfg, &mut clock, resumed + window - 1),
        PollOutcome::NotDue
    );
    assert_eq!(
        poll_at(&mut monitor, &cfg, &mut clock, resumed + window),
        PollOutcome::Invalid
    );
    assert_eq!(monitor.resets(), 1);
}

#[test]
fn sensor_that_never_worked_is_reset_after_threshold_from_boot() {
    let cfg = DeviceConfig::default();
    let (mut monitor, mut clock) = started(MockSensor::broken());

    for t in (10_000..=60_000).step_by(10_000) {
        assert_eq!(poll_at(&mut monitor, &cfg, &mut clock, t), PollOutcome::Invalid);
    }
    assert_eq!(poll_at(&mut monitor, &cfg, &mut clock, 70_000), PollOutcome::Reset);
    assert_eq!(monitor.port().count(SensorCall::Begin), 2);
}

#[test]
fn sensor_recovers_after_reset() {
    let cfg = DeviceConfig::default();
    let (mut monitor, mut clock) = started(MockSensor::broken());
    for t in (10_000..=70_000).step_by(10_000) {
        poll_at(&mut monitor, &cfg, &mut clock, t);
    }
    assert_eq!(monitor.resets(), 1);

    monitor.port_mut().steady = Ok(ClimateSample {
        temperature_f: 75.0,
        humidity: 30.0,
    });
    assert_eq!(poll_at(&mut monitor, &cfg, &mut clock, 100_000), PollOutcome::Acquired);
    assert_eq!(monitor.reading().temperature, Some(75.0));
}

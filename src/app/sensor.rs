//! Sensor monitor: acquisition cadence, validity tracking, and recovery.
//!
//! ```text
//!   every 10 s ─▶ read_climate ──ok──▶ calibrate ─▶ heat index ─▶ analog avg
//!                      │                                 │
//!                    fault                        Reading replaced
//!                      ▼
//!        last success > 60 s ago? ──no──▶ keep last-known values
//!                      │
//!                     yes
//!                      ▼
//!   power off ─▶ 500 ms ─▶ power on ─▶ begin ─▶ skip 2 periods ─▶ Reading cleared
//! ```
//!
//! The [`Reading`] is replaced as a whole on success and cleared as a whole
//! on reset, so a consumer never sees fields from two different cycles.

use log::{debug, info, warn};

use crate::app::ports::{Clock, SensorPort};
use crate::config::DeviceConfig;
use crate::interval::IntervalTimer;
use crate::sensors::{analog, heat_index};

pub const SAMPLE_PERIOD_MS: u64 = 10_000;
/// Time without a good read before the sensor is power-cycled.
pub const RESET_THRESHOLD_MS: u64 = 60_000;
pub const POWER_SETTLE_MS: u32 = 500;
/// Sample periods skipped after a power cycle.
pub const STABILISE_PERIODS: u32 = 2;

/// Latest acquired sample.  `None` means "no data".
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Reading {
    /// Calibrated temperature, °F.
    pub temperature: Option<f32>,
    /// Relative humidity, %.
    pub humidity: Option<f32>,
    /// Heat index, °F.
    pub heat_index: Option<f32>,
    /// Averaged raw analog counts.
    pub analog: Option<u16>,
    pub pressure: Option<f32>,
    /// Monotonic timestamp of the acquisition that produced this reading.
    pub last_success_ms: Option<u64>,
}

impl Reading {
    /// Temperature, humidity and heat index are all present.
    pub fn is_complete(&self) -> bool {
        self.temperature.is_some() && self.humidity.is_some() && self.heat_index.is_some()
    }
}

/// What a call to [`SensorMonitor::poll`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    NotDue,
    Acquired,
    /// Bad read; last-known values kept.
    Invalid,
    /// Bad read past the threshold; sensor power-cycled and reading cleared.
    Reset,
}

pub struct SensorMonitor<P: SensorPort> {
    port: P,
    reading: Reading,
    timer: IntervalTimer,
    /// Baseline for the reset threshold.  Boot and each reset count as a
    /// fresh start.
    last_success_ms: u64,
    resets: u32,
}

impl<P: SensorPort> SensorMonitor<P> {
    pub fn new(port: P, now_ms: u64) -> Self {
        Self {
            port,
            reading: Reading::default(),
            timer: IntervalTimer::new(SAMPLE_PERIOD_MS, now_ms),
            last_success_ms: now_ms,
            resets: 0,
        }
    }

    /// Power the sensor and start its driver.
    pub fn begin(&mut self) {
        self.port.set_power(true);
        self.port.begin();
        info!("Sensor: started, sampling every {} ms", SAMPLE_PERIOD_MS);
    }

    pub fn poll<C: Clock>(&mut self, cfg: &DeviceConfig, clock: &mut C) -> PollOutcome {
        let now = clock.now_ms();
        if !self.timer.fire(now) {
            return PollOutcome::NotDue;
        }

        let sample = match self.port.read_climate() {
            Ok(s) if s.temperature_f.is_finite() && s.humidity.is_finite() => s,
            Ok(_) => return self.on_fault(clock, "not a number"),
            Err(e) => {
                let outcome = self.on_fault(clock, "read failed");
                debug!("Sensor: driver error: {}", e);
                return outcome;
            }
        };

        let temperature = sample.temperature_f - cfg.t_offset;
        let humidity = sample.humidity;
        let port = &mut self.port;
        let raw = analog::average_samples(|| port.read_analog(), clock);

        self.reading = Reading {
            temperature: Some(temperature),
            humidity: Some(humidity),
            heat_index: Some(heat_index::heat_index_f(temperature, humidity)).filter(|hi| hi.is_finite()),
            analog: Some(raw),
            pressure: analog::pressure_from_raw(raw),
            last_success_ms: Some(now),
        };
        self.last_success_ms = now;
        debug!("Sensor: {:.1} F, {:.1} %, analog {}", temperature, humidity, raw);
        PollOutcome::Acquired
    }

    /// Consistent copy of the latest reading.
    pub fn reading(&self) -> Reading {
        self.reading
    }

    /// Power cycles performed since boot.
    pub fn resets(&self) -> u32 {
        self.resets
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    fn on_fault<C: Clock>(&mut self, clock: &mut C, what: &str) -> PollOutcome {
        let stale_for = clock.now_ms().saturating_sub(self.last_success_ms);
        if stale_for <= RESET_THRESHOLD_MS {
            warn!("Sensor: {}, keeping last reading ({} ms since last success)", what, stale_for);
            return PollOutcome::Invalid;
        }
        warn!("Sensor: {} for {} ms, power-cycling", what, stale_for);
        self.power_cycle(clock);
        PollOutcome::Reset
    }

    fn power_cycle<C: Clock>(&mut self, clock: &mut C) {
        self.port.set_power(false);
        clock.delay_ms(POWER_SETTLE_MS);
        self.port.set_power(true);
        self.port.begin();

        let now = clock.now_ms();
        self.timer.defer(now, STABILISE_PERIODS);
        self.reading = Reading::default();
        self.last_success_ms = now;
        self.resets += 1;
        info!("Sensor: reset #{} done, resuming in {} ms", self.resets, self.timer.remaining(now));
    }
}

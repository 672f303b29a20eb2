//! Port traits, the hexagonal boundary between the device core and the
//! outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ConfigStore / NetworkManager /
//!                              SensorMonitor / TelemetryDispatcher
//! ```
//!
//! Driven adapters (NVS, WiFi radio, sensor hardware, HTTP client, clock)
//! implement these traits.  The core components are generic over them, so
//! every control-loop decision is testable on the host with scripted mocks.

use core::net::Ipv4Addr;

use embedded_hal::delay::DelayNs;

use crate::error::{DispatchError, NetworkError, SensorError, StorageError};

// ───────────────────────────────────────────────────────────────
// Clock
// ───────────────────────────────────────────────────────────────

/// Monotonic time source plus blocking delays.
///
/// Blocking delays are only used by the bounded WiFi bring-up and the
/// sensor power-cycle settle time; steady-state polling never sleeps.
pub trait Clock: DelayNs {
    /// Milliseconds since boot.
    fn now_ms(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Storage port
// ───────────────────────────────────────────────────────────────

/// Persistent key-value blob storage (NVS on device).
///
/// # Atomicity
///
/// `write` MUST replace the whole value or nothing.  The ESP-IDF NVS API
/// guarantees this per `nvs_commit()`; the host simulation achieves it
/// trivially.
pub trait StoragePort {
    /// Read a value.  Returns the number of bytes written to `buf`.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Write a value atomically.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;
}

// ───────────────────────────────────────────────────────────────
// WiFi radio port
// ───────────────────────────────────────────────────────────────

/// The WiFi driver, in station or access-point role.
pub trait WifiRadio {
    /// Switch to station mode and start associating with `ssid`.
    /// Returns as soon as the attempt is started; completion is observed
    /// through [`link_up`](Self::link_up).
    fn begin_station(&mut self, hostname: &str, ssid: &str, passphrase: &str)
    -> Result<(), NetworkError>;

    /// Station is associated and has an address.
    fn link_up(&self) -> bool;

    /// Signal strength of the associated AP in dBm.
    fn rssi(&self) -> Option<i8>;

    /// Address assigned to the station interface.
    fn station_ip(&self) -> Option<Ipv4Addr>;

    /// Switch to access-point mode hosting `ssid`.  Returns the AP address.
    fn start_access_point(&mut self, ssid: &str, passphrase: &str)
    -> Result<Ipv4Addr, NetworkError>;

    /// Factory MAC address of the radio.
    fn mac_address(&self) -> [u8; 6];
}

// ───────────────────────────────────────────────────────────────
// Sensor port
// ───────────────────────────────────────────────────────────────

/// One temperature/humidity read, taken in a single transaction so the
/// pair always belongs to the same measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClimateSample {
    /// Degrees Fahrenheit, uncalibrated.
    pub temperature_f: f32,
    /// Relative humidity in percent.
    pub humidity: f32,
}

/// The physical sensor plus its switched supply and the auxiliary analog input.
pub trait SensorPort {
    /// Initialise (or re-initialise) the sensor driver.
    fn begin(&mut self);

    /// Switch the sensor supply rail.
    fn set_power(&mut self, on: bool);

    /// Read temperature and humidity together.
    fn read_climate(&mut self) -> Result<ClimateSample, SensorError>;

    /// One raw sample from the auxiliary analog channel.
    fn read_analog(&mut self) -> u16;
}

// ───────────────────────────────────────────────────────────────
// HTTP port
// ───────────────────────────────────────────────────────────────

/// Outbound HTTP client used by the telemetry dispatcher.
pub trait HttpPort {
    /// POST `body` to `url` and return the response status code.
    /// Transport failures map to [`DispatchError::Connection`].
    fn post(&mut self, url: &str, content_type: &str, body: &[u8]) -> Result<u16, DispatchError>;
}

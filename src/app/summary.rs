//! Read-only snapshots handed to the admin shell for JSON rendering.
//!
//! Secrets never leave the device: the WiFi passphrase and the admin
//! password appear only as `*_set` flags.

use serde::Serialize;

use crate::adapters::device_id::{self, MacString};
use crate::app::sensor::Reading;
use crate::config::{
    DeviceConfig, MAX_DB_HOST, MAX_DB_MEASUREMENT, MAX_DB_NAME, MAX_HOSTNAME, MAX_LOCATION,
    MAX_SSID,
};

pub const FIRMWARE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigSummary {
    pub version: u32,
    pub firmware: &'static str,
    pub mac: MacString,
    pub hostname: heapless::String<MAX_HOSTNAME>,
    pub location: heapless::String<MAX_LOCATION>,
    pub http_port: u16,
    pub http_pw_set: bool,
    pub net: NetSummary,
    pub db: BackendSummary,
    /// Telemetry interval, seconds.
    pub interval: u32,
    pub t_offset: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetSummary {
    pub ssid: heapless::String<MAX_SSID>,
    pub wifi_pw_set: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackendSummary {
    #[serde(rename = "type")]
    pub backend: &'static str,
    pub host: heapless::String<MAX_DB_HOST>,
    pub port: u16,
    pub database: heapless::String<MAX_DB_NAME>,
    pub measurement: heapless::String<MAX_DB_MEASUREMENT>,
}

impl ConfigSummary {
    pub fn new(cfg: &DeviceConfig, mac: &[u8; 6]) -> Self {
        Self {
            version: cfg.version,
            firmware: FIRMWARE_VERSION,
            mac: device_id::format_mac(mac),
            hostname: cfg.hostname.clone(),
            location: cfg.location.clone(),
            http_port: cfg.http_port,
            http_pw_set: !cfg.http_pw.is_empty(),
            net: NetSummary {
                ssid: cfg.ssid.clone(),
                wifi_pw_set: !cfg.wifi_pw.is_empty(),
            },
            db: BackendSummary {
                backend: cfg.backend.as_str(),
                host: cfg.db_host.clone(),
                port: cfg.db_port,
                database: cfg.db_name.clone(),
                measurement: cfg.db_measurement.clone(),
            },
            interval: cfg.sample_interval_secs,
            t_offset: cfg.t_offset,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Current sensor values; `null` in JSON means "no data".
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SensorSummary {
    pub temperature: Option<f32>,
    pub humidity: Option<f32>,
    pub heat_index: Option<f32>,
    pub analog: Option<u16>,
    pub pressure: Option<f32>,
}

impl From<Reading> for SensorSummary {
    fn from(r: Reading) -> Self {
        Self {
            temperature: r.temperature,
            humidity: r.humidity,
            heat_index: r.heat_index,
            analog: r.analog,
            pressure: r.pressure,
        }
    }
}

impl SensorSummary {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

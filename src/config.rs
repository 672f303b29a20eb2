//! Persisted device configuration.
//!
//! [`DeviceConfig`] is the single versioned record stored in NVS.  Every
//! string field is a `heapless::String` sized to the field's byte budget, so
//! the maximum length is enforced by the type rather than by copy logic.
//! Field-level mutation goes through [`DeviceConfig::apply`], which either
//! assigns the whole field or leaves the record untouched.

use core::str::FromStr;

use heapless::String;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Layout version of the stored record.  Bump on any field change.
pub const CONFIG_VERSION: u32 = 5;

// --- Byte budgets ---
pub const MAX_HOSTNAME: usize = 20;
pub const MAX_LOCATION: usize = 20;
pub const MAX_HTTP_PW: usize = 10;
pub const MAX_SSID: usize = 32;
pub const MAX_WIFI_PW: usize = 64;
pub const MAX_DB_HOST: usize = 64;
pub const MAX_DB_NAME: usize = 20;
pub const MAX_DB_MEASUREMENT: usize = 15;

// --- Numeric ranges ---
pub const PORT_RANGE: core::ops::RangeInclusive<i64> = 1..=65_535;
pub const SAMPLE_INTERVAL_RANGE: core::ops::RangeInclusive<i64> = 1..=86_400;
/// Calibration offset, °F.
pub const TEMP_OFFSET_RANGE: core::ops::RangeInclusive<f32> = -100.0..=100.0;

// --- Defaults ---
const DEFAULT_HOSTNAME: &str = "envsense-1";
const DEFAULT_LOCATION: &str = "unknown";
const DEFAULT_HTTP_PORT: u16 = 8080;
const DEFAULT_DB_HOST: &str = "influxdb";
const DEFAULT_DB_PORT: u16 = 8086;
const DEFAULT_DB_NAME: &str = "temp";
const DEFAULT_DB_MEASUREMENT: &str = "ambient";
const DEFAULT_SAMPLE_INTERVAL_SECS: u32 = 60;

// ───────────────────────────────────────────────────────────────
// Backend type
// ───────────────────────────────────────────────────────────────

/// Telemetry backend selected by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum BackendType {
    /// Telemetry disabled.
    None = 0,
    /// InfluxDB line protocol over HTTP POST.
    InfluxLine = 1,
    /// Generic HTTP JSON endpoint (reserved).
    GenericHttp = 2,
}

impl BackendType {
    /// Accepts the numeric code used by the admin form or a short name.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "0" | "none" => Some(Self::None),
            "1" | "influx" => Some(Self::InfluxLine),
            "2" | "http" => Some(Self::GenericHttp),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::InfluxLine => "influx",
            Self::GenericHttp => "http",
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Field keys
// ───────────────────────────────────────────────────────────────

/// Every user-settable field, keyed by the form name the admin shell uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigField {
    Hostname,
    Location,
    HttpPort,
    HttpPassword,
    Ssid,
    WifiPassword,
    BackendType,
    BackendHost,
    BackendPort,
    Database,
    Measurement,
    SampleInterval,
    TempOffset,
}

impl ConfigField {
    pub const ALL: [Self; 13] = [
        Self::Hostname,
        Self::Location,
        Self::HttpPort,
        Self::HttpPassword,
        Self::Ssid,
        Self::WifiPassword,
        Self::BackendType,
        Self::BackendHost,
        Self::BackendPort,
        Self::Database,
        Self::Measurement,
        Self::SampleInterval,
        Self::TempOffset,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Self::Hostname => "hostname",
            Self::Location => "location",
            Self::HttpPort => "http_port",
            Self::HttpPassword => "http_pw",
            Self::Ssid => "ssid",
            Self::WifiPassword => "wifi_pw",
            Self::BackendType => "db_type",
            Self::BackendHost => "db_host",
            Self::BackendPort => "db_port",
            Self::Database => "db_name",
            Self::Measurement => "db_measurement",
            Self::SampleInterval => "interval",
            Self::TempOffset => "t_offset",
        }
    }

    /// Fields that change what the telemetry dispatcher sends or where.
    pub fn affects_backend(self) -> bool {
        matches!(
            self,
            Self::Hostname
                | Self::Location
                | Self::BackendType
                | Self::BackendHost
                | Self::BackendPort
                | Self::Database
                | Self::Measurement
                | Self::SampleInterval
        )
    }

    /// Fields whose values must never appear in logs or summaries.
    pub fn is_secret(self) -> bool {
        matches!(self, Self::HttpPassword | Self::WifiPassword)
    }
}

impl FromStr for ConfigField {
    type Err = ConfigError;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.key() == key)
            .ok_or(ConfigError::UnknownField)
    }
}

// ───────────────────────────────────────────────────────────────
// Record
// ───────────────────────────────────────────────────────────────

/// The persisted configuration record.
///
/// `version` is encoded as a fixed four-byte little-endian integer so it
/// always occupies the first bytes of the stored image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    #[serde(with = "postcard::fixint::le")]
    pub version: u32,

    // --- System ---
    pub hostname: String<MAX_HOSTNAME>,
    /// Physical location label, sent as a telemetry tag.
    pub location: String<MAX_LOCATION>,
    pub http_port: u16,
    pub http_pw: String<MAX_HTTP_PW>,

    // --- Network ---
    pub ssid: String<MAX_SSID>,
    pub wifi_pw: String<MAX_WIFI_PW>,

    // --- Backend ---
    pub backend: BackendType,
    pub db_host: String<MAX_DB_HOST>,
    pub db_port: u16,
    pub db_name: String<MAX_DB_NAME>,
    pub db_measurement: String<MAX_DB_MEASUREMENT>,

    // --- Sampling ---
    /// Telemetry interval in seconds (1–86400).
    pub sample_interval_secs: u32,
    /// Subtracted from the raw sensor temperature (°F).
    pub t_offset: f32,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            hostname: truncated(DEFAULT_HOSTNAME),
            location: truncated(DEFAULT_LOCATION),
            http_port: DEFAULT_HTTP_PORT,
            http_pw: String::new(),
            ssid: String::new(),
            wifi_pw: String::new(),
            backend: BackendType::InfluxLine,
            db_host: truncated(DEFAULT_DB_HOST),
            db_port: DEFAULT_DB_PORT,
            db_name: truncated(DEFAULT_DB_NAME),
            db_measurement: truncated(DEFAULT_DB_MEASUREMENT),
            sample_interval_secs: DEFAULT_SAMPLE_INTERVAL_SECS,
            t_offset: 0.0,
        }
    }
}

impl DeviceConfig {
    /// Validate `raw` for `field` and assign it.
    ///
    /// Strings are silently truncated to the field's byte budget.  Numbers
    /// are parsed and range-checked first; on any error the record is left
    /// exactly as it was.
    pub fn apply(&mut self, field: ConfigField, raw: &str) -> Result<(), ConfigError> {
        let key = field.key();
        match field {
            ConfigField::Hostname => self.hostname = truncated(raw),
            ConfigField::Location => self.location = truncated(raw),
            ConfigField::HttpPassword => self.http_pw = truncated(raw),
            ConfigField::Ssid => self.ssid = truncated(raw),
            ConfigField::WifiPassword => self.wifi_pw = truncated(raw),
            ConfigField::BackendHost => self.db_host = truncated(raw),
            ConfigField::Database => self.db_name = truncated(raw),
            ConfigField::Measurement => self.db_measurement = truncated(raw),
            ConfigField::HttpPort => self.http_port = parse_in_range(key, raw, PORT_RANGE)? as u16,
            ConfigField::BackendPort => self.db_port = parse_in_range(key, raw, PORT_RANGE)? as u16,
            ConfigField::SampleInterval => {
                self.sample_interval_secs = parse_in_range(key, raw, SAMPLE_INTERVAL_RANGE)? as u32;
            }
            ConfigField::BackendType => {
                self.backend = BackendType::parse(raw).ok_or(ConfigError::InvalidValue(key))?;
            }
            ConfigField::TempOffset => {
                let offset: f32 = raw.trim().parse().map_err(|_| ConfigError::InvalidValue(key))?;
                if !offset.is_finite() {
                    return Err(ConfigError::InvalidValue(key));
                }
                if !TEMP_OFFSET_RANGE.contains(&offset) {
                    return Err(ConfigError::OutOfRange(key));
                }
                self.t_offset = offset;
            }
        }
        Ok(())
    }
}

/// Copy the longest prefix of `raw` that fits in `N` bytes without splitting
/// a UTF-8 character.
pub fn truncated<const N: usize>(raw: &str) -> String<N> {
    let mut end = raw.len().min(N);
    while !raw.is_char_boundary(end) {
        end -= 1;
    }
    let mut out = String::new();
    // Cannot fail: the prefix is at most N bytes.
    let _ = out.push_str(&raw[..end]);
    out
}

fn parse_in_range(
    key: &'static str,
    raw: &str,
    range: core::ops::RangeInclusive<i64>,
) -> Result<i64, ConfigError> {
    let value: i64 = raw.trim().parse().map_err(|_| ConfigError::InvalidValue(key))?;
    if !range.contains(&value) {
        return Err(ConfigError::OutOfRange(key));
    }
    Ok(value)
}

//! Unified error types for the EnvSense firmware.
//!
//! Each subsystem owns a small `Copy` error enum; all of them convert into the
//! top-level [`Error`] so the boot path in `main` can funnel everything into a
//! single type.  Only an unreadable config store is fatal; every other variant
//! is handled locally by the component that produced it.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Non-volatile storage could not be read or written.
    Storage(StorageError),
    /// A configuration field was rejected or the record could not be loaded.
    Config(ConfigError),
    /// WiFi bring-up or access-point start failed.
    Network(NetworkError),
    /// The physical sensor could not be read.
    Sensor(SensorError),
    /// Telemetry could not be delivered.
    Dispatch(DispatchError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Network(e) => write!(f, "network: {e}"),
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Dispatch(e) => write!(f, "dispatch: {e}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Storage errors
// ---------------------------------------------------------------------------

/// Errors from [`StoragePort`](crate::app::ports::StoragePort) operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist (first boot).
    NotFound,
    /// Storage partition is full.
    Full,
    /// Generic I/O error from the flash backend.
    Io,
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::Io => write!(f, "I/O error"),
        }
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors from [`ConfigStore`](crate::app::config_store::ConfigStore).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The field key does not name a configuration field.
    UnknownField,
    /// A numeric value parsed but fell outside the field's range.
    /// Carries the field key.
    OutOfRange(&'static str),
    /// The raw value could not be parsed for the field's type.
    InvalidValue(&'static str),
    /// The record could not be encoded into the fixed storage image.
    Encode,
    /// The backing store failed.
    Storage(StorageError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownField => write!(f, "unknown field"),
            Self::OutOfRange(key) => write!(f, "{key}: value out of range"),
            Self::InvalidValue(key) => write!(f, "{key}: value could not be parsed"),
            Self::Encode => write!(f, "record does not fit storage image"),
            Self::Storage(e) => write!(f, "storage: {e}"),
        }
    }
}

impl From<StorageError> for ConfigError {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Network errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkError {
    /// The station SSID is empty.
    NoCredentials,
    /// The driver refused the station configuration.
    InvalidCredentials,
    /// The radio driver reported a failure.
    Driver,
    /// The access point could not be started.
    AccessPointFailed,
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials configured"),
            Self::InvalidCredentials => write!(f, "WiFi credentials rejected by driver"),
            Self::Driver => write!(f, "WiFi driver error"),
            Self::AccessPointFailed => write!(f, "access point start failed"),
        }
    }
}

impl From<NetworkError> for Error {
    fn from(e: NetworkError) -> Self {
        Self::Network(e)
    }
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The sensor did not answer the start signal in time.
    NoResponse,
    /// A bit transition timed out mid-frame.
    Timeout,
    /// The frame checksum did not match.
    Checksum,
    /// The driver produced a non-finite value.
    NotANumber,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoResponse => write!(f, "no response from sensor"),
            Self::Timeout => write!(f, "bit timing timeout"),
            Self::Checksum => write!(f, "checksum mismatch"),
            Self::NotANumber => write!(f, "reading is not a number"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Dispatch errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchError {
    /// The HTTP connection could not be opened or the request not written.
    Connection,
    /// The backend answered with a status other than its success code.
    Status(u16),
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connection => write!(f, "HTTP connection failed"),
            Self::Status(code) => write!(f, "unexpected HTTP status {code}"),
        }
    }
}

impl From<DispatchError> for Error {
    fn from(e: DispatchError) -> Self {
        Self::Dispatch(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;

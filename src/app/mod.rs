//! Application core: the device control loop, with no direct I/O.
//!
//! Four components cooperate under one [`service::Device`]:
//! [`config_store`], [`network`], [`sensor`], and [`telemetry`].  All
//! interaction with hardware happens through the **port traits** in
//! [`ports`], keeping this layer testable without real peripherals.
//! [`shell`] maps admin requests onto the device's public operations.

pub mod config_store;
pub mod line_protocol;
pub mod network;
pub mod ports;
pub mod sensor;
pub mod service;
pub mod shell;
pub mod summary;
pub mod telemetry;

//! EnvSense firmware library.
//!
//! Exposes the control-loop core and its adapters for integration testing.
//! All ESP-IDF-specific code is guarded by `#[cfg(target_os = "espidf")]`
//! within each module; everything else builds and runs on the host.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod error;
pub mod interval;
pub mod pins;
pub mod sensors;

pub use error::{Error, Result};

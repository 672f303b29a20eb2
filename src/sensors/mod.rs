//! Sensor math shared by the monitor and the hardware adapter.
//!
//! Nothing here touches hardware: the DHT22 bus protocol lives in
//! [`crate::adapters::hardware`], and the acquisition cadence in
//! [`crate::app::sensor`].

pub mod analog;
pub mod heat_index;

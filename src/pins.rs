//! GPIO / peripheral pin assignments for the EnvSense sensor board.
//!
//! Single source of truth; `main` takes pins by these numbers.

// ---------------------------------------------------------------------------
// DHT22 temperature / humidity sensor
// ---------------------------------------------------------------------------

/// Single-wire data line, open-drain with external 10 kΩ pull-up.
pub const DHT_DATA_GPIO: i32 = 4;

/// Sensor supply switch (P-FET gate driver, active HIGH).
/// Dropping it power-cycles a hung sensor.
pub const SENSOR_POWER_GPIO: i32 = 5;

// ---------------------------------------------------------------------------
// Auxiliary analog input (ADC1)
// ---------------------------------------------------------------------------

/// Pressure transducer, 0–3.3 V, wired to GPIO 7 (ADC1 channel 6 on ESP32-S3).
pub const AUX_ADC_CHANNEL: u32 = 6;

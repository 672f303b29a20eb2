//! EnvSense Firmware: Main Entry Point
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │                                                              │
//! │  NvsAdapter     WifiAdapter     HardwareAdapter  HttpAdapter │
//! │  (Storage)      (WifiRadio)     (SensorPort)     (HttpPort)  │
//! │                                                              │
//! │  ──────────────── Port Trait Boundary ─────────────────      │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │ Device: ConfigStore · NetworkManager · SensorMonitor · │  │
//! │  │         TelemetryDispatcher                            │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! │                                                              │
//! │  SystemClock (Clock) · cooperative tick loop                 │
//! └──────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::{Result, anyhow};
use log::{debug, error, info};

use esp_idf_hal::delay::{Ets, FreeRtos};
use esp_idf_hal::gpio::{AnyIOPin, AnyOutputPin, PinDriver, Pull};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::wifi::EspWifi;

use envsense::adapters::hardware::{HardwareAdapter, OneshotAdc};
use envsense::adapters::http::HttpAdapter;
use envsense::adapters::nvs::NvsAdapter;
use envsense::adapters::time::SystemClock;
use envsense::adapters::wifi::WifiAdapter;
use envsense::app::service::Device;
use envsense::app::telemetry::DispatchOutcome;
use envsense::pins;

/// Pause between ticks; yields to the idle task.
const TICK_PERIOD_MS: u32 = 10;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  EnvSense v{}                        ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;

    // ── 2. Adapters ───────────────────────────────────────────
    // An unreadable store is the one fatal boot condition.
    let storage = NvsAdapter::new().map_err(|e| anyhow!("NVS init failed: {}", e))?;

    let radio = WifiAdapter::new(EspWifi::new(peripherals.modem, sysloop, None)?);

    // SAFETY: each GPIO number is claimed exactly once, here.
    let mut dht_data = PinDriver::input_output_od(unsafe { AnyIOPin::new(pins::DHT_DATA_GPIO) })?;
    dht_data.set_pull(Pull::Up)?;
    let sensor_power = PinDriver::output(unsafe { AnyOutputPin::new(pins::SENSOR_POWER_GPIO) })?;
    let adc = OneshotAdc::new(pins::AUX_ADC_CHANNEL)
        .map_err(|code| anyhow!("ADC1 init failed ({})", code))?;
    let sensor = HardwareAdapter::new(dht_data, sensor_power, Ets, adc);

    // ── 3. Device assembly + synchronous bring-up ─────────────
    let mut device = Device::new(storage, radio, sensor, HttpAdapter::new(), SystemClock::new())
        .map_err(envsense::Error::from)?;

    let state = device.begin();
    info!(
        "Boot complete: {:?}, ip {:?}, AP name {}",
        state,
        device.network().local_ip(),
        device.network().ap_ssid()
    );

    // ── 4. Cooperative loop ───────────────────────────────────
    loop {
        let report = device.tick();
        match report.telemetry {
            DispatchOutcome::NotDue => {}
            DispatchOutcome::Failed(e) => error!("Telemetry: {}", e),
            other => debug!("Telemetry: {:?}", other),
        }

        if device.needs_reconnect() {
            device.reconnect();
        }

        FreeRtos::delay_ms(TICK_PERIOD_MS);
    }
}

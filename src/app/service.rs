//! Device assembly, the one owner of every core component.
//!
//! [`Device`] holds the clock, the config store, and the three polled
//! components, and hands each of them explicit references to what it needs.
//! There is no global state; the firmware binary builds exactly one `Device`
//! and the admin shell talks to it through the methods below.
//!
//! ```text
//!                       ┌───────────────── Device ─────────────────┐
//!   StoragePort ──────▶ │ ConfigStore ──cfg──┬──────────┬───────┐  │
//!   WifiRadio ────────▶ │ NetworkManager ◀───┘          │       │  │
//!   SensorPort ───────▶ │ SensorMonitor ◀───────────────┘       │  │
//!   HttpPort ─────────▶ │ TelemetryDispatcher ◀── reading, link ┘  │
//!                       └──────────────────────────────────────────┘
//! ```

use log::info;

use crate::app::config_store::ConfigStore;
use crate::app::network::{NetworkManager, NetworkState};
use crate::app::ports::{Clock, HttpPort, SensorPort, StoragePort, WifiRadio};
use crate::app::sensor::{PollOutcome, Reading, SensorMonitor};
use crate::app::summary::{ConfigSummary, SensorSummary};
use crate::app::telemetry::{DispatchOutcome, TelemetryDispatcher};
use crate::config::{ConfigField, DeviceConfig};
use crate::error::ConfigError;

/// What the sensor and telemetry stages did during one [`Device::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub sensor: PollOutcome,
    pub telemetry: DispatchOutcome,
}

pub struct Device<S, R, P, H, C>
where
    S: StoragePort,
    R: WifiRadio,
    P: SensorPort,
    H: HttpPort,
    C: Clock,
{
    clock: C,
    config: ConfigStore<S>,
    network: NetworkManager<R>,
    sensor: SensorMonitor<P>,
    telemetry: TelemetryDispatcher<H>,
    /// Last committed record; the only one the polled components see.
    live: DeviceConfig,
    /// WiFi credentials were committed since the last bring-up.
    wifi_changed: bool,
    /// WiFi credentials were set but not yet committed.
    wifi_pending: bool,
    /// A field the dispatcher depends on was set but not yet committed.
    backend_pending: bool,
}

impl<S, R, P, H, C> Device<S, R, P, H, C>
where
    S: StoragePort,
    R: WifiRadio,
    P: SensorPort,
    H: HttpPort,
    C: Clock,
{
    /// Load configuration and assemble the components.
    ///
    /// Fails only if the config store is unreadable.
    pub fn new(storage: S, radio: R, sensor: P, http: H, clock: C) -> Result<Self, ConfigError> {
        let config = ConfigStore::load(storage)?;
        let now = clock.now_ms();
        let telemetry = TelemetryDispatcher::new(http, config.config(), now);
        let live = config.config().clone();
        Ok(Self {
            network: NetworkManager::new(radio, now),
            sensor: SensorMonitor::new(sensor, now),
            telemetry,
            config,
            clock,
            live,
            wifi_changed: false,
            wifi_pending: false,
            backend_pending: false,
        })
    }

    /// Synchronous bring-up: sensor power, then WiFi (may block for the
    /// bounded retry sequence).
    pub fn begin(&mut self) -> NetworkState {
        self.sensor.begin();
        let state = self.network.begin(&self.live, &mut self.clock);
        info!("Device: up, network {:?}", state);
        state
    }

    /// One pass of the cooperative loop: Network, then Sensor, then Telemetry.
    ///
    /// Components run on the committed record; staged fields stay invisible
    /// until [`commit_config`](Self::commit_config).
    pub fn tick(&mut self) -> TickReport {
        let cfg = &self.live;

        self.network.poll(cfg, self.clock.now_ms());
        let sensor = self.sensor.poll(cfg, &mut self.clock);
        let telemetry = self.telemetry.poll(
            cfg,
            self.network.is_connected(),
            &self.sensor.reading(),
            self.clock.now_ms(),
        );

        TickReport { sensor, telemetry }
    }

    // ── Shell-facing operations ───────────────────────────────

    pub fn config_summary(&self) -> ConfigSummary {
        self.config.to_summary(&self.network.mac_address())
    }

    /// Validate and stage one field.  Nothing is persisted until
    /// [`commit_config`](Self::commit_config).
    pub fn set_config(&mut self, field_key: &str, raw_value: &str) -> Result<(), ConfigError> {
        let field = self.config.set(field_key, raw_value)?;
        if matches!(field, ConfigField::Ssid | ConfigField::WifiPassword) {
            self.wifi_pending = true;
        }
        if field.affects_backend() {
            self.backend_pending = true;
        }
        Ok(())
    }

    /// Persist staged changes and refresh the telemetry destination.
    pub fn commit_config(&mut self) -> Result<(), ConfigError> {
        self.config.commit()?;
        self.adopt_committed();
        Ok(())
    }

    /// Restore compiled defaults, persist them, and refresh the telemetry
    /// destination.
    pub fn reset_config(&mut self) -> Result<(), ConfigError> {
        self.config.reset_to_defaults()?;
        self.wifi_pending = true;
        self.backend_pending = true;
        self.adopt_committed();
        Ok(())
    }

    /// Drop staged, uncommitted changes by re-reading the stored record.
    pub fn discard_config(&mut self) -> Result<(), ConfigError> {
        self.wifi_pending = false;
        self.config.reload()?;
        // Reload may have migrated an unusable image to defaults.
        if self.config.config() != &self.live {
            self.backend_pending = true;
        }
        self.adopt_committed();
        Ok(())
    }

    pub fn sensor_summary(&self) -> SensorSummary {
        SensorSummary::from(self.sensor.reading())
    }

    /// Re-run WiFi bring-up with the current credentials.  Blocks for at
    /// most the bounded retry sequence.
    pub fn reconnect(&mut self) -> NetworkState {
        self.wifi_changed = false;
        self.network.reconnect(&self.live, &mut self.clock)
    }

    /// Committed WiFi credentials differ from the ones the radio is using.
    pub fn needs_reconnect(&self) -> bool {
        self.wifi_changed
    }

    // ── Accessors ─────────────────────────────────────────────

    /// Record as staged, including uncommitted changes.
    pub fn config(&self) -> &DeviceConfig {
        self.config.config()
    }

    /// Record the polled components currently run on.
    pub fn live_config(&self) -> &DeviceConfig {
        &self.live
    }

    pub fn reading(&self) -> Reading {
        self.sensor.reading()
    }

    pub fn config_store(&self) -> &ConfigStore<S> {
        &self.config
    }

    pub fn network(&self) -> &NetworkManager<R> {
        &self.network
    }

    pub fn network_mut(&mut self) -> &mut NetworkManager<R> {
        &mut self.network
    }

    pub fn sensor(&self) -> &SensorMonitor<P> {
        &self.sensor
    }

    pub fn sensor_mut(&mut self) -> &mut SensorMonitor<P> {
        &mut self.sensor
    }

    pub fn telemetry(&self) -> &TelemetryDispatcher<H> {
        &self.telemetry
    }

    pub fn telemetry_mut(&mut self) -> &mut TelemetryDispatcher<H> {
        &mut self.telemetry
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    /// Make the stored record live, refreshing what depends on it.
    fn adopt_committed(&mut self) {
        self.live = self.config.config().clone();
        if self.backend_pending {
            self.backend_pending = false;
            self.telemetry.invalidate(&self.live, self.clock.now_ms());
        }
        if self.wifi_pending {
            self.wifi_pending = false;
            self.wifi_changed = true;
            info!("Device: WiFi credentials changed, reconnect pending");
        }
    }
}

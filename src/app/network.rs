//! Network manager: WiFi station with unconditional access-point fallback.
//!
//! ```text
//!                 begin / health check (not connected)
//!   Disconnected ──────────────────────────────▶ Connecting{1}
//!        ▲                                          │   │
//!        │ AP start failed          link up         │   │ 5 s elapsed, no link
//!        │                    ┌─────────────────────┘   ▼
//!        │                    ▼                   Connecting{n+1} … {5}
//!        │            StationConnected                   │ exhausted
//!        │                    │ link lost                 ▼
//!        │                    └──────▶ Connecting{1}   AccessPointMode
//!        └────────────────────────────────────────────────┘
//! ```
//!
//! The retry logic is a per-tick transition ([`NetworkManager::poll`]) driven
//! by a 5 s attempt deadline.  [`NetworkManager::begin`] runs the same
//! transitions synchronously, sleeping between ticks; it is the only place
//! the manager blocks and is used at boot and after credentials change.

use core::net::Ipv4Addr;

use log::{error, info, warn};

use crate::adapters::device_id::{self, ApSsidString};
use crate::app::ports::{Clock, WifiRadio};
use crate::config::DeviceConfig;
use crate::interval::IntervalTimer;

/// Station attempts before falling back to access-point mode.
pub const MAX_CONNECT_ATTEMPTS: u8 = 5;
/// Time allowed for one station attempt.
pub const CONNECT_BACKOFF_MS: u64 = 5_000;
/// Steady-state health check period.
pub const HEALTH_CHECK_INTERVAL_MS: u64 = 5 * 60 * 1_000;
/// Link-status polling granularity during synchronous bring-up.
const BRING_UP_POLL_MS: u32 = 250;
/// Passphrase of the fallback access point (WPA2 minimum is 8 bytes).
pub const AP_PASSPHRASE: &str = "envsense";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkState {
    Disconnected,
    /// Station attempt `attempt` of [`MAX_CONNECT_ATTEMPTS`] is in flight.
    Connecting { attempt: u8 },
    StationConnected,
    AccessPointMode,
}

pub struct NetworkManager<R: WifiRadio> {
    radio: R,
    state: NetworkState,
    local_ip: Option<Ipv4Addr>,
    rssi: Option<i8>,
    ap_ssid: ApSsidString,
    health: IntervalTimer,
    attempt_deadline: IntervalTimer,
}

impl<R: WifiRadio> NetworkManager<R> {
    pub fn new(radio: R, now_ms: u64) -> Self {
        let ap_ssid = device_id::access_point_ssid(&radio.mac_address());
        Self {
            radio,
            state: NetworkState::Disconnected,
            local_ip: None,
            rssi: None,
            ap_ssid,
            health: IntervalTimer::new(HEALTH_CHECK_INTERVAL_MS, now_ms),
            attempt_deadline: IntervalTimer::new(CONNECT_BACKOFF_MS, now_ms),
        }
    }

    // ── Synchronous bring-up ──────────────────────────────────

    /// Blocking bring-up: up to [`MAX_CONNECT_ATTEMPTS`] station attempts,
    /// then access-point mode.  Returns the resulting state.
    pub fn begin<C: Clock>(&mut self, cfg: &DeviceConfig, clock: &mut C) -> NetworkState {
        info!("Network: bring-up for '{}'", cfg.hostname);
        self.start_connecting(cfg, clock.now_ms());

        while let NetworkState::Connecting { .. } = self.state {
            let wait = self.attempt_deadline.remaining(clock.now_ms()).min(BRING_UP_POLL_MS as u64);
            clock.delay_ms(wait.max(1) as u32);
            self.step_connecting(cfg, clock.now_ms());
        }

        self.health.rearm(clock.now_ms());
        self.state
    }

    /// Re-run the synchronous bring-up, e.g. after WiFi credentials change.
    pub fn reconnect<C: Clock>(&mut self, cfg: &DeviceConfig, clock: &mut C) -> NetworkState {
        info!("Network: reconnect requested");
        self.begin(cfg, clock)
    }

    // ── Steady state ──────────────────────────────────────────

    /// Non-blocking tick.
    ///
    /// While connecting, advances the retry state machine.  Otherwise does
    /// nothing until the health-check deadline passes.
    pub fn poll(&mut self, cfg: &DeviceConfig, now_ms: u64) {
        if let NetworkState::Connecting { .. } = self.state {
            self.step_connecting(cfg, now_ms);
            if !matches!(self.state, NetworkState::Connecting { .. }) {
                self.health.rearm(now_ms);
            }
            return;
        }

        if !self.health.fire(now_ms) {
            return;
        }

        match self.state {
            NetworkState::StationConnected if self.radio.link_up() => {
                self.rssi = self.radio.rssi();
                self.local_ip = self.radio.station_ip();
                info!("Network: link ok, RSSI {:?} dBm", self.rssi);
            }
            NetworkState::StationConnected => {
                warn!("Network: link lost, reconnecting");
                self.local_ip = None;
                self.rssi = None;
                self.start_connecting(cfg, now_ms);
            }
            NetworkState::Disconnected | NetworkState::AccessPointMode => {
                if cfg.ssid.is_empty() && self.state == NetworkState::AccessPointMode {
                    return;
                }
                info!("Network: health check, retrying station mode");
                self.start_connecting(cfg, now_ms);
            }
            NetworkState::Connecting { .. } => {}
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> NetworkState {
        self.state
    }

    /// True only in [`NetworkState::StationConnected`].
    pub fn is_connected(&self) -> bool {
        self.state == NetworkState::StationConnected
    }

    /// Station address, or the AP address in access-point mode.
    pub fn local_ip(&self) -> Option<Ipv4Addr> {
        self.local_ip
    }

    /// Signal strength recorded at the last health check.
    pub fn rssi(&self) -> Option<i8> {
        self.rssi
    }

    pub fn ap_ssid(&self) -> &str {
        &self.ap_ssid
    }

    pub fn mac_address(&self) -> [u8; 6] {
        self.radio.mac_address()
    }

    pub fn radio(&self) -> &R {
        &self.radio
    }

    pub fn radio_mut(&mut self) -> &mut R {
        &mut self.radio
    }

    // ── Transitions ───────────────────────────────────────────

    fn start_connecting(&mut self, cfg: &DeviceConfig, now_ms: u64) {
        if cfg.ssid.is_empty() {
            warn!("Network: no SSID configured");
            self.enter_access_point();
            return;
        }
        self.attempt(cfg, 1, now_ms);
    }

    fn attempt(&mut self, cfg: &DeviceConfig, attempt: u8, now_ms: u64) {
        info!("Network: connecting to '{}' ({}/{})", cfg.ssid, attempt, MAX_CONNECT_ATTEMPTS);
        self.state = NetworkState::Connecting { attempt };
        self.attempt_deadline.rearm(now_ms);
        if let Err(e) = self.radio.begin_station(&cfg.hostname, &cfg.ssid, &cfg.wifi_pw) {
            // Counts as a failed attempt once the deadline passes.
            warn!("Network: station start failed: {}", e);
        }
    }

    fn step_connecting(&mut self, cfg: &DeviceConfig, now_ms: u64) {
        let NetworkState::Connecting { attempt } = self.state else {
            return;
        };

        if self.radio.link_up() {
            self.state = NetworkState::StationConnected;
            self.local_ip = self.radio.station_ip();
            self.rssi = self.radio.rssi();
            info!("Network: connected, ip {:?}, RSSI {:?} dBm", self.local_ip, self.rssi);
            return;
        }

        if !self.attempt_deadline.is_due(now_ms) {
            return;
        }

        if attempt >= MAX_CONNECT_ATTEMPTS {
            warn!("Network: '{}' unreachable after {} attempts", cfg.ssid, attempt);
            self.enter_access_point();
        } else {
            self.attempt(cfg, attempt + 1, now_ms);
        }
    }

    fn enter_access_point(&mut self) {
        self.rssi = None;
        match self.radio.start_access_point(&self.ap_ssid, AP_PASSPHRASE) {
            Ok(ip) => {
                info!("Network: access point '{}' up at {}", self.ap_ssid, ip);
                self.state = NetworkState::AccessPointMode;
                self.local_ip = Some(ip);
            }
            Err(e) => {
                error!("Network: {}", e);
                self.state = NetworkState::Disconnected;
                self.local_ip = None;
            }
        }
    }
}

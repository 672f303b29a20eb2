//! WiFi radio adapter.
//!
//! Implements [`WifiRadio`]: station association and the fallback access
//! point.  Retry policy lives in [`NetworkManager`](crate::app::network);
//! this adapter only starts operations and reports status.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::wifi::EspWifi`, driven
//!   non-blocking (`connect()` returns at once; association is observed
//!   through `is_connected()` and the STA netif).
//! - **all other targets**: a simulation that associates with any non-empty
//!   SSID, for host runs.

use core::net::Ipv4Addr;

use log::{info, warn};

use crate::adapters::device_id;
use crate::app::ports::WifiRadio;
use crate::error::NetworkError;

#[cfg(target_os = "espidf")]
use esp_idf_svc::wifi::{AccessPointConfiguration, AuthMethod, ClientConfiguration, Configuration, EspWifi};

/// Address the ESP-IDF soft-AP netif assigns itself by default.
#[cfg(not(target_os = "espidf"))]
const SIM_AP_IP: Ipv4Addr = Ipv4Addr::new(192, 168, 71, 1);
#[cfg(not(target_os = "espidf"))]
const SIM_STA_IP: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 42);

pub struct WifiAdapter {
    #[cfg(target_os = "espidf")]
    wifi: EspWifi<'static>,
    #[cfg(not(target_os = "espidf"))]
    sim_link: bool,
    #[cfg(not(target_os = "espidf"))]
    sim_attempts: u32,
}

impl WifiAdapter {
    #[cfg(target_os = "espidf")]
    pub fn new(wifi: EspWifi<'static>) -> Self {
        Self { wifi }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        Self {
            sim_link: false,
            sim_attempts: 0,
        }
    }

    fn auth_for(passphrase: &str) -> AuthKind {
        if passphrase.is_empty() { AuthKind::Open } else { AuthKind::Wpa2 }
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_begin_station(
        &mut self,
        ssid: &str,
        passphrase: &str,
    ) -> Result<(), NetworkError> {
        let auth_method = match Self::auth_for(passphrase) {
            AuthKind::Open => AuthMethod::None,
            AuthKind::Wpa2 => AuthMethod::WPA2Personal,
        };
        let config = Configuration::Client(ClientConfiguration {
            ssid: ssid.try_into().map_err(|_| NetworkError::InvalidCredentials)?,
            password: passphrase.try_into().map_err(|_| NetworkError::InvalidCredentials)?,
            auth_method,
            ..Default::default()
        });

        if self.wifi.is_started().unwrap_or(false) {
            // Leaves AP mode or drops a stale association.
            let _ = self.wifi.disconnect();
            let _ = self.wifi.stop();
        }
        self.wifi.set_configuration(&config).map_err(|_| NetworkError::InvalidCredentials)?;
        self.wifi.start().map_err(|_| NetworkError::Driver)?;
        self.wifi.connect().map_err(|_| NetworkError::Driver)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_begin_station(
        &mut self,
        ssid: &str,
        _passphrase: &str,
    ) -> Result<(), NetworkError> {
        self.sim_attempts += 1;
        self.sim_link = !ssid.is_empty();
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_start_ap(&mut self, ssid: &str, passphrase: &str) -> Result<Ipv4Addr, NetworkError> {
        let config = Configuration::AccessPoint(AccessPointConfiguration {
            ssid: ssid.try_into().map_err(|_| NetworkError::AccessPointFailed)?,
            password: passphrase.try_into().map_err(|_| NetworkError::AccessPointFailed)?,
            auth_method: AuthMethod::WPA2Personal,
            channel: 1,
            ..Default::default()
        });
        let _ = self.wifi.disconnect();
        let _ = self.wifi.stop();
        self.wifi.set_configuration(&config).map_err(|_| NetworkError::AccessPointFailed)?;
        self.wifi.start().map_err(|_| NetworkError::AccessPointFailed)?;
        self.wifi
            .ap_netif()
            .get_ip_info()
            .map(|info| info.ip)
            .map_err(|_| NetworkError::AccessPointFailed)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_start_ap(&mut self, _ssid: &str, _passphrase: &str) -> Result<Ipv4Addr, NetworkError> {
        self.sim_link = false;
        Ok(SIM_AP_IP)
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for WifiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

enum AuthKind {
    Open,
    Wpa2,
}

// ───────────────────────────────────────────────────────────────
// WifiRadio
// ───────────────────────────────────────────────────────────────

impl WifiRadio for WifiAdapter {
    fn begin_station(
        &mut self,
        hostname: &str,
        ssid: &str,
        passphrase: &str,
    ) -> Result<(), NetworkError> {
        if ssid.is_empty() {
            return Err(NetworkError::NoCredentials);
        }
        if matches!(Self::auth_for(passphrase), AuthKind::Wpa2) && passphrase.len() < 8 {
            warn!("WiFi: passphrase shorter than 8 bytes, WPA2 will reject it");
        }
        info!("WiFi: station start '{}' as '{}'", ssid, hostname);
        self.platform_begin_station(ssid, passphrase)
    }

    #[cfg(target_os = "espidf")]
    fn link_up(&self) -> bool {
        self.wifi.is_connected().unwrap_or(false) && self.wifi.sta_netif().is_up().unwrap_or(false)
    }

    #[cfg(not(target_os = "espidf"))]
    fn link_up(&self) -> bool {
        self.sim_link
    }

    #[cfg(target_os = "espidf")]
    fn rssi(&self) -> Option<i8> {
        let mut ap_info = esp_idf_svc::sys::wifi_ap_record_t::default();
        // SAFETY: ap_info is a valid out-pointer for the duration of the call.
        let ret = unsafe { esp_idf_svc::sys::esp_wifi_sta_get_ap_info(&mut ap_info) };
        (ret == esp_idf_svc::sys::ESP_OK).then_some(ap_info.rssi)
    }

    #[cfg(not(target_os = "espidf"))]
    fn rssi(&self) -> Option<i8> {
        if !self.sim_link {
            return None;
        }
        // Wanders between -66 and -55 dBm across reconnects.
        Some((-60_i8).saturating_add((self.sim_attempts % 12) as i8 - 6))
    }

    #[cfg(target_os = "espidf")]
    fn station_ip(&self) -> Option<Ipv4Addr> {
        self.wifi.sta_netif().get_ip_info().ok().map(|info| info.ip)
    }

    #[cfg(not(target_os = "espidf"))]
    fn station_ip(&self) -> Option<Ipv4Addr> {
        self.sim_link.then_some(SIM_STA_IP)
    }

    fn start_access_point(&mut self, ssid: &str, passphrase: &str) -> Result<Ipv4Addr, NetworkError> {
        info!("WiFi: starting access point '{}'", ssid);
        self.platform_start_ap(ssid, passphrase)
    }

    fn mac_address(&self) -> [u8; 6] {
        device_id::read_mac()
    }
}

//! Device identity derived from the ESP32 factory MAC address.
//!
//! The fallback access point is named `ENV-XXYYZZ` (last 3 bytes of the
//! 6-byte MAC in uppercase hex).

use core::fmt::Write;

/// "ENV-XXYYZZ" is exactly 10 bytes.
pub type ApSsidString = heapless::String<10>;

/// "AA:BB:CC:DD:EE:FF".
pub type MacString = heapless::String<17>;

pub type MacAddress = [u8; 6];

/// Read the factory MAC address from eFuse.
#[cfg(target_os = "espidf")]
pub fn read_mac() -> MacAddress {
    let mut mac: MacAddress = [0u8; 6];
    unsafe {
        esp_idf_svc::sys::esp_efuse_mac_get_default(mac.as_mut_ptr());
    }
    mac
}

/// Simulation: a fixed, locally-administered MAC.
#[cfg(not(target_os = "espidf"))]
pub fn read_mac() -> MacAddress {
    [0x02, 0x00, 0x5E, 0x10, 0x20, 0x30]
}

pub fn access_point_ssid(mac: &MacAddress) -> ApSsidString {
    let mut ssid = ApSsidString::new();
    let _ = write!(ssid, "ENV-{:02X}{:02X}{:02X}", mac[3], mac[4], mac[5]);
    ssid
}

pub fn format_mac(mac: &MacAddress) -> MacString {
    let mut out = MacString::new();
    let _ = write!(
        out,
        "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
        mac[0], mac[1], mac[2], mac[3], mac[4], mac[5]
    );
    out
}

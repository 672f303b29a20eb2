//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements   | Connects to                     |
//! |-------------|--------------|---------------------------------|
//! | `hardware`  | SensorPort   | DHT22, sensor power FET, ADC1   |
//! | `http`      | HttpPort     | ESP-IDF HTTP client             |
//! | `nvs`       | StoragePort  | NVS / in-memory store           |
//! | `time`      | Clock        | ESP32 system timer              |
//! | `wifi`      | WifiRadio    | ESP-IDF WiFi STA / soft-AP      |
//!
//! `device_id` derives the access-point name and MAC string from the
//! factory MAC.

pub mod device_id;
pub mod hardware;
pub mod http;
pub mod nvs;
pub mod time;
pub mod wifi;

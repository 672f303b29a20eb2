//! Fuzz target: `DeviceConfig::apply` with arbitrary field/value input.
//!
//! Splits the input at the first NUL into a field key and a raw value, as
//! the admin form would deliver them.  A rejected value must leave the
//! record untouched; an accepted one must still encode into the fixed image.
//!
//! cargo fuzz run fuzz_config_set

#![no_main]

use envsense::app::config_store::encode_image;
use envsense::config::{ConfigField, DeviceConfig};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    let (key, value) = text.split_once('\0').unwrap_or((text, ""));
    let Ok(field) = key.parse::<ConfigField>() else {
        return;
    };

    let mut cfg = DeviceConfig::default();
    let before = cfg.clone();
    match cfg.apply(field, value) {
        Ok(()) => assert!(encode_image(&cfg).is_ok(), "accepted value must fit the image"),
        Err(_) => assert_eq!(cfg, before),
    }
});

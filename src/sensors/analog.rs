//! Auxiliary analog channel: oversampled raw counts and the pressure estimate.
//!
//! The 12-bit ADC is noisy, so each acquisition averages
//! [`ANALOG_SAMPLES`] reads spaced [`SAMPLE_SPACING_US`] apart.  The averaged
//! count maps linearly onto 0..=[`PRESSURE_FULL_SCALE`].  An average of zero
//! means nothing is wired to the input.

use embedded_hal::delay::DelayNs;

pub const ANALOG_SAMPLES: u32 = 32;
pub const SAMPLE_SPACING_US: u32 = 100;
pub const ADC_FULL_SCALE: u16 = 4095;
pub const PRESSURE_FULL_SCALE: f32 = 200.0;

/// Average `ANALOG_SAMPLES` reads from `read`, sleeping between them.
pub fn average_samples<D: DelayNs>(mut read: impl FnMut() -> u16, delay: &mut D) -> u16 {
    let mut sum: u32 = 0;
    for _ in 0..ANALOG_SAMPLES {
        sum += u32::from(read().min(ADC_FULL_SCALE));
        delay.delay_us(SAMPLE_SPACING_US);
    }
    (sum / ANALOG_SAMPLES) as u16
}

/// Linear map of raw counts onto the pressure range; `None` when no sensor
/// is attached.
pub fn pressure_from_raw(raw: u16) -> Option<f32> {
    if raw == 0 {
        return None;
    }
    let raw = raw.min(ADC_FULL_SCALE) as f32;
    Some(raw * PRESSURE_FULL_SCALE / ADC_FULL_SCALE as f32)
}

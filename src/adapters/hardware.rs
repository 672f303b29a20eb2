//! Hardware adapter for the DHT22, its supply switch, and the auxiliary ADC
//! channel behind [`SensorPort`].
//!
//! Generic over `embedded-hal` pins and delay so the same code drives the
//! ESP-IDF `PinDriver`s on the board and plain fakes in host tests.  The
//! single-wire DHT22 protocol (start pulse, 40-bit frame, checksum) is
//! handled by `dht_sensor`.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin, PinState};
use log::warn;

use dht_sensor::{DhtError, dht22};

use crate::app::ports::{ClimateSample, SensorPort};
use crate::error::SensorError;
use crate::sensors::heat_index::c_to_f;

/// One raw conversion from an analog input.
pub trait AnalogInput {
    fn read_raw(&mut self) -> u16;
}

pub struct HardwareAdapter<Data, Power, Delay, Adc> {
    data: Data,
    power: Power,
    delay: Delay,
    adc: Adc,
}

impl<Data, Power, Delay, Adc> HardwareAdapter<Data, Power, Delay, Adc>
where
    Data: InputPin + OutputPin,
    Power: OutputPin,
    Delay: DelayNs,
    Adc: AnalogInput,
{
    pub fn new(data: Data, power: Power, delay: Delay, adc: Adc) -> Self {
        Self {
            data,
            power,
            delay,
            adc,
        }
    }
}

impl<Data, Power, Delay, Adc> SensorPort for HardwareAdapter<Data, Power, Delay, Adc>
where
    Data: InputPin + OutputPin,
    Power: OutputPin,
    Delay: DelayNs,
    Adc: AnalogInput,
{
    fn begin(&mut self) {
        // Idle state of the bus is released (high); the first read needs
        // the sensor to have seen it for at least one second.
        if self.data.set_high().is_err() {
            warn!("Hardware: could not release DHT data line");
        }
    }

    fn set_power(&mut self, on: bool) {
        if self.power.set_state(PinState::from(on)).is_err() {
            warn!("Hardware: sensor power switch failed");
        }
        if !on && self.data.set_low().is_err() {
            warn!("Hardware: could not park DHT data line");
        }
    }

    fn read_climate(&mut self) -> Result<ClimateSample, SensorError> {
        let reading = dht22::blocking::read(&mut self.delay, &mut self.data).map_err(|e| match e {
            DhtError::ChecksumMismatch => SensorError::Checksum,
            DhtError::Timeout => SensorError::Timeout,
            _ => SensorError::NoResponse,
        })?;

        let sample = ClimateSample {
            temperature_f: c_to_f(reading.temperature),
            humidity: reading.relative_humidity,
        };
        if !sample.temperature_f.is_finite() || !sample.humidity.is_finite() {
            return Err(SensorError::NotANumber);
        }
        Ok(sample)
    }

    fn read_analog(&mut self) -> u16 {
        self.adc.read_raw()
    }
}

// ── ADC1 oneshot channel ──────────────────────────────────────

/// ADC1 in oneshot mode, one configured channel, 12-bit / 12 dB.
#[cfg(target_os = "espidf")]
pub struct OneshotAdc {
    handle: esp_idf_svc::sys::adc_oneshot_unit_handle_t,
    channel: esp_idf_svc::sys::adc_channel_t,
}

#[cfg(target_os = "espidf")]
impl OneshotAdc {
    pub fn new(channel: u32) -> Result<Self, esp_idf_svc::sys::esp_err_t> {
        use esp_idf_svc::sys::*;

        let init_cfg = adc_oneshot_unit_init_cfg_t {
            unit_id: adc_unit_t_ADC_UNIT_1,
            ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
            ..Default::default()
        };
        let mut handle: adc_oneshot_unit_handle_t = core::ptr::null_mut();
        // SAFETY: called once at boot; the handle is owned by the returned value.
        let ret = unsafe { adc_oneshot_new_unit(&init_cfg, &mut handle) };
        if ret != ESP_OK {
            return Err(ret);
        }

        let chan_cfg = adc_oneshot_chan_cfg_t {
            atten: adc_atten_t_ADC_ATTEN_DB_12,
            bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
        };
        let ret = unsafe { adc_oneshot_config_channel(handle, channel, &chan_cfg) };
        if ret != ESP_OK {
            unsafe { adc_oneshot_del_unit(handle) };
            return Err(ret);
        }

        log::info!("Hardware: ADC1 channel {} configured", channel);
        Ok(Self { handle, channel })
    }
}

#[cfg(target_os = "espidf")]
impl AnalogInput for OneshotAdc {
    fn read_raw(&mut self) -> u16 {
        let mut raw: i32 = 0;
        let ret = unsafe { esp_idf_svc::sys::adc_oneshot_read(self.handle, self.channel, &mut raw) };
        if ret != esp_idf_svc::sys::ESP_OK {
            return 0;
        }
        raw.max(0) as u16
    }
}

#[cfg(target_os = "espidf")]
impl Drop for OneshotAdc {
    fn drop(&mut self) {
        unsafe { esp_idf_svc::sys::adc_oneshot_del_unit(self.handle) };
    }
}

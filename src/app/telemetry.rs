//! Telemetry dispatcher: interval-driven, fire-and-forget delivery of the
//! latest reading to the configured backend.
//!
//! ```text
//!   due? ─▶ backend? ─▶ link up? ─▶ reading complete? ─▶ encode ─▶ POST ─▶ status
//!    │        │NONE        │no            │no                               │
//!  NotDue  Disabled   NotConnected   InvalidReading              Sent / Failed
//! ```
//!
//! The destination URL is built on first use and cached until
//! [`TelemetryDispatcher::invalidate`] is called after a config commit.
//! There is no queue: a failed send is dropped and the next interval sends
//! whatever reading is current then.

use log::{debug, info, warn};

use crate::app::line_protocol::InfluxLineEncoder;
use crate::app::ports::HttpPort;
use crate::app::sensor::Reading;
use crate::config::{BackendType, DeviceConfig};
use crate::error::DispatchError;
use crate::interval::IntervalTimer;

/// Turns a reading into a request for one backend type.
///
/// A new backend needs only an implementation of this trait and an arm in
/// [`encoder_for`].
pub trait PointEncoder {
    fn content_type(&self) -> &'static str;
    /// The only status code that counts as delivered.
    fn success_code(&self) -> u16;
    fn destination(&self, cfg: &DeviceConfig) -> String;
    /// `None` if the reading cannot be represented.
    fn encode(&self, cfg: &DeviceConfig, reading: &Reading) -> Option<String>;
}

/// Encoder for `backend`, or `None` if the type has no encoder yet.
pub fn encoder_for(backend: BackendType) -> Option<&'static dyn PointEncoder> {
    match backend {
        BackendType::InfluxLine => Some(&InfluxLineEncoder),
        BackendType::None | BackendType::GenericHttp => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    NotDue,
    /// Backend type is NONE.
    Disabled,
    /// Backend type has no encoder.
    Unsupported,
    NotConnected,
    /// Some field of the reading is "no data".
    InvalidReading,
    Sent,
    Failed(DispatchError),
}

pub struct TelemetryDispatcher<H: HttpPort> {
    http: H,
    timer: IntervalTimer,
    url: Option<String>,
    sent: u32,
    failed: u32,
}

impl<H: HttpPort> TelemetryDispatcher<H> {
    pub fn new(http: H, cfg: &DeviceConfig, now_ms: u64) -> Self {
        Self {
            http,
            timer: IntervalTimer::new(interval_ms(cfg), now_ms),
            url: None,
            sent: 0,
            failed: 0,
        }
    }

    /// Drop the cached destination and pick up a changed interval.
    pub fn invalidate(&mut self, cfg: &DeviceConfig, now_ms: u64) {
        self.url = None;
        let period = interval_ms(cfg);
        if period != self.timer.period_ms() {
            self.timer.set_period(period, now_ms);
        }
        debug!("Telemetry: destination cache invalidated");
    }

    pub fn poll(
        &mut self,
        cfg: &DeviceConfig,
        connected: bool,
        reading: &Reading,
        now_ms: u64,
    ) -> DispatchOutcome {
        if !self.timer.fire(now_ms) {
            return DispatchOutcome::NotDue;
        }

        if cfg.backend == BackendType::None {
            return DispatchOutcome::Disabled;
        }
        let Some(encoder) = encoder_for(cfg.backend) else {
            warn!("Telemetry: backend '{}' not supported", cfg.backend.as_str());
            return DispatchOutcome::Unsupported;
        };
        if !connected {
            debug!("Telemetry: offline, skipping");
            return DispatchOutcome::NotConnected;
        }
        let Some(body) = encoder.encode(cfg, reading) else {
            warn!("Telemetry: reading incomplete, skipping");
            return DispatchOutcome::InvalidReading;
        };

        let url = self.url.get_or_insert_with(|| {
            let url = encoder.destination(cfg);
            info!("Telemetry: destination {}", url);
            url
        });

        let result = match self.http.post(url, encoder.content_type(), body.as_bytes()) {
            Ok(code) if code == encoder.success_code() => Ok(()),
            Ok(code) => Err(DispatchError::Status(code)),
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                self.sent += 1;
                debug!("Telemetry: sent {} bytes", body.len());
                DispatchOutcome::Sent
            }
            Err(e) => {
                self.failed += 1;
                warn!("Telemetry: {} (dropped)", e);
                DispatchOutcome::Failed(e)
            }
        }
    }

    /// Cached destination, if built.
    pub fn destination(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn period_ms(&self) -> u64 {
        self.timer.period_ms()
    }

    pub fn sent_count(&self) -> u32 {
        self.sent
    }

    pub fn failed_count(&self) -> u32 {
        self.failed
    }

    pub fn http(&self) -> &H {
        &self.http
    }

    pub fn http_mut(&mut self) -> &mut H {
        &mut self.http
    }
}

fn interval_ms(cfg: &DeviceConfig) -> u64 {
    u64::from(cfg.sample_interval_secs) * 1_000
}

//! InfluxDB line-protocol encoder.
//!
//! ```text
//!   ambient,host=envsense-1,location=attic temperature=71.30,humidity=40.10,heat_index=70.55
//!   └─────┘ └──────────── tags ──────────┘ └──────────────── fields ──────────────────────┘
//! ```
//!
//! Measurement and tag values are escaped; field values are plain numbers.

use core::fmt::Write;

use crate::app::sensor::Reading;
use crate::app::telemetry::PointEncoder;
use crate::config::DeviceConfig;

/// Characters that must be backslash-prefixed in measurement and tag values.
const ESCAPED: [char; 4] = [',', '=', ' ', '"'];

/// Append `raw` to `out`, prefixing each special character with one backslash.
pub fn escape_into(out: &mut String, raw: &str) {
    for c in raw.chars() {
        if ESCAPED.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
}

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    escape_into(&mut out, raw);
    out
}

pub struct InfluxLineEncoder;

impl PointEncoder for InfluxLineEncoder {
    fn content_type(&self) -> &'static str {
        "text/plain; charset=utf-8"
    }

    fn success_code(&self) -> u16 {
        204
    }

    fn destination(&self, cfg: &DeviceConfig) -> String {
        format!("http://{}:{}/write?db={}", cfg.db_host, cfg.db_port, cfg.db_name)
    }

    fn encode(&self, cfg: &DeviceConfig, reading: &Reading) -> Option<String> {
        let (t, h, hi) = (reading.temperature?, reading.humidity?, reading.heat_index?);

        let mut line = String::with_capacity(128);
        escape_into(&mut line, &cfg.db_measurement);
        line.push_str(",host=");
        escape_into(&mut line, &cfg.hostname);
        line.push_str(",location=");
        escape_into(&mut line, &cfg.location);
        write!(line, " temperature={:.2},humidity={:.2},heat_index={:.2}", t, h, hi).ok()?;
        Some(line)
    }
}

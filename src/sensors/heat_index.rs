//! Heat index (apparent temperature) from air temperature and humidity.
//!
//! NWS method: the simple Steadman estimate is used when it stays at or
//! below 79 °F; above that the Rothfusz regression applies, with the
//! published corrections for very dry and very humid air.  Input and output
//! are degrees Fahrenheit, humidity in percent.

pub fn heat_index_f(temp_f: f32, humidity: f32) -> f32 {
    let t = temp_f;
    let rh = humidity;

    let simple = 0.5 * (t + 61.0 + (t - 68.0) * 1.2 + rh * 0.094);
    if simple <= 79.0 {
        return simple;
    }

    let mut hi = -42.379 + 2.049_015_2 * t + 10.143_331 * rh
        - 0.224_755_41 * t * rh
        - 0.006_837_83 * t * t
        - 0.054_817_17 * rh * rh
        + 0.001_228_74 * t * t * rh
        + 0.000_852_82 * t * rh * rh
        - 0.000_001_99 * t * t * rh * rh;

    if rh < 13.0 && (80.0..=112.0).contains(&t) {
        hi -= ((13.0 - rh) * 0.25) * ((17.0 - (t - 95.0).abs()) * 0.058_82).sqrt();
    } else if rh > 85.0 && (80.0..=87.0).contains(&t) {
        hi += ((rh - 85.0) * 0.1) * ((87.0 - t) * 0.2);
    }

    hi
}

/// Degrees Celsius to Fahrenheit.
pub fn c_to_f(celsius: f32) -> f32 {
    celsius * 1.8 + 32.0
}

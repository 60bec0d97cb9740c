//! Temperature scale correction.
//!
//! Some devices report temperature pre-multiplied by 10 (`253` for 25.3°C),
//! others report plain degrees, and the API carries no unit tag. Anything
//! whose magnitude exceeds [`PLAUSIBLE_MAX_CELSIUS`] is taken to be scaled.
//!
//! This cannot tell a genuinely hot reading from a scaled one. It is kept
//! behind [`normalize_temperature`] so it can be swapped for a per-device
//! calibration table without touching the rest of the pipeline. Call it
//! exactly once per reading.

/// Largest magnitude accepted as already being in degrees Celsius.
pub const PLAUSIBLE_MAX_CELSIUS: f64 = 40.0;

/// Convert a raw device temperature to degrees Celsius.
pub fn normalize_temperature(raw: f64) -> f64 {
    // ---
    if raw.abs() > PLAUSIBLE_MAX_CELSIUS {
        raw / 10.0
    } else {
        raw
    }
}

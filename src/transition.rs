//! Edge-triggered alert decisions.
//!
//! The per-sensor state (`normal` / `abnormal`) is never held in memory. It
//! is the classification of the most recent row in the telemetry log, read
//! before the new row is appended. One excursion therefore produces exactly
//! one [`Transition::Raise`] and one recovery exactly one
//! [`Transition::Clear`], however many cycles the condition lasts.

use crate::{Classification, Sensor, TemperatureBand};

// ---

/// Outcome of comparing a new classification with the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    None,
    Raise,
    Clear,
}

/// Decide whether a new classification should alert.
///
/// A sensor with no history counts as previously normal, so its very first
/// abnormal reading raises.
pub fn detect(prior: Option<Classification>, new: Classification) -> Transition {
    // ---
    let prior = prior.unwrap_or(Classification::Normal);
    match (prior, new) {
        (Classification::Normal, Classification::Abnormal) => Transition::Raise,
        (Classification::Abnormal, Classification::Normal) => Transition::Clear,
        (Classification::Normal, Classification::Normal)
        | (Classification::Abnormal, Classification::Abnormal) => Transition::None,
    }
}

/// Human-readable text for a raise or clear. `None` for [`Transition::None`].
pub fn message(
    transition: Transition,
    sensor: &Sensor,
    room_name: &str,
    temperature: f64,
    humidity: Option<f64>,
    band: TemperatureBand,
) -> Option<String> {
    // ---
    let head = match transition {
        Transition::None => return None,
        Transition::Raise => format!(
            "[ALERT] {} ({}) temperature {:.1}°C outside {:.1}~{:.1}°C",
            room_name, sensor.display_name, temperature, band.min, band.max
        ),
        Transition::Clear => format!(
            "[RECOVERED] {} ({}) temperature {:.1}°C back within {:.1}~{:.1}°C",
            room_name, sensor.display_name, temperature, band.min, band.max
        ),
    };

    Some(match humidity {
        Some(h) => format!("{}, humidity {:.1}%", head, h),
        None => head,
    })
}

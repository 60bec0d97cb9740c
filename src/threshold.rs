//! Per-room temperature bands and reading classification.

use std::collections::HashMap;

use crate::{Classification, TemperatureBand};

// ---

/// Bands loaded from `room_settings`, plus the global default.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdConfig {
    bands: HashMap<String, TemperatureBand>,
    default_band: TemperatureBand,
}

impl ThresholdConfig {
    // ---
    /// Empty configuration: every room uses `default_band`.
    pub fn new(default_band: TemperatureBand) -> Self {
        Self {
            bands: HashMap::new(),
            default_band,
        }
    }

    /// Set the band for a room. Inverted bands (`min > max`) are rejected
    /// and the room keeps using the default.
    pub fn insert(&mut self, room_name: impl Into<String>, band: TemperatureBand) {
        // ---
        let room_name = room_name.into();
        if band.min > band.max || band.min.is_nan() || band.max.is_nan() {
            tracing::warn!(
                "Ignoring invalid band {:.1}~{:.1} for room '{}'",
                band.min,
                band.max,
                room_name
            );
            return;
        }
        self.bands.insert(room_name.trim().to_string(), band);
    }

    pub fn with_band(mut self, room_name: impl Into<String>, band: TemperatureBand) -> Self {
        self.insert(room_name, band);
        self
    }

    pub fn default_band(&self) -> TemperatureBand {
        self.default_band
    }

    /// Acceptable band for a room, or the default if it has none.
    pub fn band(&self, room_name: &str) -> TemperatureBand {
        self.bands
            .get(room_name)
            .copied()
            .unwrap_or(self.default_band)
    }
}

/// Inclusive on both ends: `min <= t <= max` is normal.
pub fn classify(temperature: f64, band: TemperatureBand) -> Classification {
    // ---
    if band.min <= temperature && temperature <= band.max {
        Classification::Normal
    } else {
        Classification::Abnormal
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_band_boundaries_are_inclusive() {
        // ---
        let band = TemperatureBand::new(0.0, 35.0);
        assert_eq!(classify(0.0, band), Classification::Normal);
        assert_eq!(classify(35.0, band), Classification::Normal);
        assert_eq!(classify(17.3, band), Classification::Normal);
        assert_eq!(classify(-0.1, band), Classification::Abnormal);
        assert_eq!(classify(35.1, band), Classification::Abnormal);
    }

    #[test]
    fn test_classification_sweep() {
        // ---
        let band = TemperatureBand::new(-20.0, -15.0);
        for tenth in -300..=0 {
            let t = tenth as f64 / 10.0;
            let expected = if (-20.0..=-15.0).contains(&t) {
                Classification::Normal
            } else {
                Classification::Abnormal
            };
            assert_eq!(classify(t, band), expected, "t = {}", t);
        }
    }

    #[test]
    fn test_nan_is_abnormal() {
        assert_eq!(
            classify(f64::NAN, TemperatureBand::new(0.0, 35.0)),
            Classification::Abnormal
        );
    }

    #[test]
    fn test_room_band_and_default() {
        // ---
        let cfg = ThresholdConfig::new(TemperatureBand::new(0.0, 35.0))
            .with_band("Freezer", TemperatureBand::new(-25.0, -15.0));

        assert_eq!(cfg.band("Freezer"), TemperatureBand::new(-25.0, -15.0));
        assert_eq!(cfg.band("Lobby"), TemperatureBand::new(0.0, 35.0));
    }

    #[test]
    fn test_inverted_band_is_ignored() {
        // ---
        let cfg = ThresholdConfig::new(TemperatureBand::new(0.0, 35.0))
            .with_band("Cellar", TemperatureBand::new(20.0, 10.0));
        assert_eq!(cfg.band("Cellar"), cfg.default_band());
    }
}

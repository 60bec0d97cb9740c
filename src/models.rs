//! Data models for the room telemetry collector.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::StoreFailure;

// ---

/// A statically provisioned physical sensor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sensor {
    // ---
    /// Cloud API device id. Never changes for a given device.
    pub physical_id: String,
    pub display_name: String,
    /// Room used when the mapping table has no entry for this sensor.
    pub default_room: String,
}

impl Sensor {
    // ---
    pub fn new(
        physical_id: impl Into<String>,
        display_name: impl Into<String>,
        default_room: impl Into<String>,
    ) -> Self {
        Self {
            physical_id: physical_id.into(),
            display_name: display_name.into(),
            default_room: default_room.into(),
        }
    }
}

/// Whether a temperature sits inside its room's band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Normal,
    Abnormal,
}

impl Classification {
    /// Text stored in the `status` column of `sensor_logs`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Normal => "normal",
            Classification::Abnormal => "abnormal",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Classification {
    type Err = StoreFailure;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // ---
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(Classification::Normal),
            "abnormal" => Ok(Classification::Abnormal),
            other => Err(StoreFailure::Corrupt(format!(
                "unknown classification '{}'",
                other
            ))),
        }
    }
}

/// Acceptable inclusive temperature range for a room, in °C.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureBand {
    pub min: f64,
    pub max: f64,
}

impl TemperatureBand {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

/// One `{code, value}` pair as reported by the cloud API.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DeviceAttribute {
    pub code: String,
    pub value: serde_json::Value,
}

/// Raw attribute values of one device, before normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceStatus {
    pub attributes: Vec<DeviceAttribute>,
}

const TEMPERATURE_CODES: &[&str] = &["va_temperature", "temp_current", "temperature"];
const HUMIDITY_CODES: &[&str] = &["va_humidity", "humidity_value", "humidity"];

impl DeviceStatus {
    // ---
    pub fn new(attributes: Vec<DeviceAttribute>) -> Self {
        Self { attributes }
    }

    /// Numeric value of the first attribute whose code matches, in order of
    /// `codes`. `Some(None)` means the code exists but its value is not a number.
    fn lookup(&self, codes: &[&str]) -> Option<Option<f64>> {
        // ---
        codes.iter().find_map(|code| {
            self.attributes
                .iter()
                .find(|a| a.code == *code)
                .map(|a| numeric(&a.value))
        })
    }

    /// Raw (unnormalized) temperature.
    pub fn raw_temperature(&self) -> Option<Option<f64>> {
        self.lookup(TEMPERATURE_CODES)
    }

    /// Humidity in %RH, if the device reports a numeric one.
    pub fn humidity(&self) -> Option<f64> {
        self.lookup(HUMIDITY_CODES).flatten()
    }
}

/// Finite number carried by a JSON value. "NaN" and "inf" strings are rejected.
fn numeric(value: &serde_json::Value) -> Option<f64> {
    // ---
    let v = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    v.filter(|v| v.is_finite())
}

/// One persisted row of the append-only telemetry log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    // ---
    pub sensor_id: String,
    /// Room resolved when the reading was taken; never rewritten later.
    pub room_name: String,
    pub temperature: f64,
    pub humidity: Option<f64>,
    pub classification: Classification,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use serde_json::json;

    fn attr(code: &str, value: serde_json::Value) -> DeviceAttribute {
        DeviceAttribute {
            code: code.to_string(),
            value,
        }
    }

    #[test]
    fn test_classification_text_round_trip() {
        // ---
        assert_eq!("normal".parse::<Classification>().unwrap(), Classification::Normal);
        assert_eq!(" Abnormal ".parse::<Classification>().unwrap(), Classification::Abnormal);
        assert!("warning".parse::<Classification>().is_err());
        assert_eq!(Classification::Abnormal.to_string(), "abnormal");
    }

    #[test]
    fn test_temperature_code_preference() {
        // ---
        let status = DeviceStatus::new(vec![
            attr("temperature", json!(19.5)),
            attr("va_temperature", json!(253)),
        ]);
        assert_eq!(status.raw_temperature(), Some(Some(253.0)));
    }

    #[test]
    fn test_string_and_missing_values() {
        // ---
        let status = DeviceStatus::new(vec![
            attr("temp_current", json!("21.5")),
            attr("va_humidity", json!("n/a")),
        ]);
        assert_eq!(status.raw_temperature(), Some(Some(21.5)));
        assert_eq!(status.humidity(), None);

        let empty = DeviceStatus::default();
        assert_eq!(empty.raw_temperature(), None);
    }

    #[test]
    fn test_non_numeric_temperature_is_flagged() {
        // ---
        let status = DeviceStatus::new(vec![attr("va_temperature", json!(true))]);
        assert_eq!(status.raw_temperature(), Some(None));
    }

    #[test]
    fn test_non_finite_strings_are_flagged() {
        // ---
        for text in ["NaN", "inf", "-infinity"] {
            let status = DeviceStatus::new(vec![
                attr("va_temperature", json!(text)),
                attr("va_humidity", json!(text)),
            ]);
            assert_eq!(status.raw_temperature(), Some(None), "value {}", text);
            assert_eq!(status.humidity(), None, "value {}", text);
        }
    }
}

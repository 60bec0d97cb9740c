//! Device reading source.
//!
//! [`DeviceSource`] is the seam between the collector and the cloud IoT API.
//! [`HttpDeviceSource`] is the production implementation; tests substitute
//! in-memory fakes.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{DeviceAttribute, DeviceStatus, ReadFailure};

// ---

/// Fetches the current attribute values of one physical sensor.
#[async_trait]
pub trait DeviceSource: Send + Sync {
    async fn read(&self, sensor_id: &str) -> Result<DeviceStatus, ReadFailure>;
}

pub type DeviceSourcePtr = Arc<dyn DeviceSource>;

/// Reads device status from `GET {base_url}/v1.0/devices/{id}/status`.
pub struct HttpDeviceSource {
    client: Client,
    base_url: String,
    token: String,
}

impl HttpDeviceSource {
    // ---
    /// Build a client whose every request is bounded by `timeout`.
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        // ---
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }
}

#[async_trait]
impl DeviceSource for HttpDeviceSource {
    async fn read(&self, sensor_id: &str) -> Result<DeviceStatus, ReadFailure> {
        // ---
        let url = format!("{}/v1.0/devices/{}/status", self.base_url, sensor_id);
        tracing::debug!("Fetching device status from: {}", url);

        let body = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        tracing::trace!("Device {} raw response: {}", sensor_id, body);
        parse_status(&body)
    }
}

/// Response envelope of the cloud API.
#[derive(Debug, Deserialize)]
struct StatusEnvelope {
    success: bool,
    #[serde(default)]
    result: Option<Vec<DeviceAttribute>>,
    #[serde(default)]
    code: Option<serde_json::Value>,
    #[serde(default)]
    msg: Option<String>,
}

/// Decode a status response body into raw attributes.
///
/// The body must carry a numeric temperature attribute; without one the
/// reading is unusable and is reported as malformed.
pub fn parse_status(body: &str) -> Result<DeviceStatus, ReadFailure> {
    // ---
    let envelope: StatusEnvelope =
        serde_json::from_str(body).map_err(|e| ReadFailure::Malformed(e.to_string()))?;

    if !envelope.success {
        let msg = envelope.msg.unwrap_or_default();
        if msg.to_ascii_lowercase().contains("offline") {
            return Err(ReadFailure::Offline(msg));
        }
        let code = match envelope.code {
            Some(serde_json::Value::String(s)) => s,
            Some(other) => other.to_string(),
            None => "unknown".to_string(),
        };
        return Err(ReadFailure::Api { code, msg });
    }

    let attributes = envelope
        .result
        .ok_or_else(|| ReadFailure::Malformed("missing 'result' array".to_string()))?;
    let status = DeviceStatus::new(attributes);

    match status.raw_temperature() {
        Some(Some(_)) => Ok(status),
        Some(None) => Err(ReadFailure::Malformed(
            "temperature attribute is not numeric".to_string(),
        )),
        None => Err(ReadFailure::Malformed(
            "no temperature attribute in response".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_parse_successful_status() {
        // ---
        let body = r#"{
            "success": true,
            "result": [
                {"code": "va_temperature", "value": 253},
                {"code": "va_humidity", "value": 48},
                {"code": "battery_percentage", "value": 90}
            ],
            "t": 1700000000000
        }"#;

        let status = assert_ok!(parse_status(body));
        assert_eq!(status.raw_temperature(), Some(Some(253.0)));
        assert_eq!(status.humidity(), Some(48.0));
        assert_eq!(status.attributes.len(), 3);
    }

    #[test]
    fn test_offline_device() {
        // ---
        let body = r#"{"success": false, "code": 1106, "msg": "device is offline"}"#;
        match parse_status(body) {
            Err(ReadFailure::Offline(msg)) => assert_eq!(msg, "device is offline"),
            other => panic!("expected Offline, got {:?}", other),
        }
    }

    #[test]
    fn test_api_error_code() {
        // ---
        let body = r#"{"success": false, "code": 1010, "msg": "token invalid"}"#;
        match parse_status(body) {
            Err(ReadFailure::Api { code, msg }) => {
                assert_eq!(code, "1010");
                assert_eq!(msg, "token invalid");
            }
            other => panic!("expected Api, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_responses() {
        // ---
        assert_err!(parse_status("not json"));
        assert_err!(parse_status(r#"{"success": true}"#));
        assert_err!(parse_status(
            r#"{"success": true, "result": [{"code": "va_humidity", "value": 40}]}"#
        ));
        assert_err!(parse_status(
            r#"{"success": true, "result": [{"code": "va_temperature", "value": null}]}"#
        ));

        for text in ["NaN", "inf", "-infinity"] {
            let body = format!(
                r#"{{"success": true, "result": [{{"code": "va_temperature", "value": "{}"}}]}}"#,
                text
            );
            match parse_status(&body) {
                Err(ReadFailure::Malformed(_)) => {}
                other => panic!("expected Malformed for {}, got {:?}", text, other),
            }
        }
    }

    /// Local endpoint that accepts connections and never answers.
    async fn silent_endpoint() -> String {
        // ---
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_hung_device_times_out() {
        // ---
        let url = silent_endpoint().await;
        let source = assert_ok!(HttpDeviceSource::new(url, "token", Duration::from_secs(1)));

        let started = std::time::Instant::now();
        match source.read("S1").await {
            Err(ReadFailure::Timeout) => {}
            other => panic!("expected Timeout, got {:?}", other),
        }
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_base_url_trailing_slash() {
        // ---
        let source = assert_ok!(HttpDeviceSource::new(
            "https://iot.example.com/",
            "token",
            Duration::from_secs(5)
        ));
        assert_eq!(source.base_url, "https://iot.example.com");
    }
}

//! Request and response values of a run.
//!
//! All of these are created fresh for one call and never shared.

use std::collections::BTreeMap;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::value::RawValue;
use thiserror::Error;

/// Caller-supplied description of a request to run. Untrusted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestDescription {
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub headers: BTreeMap<String, Vec<String>>,
    /// Any JSON value. A string is sent as its contents, anything else as
    /// its raw JSON text.
    #[serde(default)]
    pub body: Option<Box<RawValue>>,
    /// Binary payload, base64 encoded. Mutually exclusive with `body`.
    #[serde(default)]
    pub body_base64: Option<String>,
    /// Milliseconds; 0 or negative selects the default.
    #[serde(default)]
    pub timeout: i64,
}

impl RequestDescription {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.entry(name.into()).or_default().push(value.into());
        self
    }

    /// Set a raw text body.
    pub fn text_body(mut self, body: &str) -> Self {
        self.body = serde_json::to_string(body)
            .ok()
            .and_then(|json| RawValue::from_string(json).ok());
        self
    }

    pub fn timeout_ms(mut self, timeout: i64) -> Self {
        self.timeout = timeout;
        self
    }

    /// Payload bytes exactly as they will be sent.
    pub fn body_bytes(&self) -> Result<Vec<u8>, String> {
        match (&self.body, &self.body_base64) {
            (Some(_), Some(_)) => Err("only one of 'body' and 'body_base64' may be set".into()),
            (None, Some(encoded)) => BASE64
                .decode(encoded)
                .map_err(|e| format!("'body_base64' is not valid base64: {e}")),
            (Some(raw), None) => Ok(match serde_json::from_str::<String>(raw.get()) {
                Ok(text) => text.into_bytes(),
                Err(_) => raw.get().as_bytes().to_vec(),
            }),
            (None, None) => Ok(Vec::new()),
        }
    }
}

/// A non-fatal problem on an otherwise successful run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Degradation {
    /// More body bytes were available than the retention limit.
    #[error("response body truncated due to size limit of {limit} bytes")]
    Truncated { limit: usize },

    /// The body could not be read; nothing was retained.
    #[error("failed to read response body: {0}")]
    BodyRead(String),
}

/// Normalized result of a successful outbound call.
#[derive(Debug, Clone, Serialize)]
pub struct NormalizedResponse {
    pub status_code: u16,
    /// Call start to body fully read. Serialized in nanoseconds.
    #[serde(serialize_with = "serialize_nanos")]
    pub duration: Duration,
    /// Call start.
    pub timestamp: DateTime<Utc>,
    /// Bytes retained in `body`.
    pub size: usize,
    pub headers: BTreeMap<String, Vec<String>>,
    #[serde(
        serialize_with = "serialize_base64",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub body: Vec<u8>,
    #[serde(
        rename = "error",
        serialize_with = "serialize_degradation",
        skip_serializing_if = "Option::is_none"
    )]
    pub degradation: Option<Degradation>,
}

impl NormalizedResponse {
    pub fn is_degraded(&self) -> bool {
        self.degradation.is_some()
    }

    /// Diagnostic text for a degraded response.
    pub fn error(&self) -> Option<String> {
        self.degradation.as_ref().map(ToString::to_string)
    }
}

fn serialize_nanos<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX))
}

fn serialize_base64<S: Serializer>(body: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&BASE64.encode(body))
}

fn serialize_degradation<S: Serializer>(
    degradation: &Option<Degradation>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match degradation {
        Some(d) => serializer.collect_str(d),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> RequestDescription {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn description_defaults() {
        let desc = parse(r#"{"method":"get","url":"https://example.com"}"#);
        assert!(desc.headers.is_empty());
        assert_eq!(desc.timeout, 0);
        assert_eq!(desc.body_bytes().unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn missing_url_is_rejected_by_decoding() {
        assert!(serde_json::from_str::<RequestDescription>(r#"{"method":"GET"}"#).is_err());
    }

    #[test]
    fn json_body_is_sent_verbatim() {
        let desc = parse(r#"{"method":"POST","url":"https://x.test","body":{"a": [1, 2]}}"#);
        assert_eq!(desc.body_bytes().unwrap(), br#"{"a": [1, 2]}"#.to_vec());
    }

    #[test]
    fn string_body_is_sent_as_text() {
        let desc = parse(r#"{"method":"POST","url":"https://x.test","body":"{}"}"#);
        assert_eq!(desc.body_bytes().unwrap(), b"{}".to_vec());

        let built = RequestDescription::new("POST", "https://x.test").text_body("<a>\"q\"</a>");
        assert_eq!(built.body_bytes().unwrap(), b"<a>\"q\"</a>".to_vec());
    }

    #[test]
    fn base64_body_is_binary_safe() {
        let desc = parse(r#"{"method":"PUT","url":"https://x.test","body_base64":"AP8Q"}"#);
        assert_eq!(desc.body_bytes().unwrap(), vec![0x00, 0xff, 0x10]);
    }

    #[test]
    fn conflicting_bodies_fail() {
        let desc = parse(r#"{"method":"PUT","url":"https://x.test","body":"a","body_base64":"YQ=="}"#);
        assert!(desc.body_bytes().is_err());

        let bad = parse(r#"{"method":"PUT","url":"https://x.test","body_base64":"***"}"#);
        assert!(bad.body_bytes().is_err());
    }

    #[test]
    fn response_serialization() {
        let response = NormalizedResponse {
            status_code: 200,
            duration: Duration::from_millis(2),
            timestamp: DateTime::parse_from_rfc3339("2024-05-01T10:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
            size: 5,
            headers: BTreeMap::from([("content-type".into(), vec!["text/plain".into()])]),
            body: b"Hello".to_vec(),
            degradation: None,
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status_code"], 200);
        assert_eq!(json["duration"], 2_000_000);
        assert_eq!(json["timestamp"], "2024-05-01T10:00:00Z");
        assert_eq!(json["body"], "SGVsbG8=");
        assert_eq!(json["headers"]["content-type"][0], "text/plain");
        assert!(json.get("error").is_none());
    }

    #[test]
    fn degraded_response_carries_error_text() {
        let response = NormalizedResponse {
            status_code: 200,
            duration: Duration::ZERO,
            timestamp: Utc::now(),
            size: 0,
            headers: BTreeMap::new(),
            body: Vec::new(),
            degradation: Some(Degradation::Truncated { limit: 16 }),
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json["error"],
            "response body truncated due to size limit of 16 bytes"
        );
        assert!(json.get("body").is_none());
        assert!(response.is_degraded());
    }
}

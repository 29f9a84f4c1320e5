//! Classification service client
//!
//! Thin HTTP client for the remote matching service:
//! - `POST /api/classify` with the submission payload
//! - `GET /api/health` liveness probe
//!
//! Every failure is mapped onto [`ClientError`] so callers can tell a
//! transport problem (the only fallback-eligible case) from a rejection.

use crate::form::SubmissionPayload;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::time::{Duration, Instant};
use thiserror::Error;
use vesselid_common::config::TomlConfig;

const USER_AGENT: &str = concat!("vesselid/", env!("CARGO_PKG_VERSION"));
const DEFAULT_VALIDATION_MESSAGE: &str = "Invalid request. Please check your inputs.";

/// Classification client errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// Request never completed (connection refused, DNS, timeout)
    #[error("Network error: {0}")]
    Network(String),

    /// 400 or 422: the service rejected the inputs
    #[error("Validation error ({status}): {message}")]
    Validation { status: u16, message: String },

    /// 500
    #[error("Server error: {0}")]
    Server(String),

    /// Any other non-2xx status
    #[error("Request failed with status {0}")]
    Status(u16),

    /// 2xx response whose success flag is false
    #[error("Classification rejected: {0}")]
    Rejected(String),

    /// Response body could not be parsed
    #[error("Parse error: {0}")]
    Decode(String),
}

impl ClientError {
    /// True only when the service could not be reached
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Network(_))
    }

    /// Text shown to the user
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Network(_) => {
                "Unable to connect to the classification service. Please check your connection and try again."
                    .to_string()
            }
            ClientError::Validation { message, .. } => message.clone(),
            ClientError::Server(_) => "Server error. Please try again later.".to_string(),
            ClientError::Status(code) => format!("Request failed with status {}", code),
            ClientError::Rejected(message) => message.clone(),
            ClientError::Decode(_) => {
                "The classification service returned a response that could not be read.".to_string()
            }
        }
    }

    /// Map a non-2xx status and its body text
    pub fn from_status(status: u16, body: &str) -> Self {
        let server_error = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
            .filter(|s| !s.trim().is_empty());
        match status {
            400 | 422 => ClientError::Validation {
                status,
                message: server_error.unwrap_or_else(|| DEFAULT_VALIDATION_MESSAGE.to_string()),
            },
            500 => ClientError::Server(server_error.unwrap_or_else(|| body.to_string())),
            other => ClientError::Status(other),
        }
    }
}

/// Response body of `POST /api/classify`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ClassifyResponse {
    pub success: bool,
    #[serde(default)]
    pub matches: Vec<RawMatch>,
    #[serde(default)]
    pub total_matches: u64,
    /// Seconds
    #[serde(default)]
    pub processing_time: f64,
    #[serde(default)]
    pub report_text: String,
    #[serde(default)]
    pub classification_id: String,
    /// Unix seconds
    #[serde(default)]
    pub timestamp: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One ranked match as sent by the service
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawMatch {
    #[serde(default)]
    pub rank: Option<u32>,
    /// 0-100
    #[serde(default)]
    pub similarity_score: f64,
    /// Vessels aggregated into this match
    #[serde(default)]
    pub ship_count: Option<u32>,
    /// `filter` or `similarity`
    #[serde(default, deserialize_with = "present_text")]
    pub match_type: Option<String>,
    #[serde(default)]
    pub ship_info: ShipInfo,
}

/// Vessel description nested in a match.
///
/// The service fills gaps with placeholders (`"Unknown"`, `"N/A"`, empty
/// strings, zero dimensions); those deserialize as `None`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ShipInfo {
    #[serde(default, deserialize_with = "present_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "present_text_list")]
    pub ship_names: Vec<String>,
    #[serde(default, deserialize_with = "present_text_list")]
    pub hull_numbers: Vec<String>,
    #[serde(default, deserialize_with = "present_text")]
    pub country: Option<String>,
    #[serde(default, deserialize_with = "present_text")]
    pub ship_class: Option<String>,
    #[serde(default, deserialize_with = "present_text")]
    pub ship_type: Option<String>,
    #[serde(default, deserialize_with = "present_text")]
    pub ship_role: Option<String>,
    #[serde(default, deserialize_with = "present_number")]
    pub length_metres: Option<f64>,
    #[serde(default, deserialize_with = "present_number")]
    pub beam_metres: Option<f64>,
    #[serde(default, deserialize_with = "present_number")]
    pub draught_metres: Option<f64>,
    #[serde(default, deserialize_with = "present_text")]
    pub pages: Option<String>,
}

fn is_placeholder(text: &str) -> bool {
    let text = text.trim();
    text.is_empty()
        || text.eq_ignore_ascii_case("unknown")
        || text.eq_ignore_ascii_case("n/a")
        || text.eq_ignore_ascii_case("nan")
}

fn present_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::String(s)) if !is_placeholder(&s) => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Lists of names or hull numbers; numeric entries become text and
/// placeholders are dropped
fn present_text_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<Value>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|item| match item {
            Value::String(s) if !is_placeholder(&s) => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .collect())
}

fn present_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    let value = match raw {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(value.filter(|v| v.is_finite() && *v != 0.0))
}

/// Response body of `GET /api/health`
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct HealthStatus {
    pub status: String,
}

impl HealthStatus {
    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("ok")
    }
}

/// Remote classification seam
///
/// The pipeline talks to the service only through this trait, so tests can
/// substitute a scripted implementation.
#[async_trait::async_trait]
pub trait ClassificationService: Send + Sync {
    async fn classify(&self, payload: &SubmissionPayload) -> Result<ClassifyResponse, ClientError>;
}

/// HTTP implementation of [`ClassificationService`]
pub struct ClassificationClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl ClassificationClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &TomlConfig) -> Result<Self, ClientError> {
        Self::new(&config.service_url, Duration::from_secs(config.request_timeout_secs))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Probe `GET /api/health`
    pub async fn health(&self) -> Result<HealthStatus, ClientError> {
        let url = format!("{}/api/health", self.base_url);
        tracing::debug!(url = %url, "Checking classification service health");

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::from_status(status.as_u16(), &body));
        }

        response
            .json::<HealthStatus>()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }
}

#[async_trait::async_trait]
impl ClassificationService for ClassificationClient {
    async fn classify(&self, payload: &SubmissionPayload) -> Result<ClassifyResponse, ClientError> {
        let url = format!("{}/api/classify", self.base_url);
        let started = Instant::now();
        tracing::info!(url = %url, top_k = ?payload.top_k(), "Sending classification request");

        let response = self
            .http_client
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Classification request did not complete");
                ClientError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "Classification service returned an error status");
            return Err(ClientError::from_status(status.as_u16(), &body));
        }

        let body: ClassifyResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))?;

        if !body.success {
            let message = body
                .error
                .clone()
                .filter(|e| !e.trim().is_empty())
                .unwrap_or_else(|| "Classification failed".to_string());
            return Err(ClientError::Rejected(message));
        }

        tracing::info!(
            status = status.as_u16(),
            matches = body.matches.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Classification response received"
        );
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping_prefers_server_text() {
        let err = ClientError::from_status(422, r#"{"error": "speed_knots_min must be numeric"}"#);
        assert_eq!(err.user_message(), "speed_knots_min must be numeric");

        let err = ClientError::from_status(400, "not json");
        assert_eq!(err.user_message(), DEFAULT_VALIDATION_MESSAGE);
    }

    #[test]
    fn test_status_mapping_other_codes() {
        assert!(matches!(ClientError::from_status(500, ""), ClientError::Server(_)));
        assert_eq!(
            ClientError::from_status(503, "").user_message(),
            "Request failed with status 503"
        );
        assert!(matches!(ClientError::from_status(404, ""), ClientError::Status(404)));
    }

    #[test]
    fn test_only_network_errors_are_transport() {
        assert!(ClientError::Network("refused".into()).is_transport());
        assert!(!ClientError::Server("boom".into()).is_transport());
        assert!(!ClientError::Rejected("no".into()).is_transport());
        assert!(!ClientError::from_status(422, "").is_transport());
    }

    #[test]
    fn test_placeholders_deserialize_as_absent() {
        let json = serde_json::json!({
            "rank": 1,
            "similarity_score": 91.5,
            "ship_count": 3,
            "match_type": "similarity",
            "ship_info": {
                "name": "Kongo",
                "hull_numbers": ["DDG-173"],
                "country": "Japan",
                "ship_class": "Unknown",
                "ship_type": "",
                "ship_role": "N/A",
                "length_metres": "161",
                "beam_metres": 21.0,
                "draught_metres": 0,
                "pages": 112
            }
        });
        let raw: RawMatch = serde_json::from_value(json).unwrap();
        assert_eq!(raw.ship_info.country.as_deref(), Some("Japan"));
        assert_eq!(raw.ship_info.ship_class, None);
        assert_eq!(raw.ship_info.ship_type, None);
        assert_eq!(raw.ship_info.ship_role, None);
        assert_eq!(raw.ship_info.length_metres, Some(161.0));
        assert_eq!(raw.ship_info.beam_metres, Some(21.0));
        assert_eq!(raw.ship_info.draught_metres, None);
        assert_eq!(raw.ship_info.pages.as_deref(), Some("112"));
    }

    #[test]
    fn test_numeric_and_placeholder_list_entries() {
        let json = r#"{
            "similarity_score": 80,
            "ship_info": {
                "ship_names": ["Kongo", "", null, 7],
                "hull_numbers": [173, null, "N/A", " DDG-174 "]
            }
        }"#;
        let raw: RawMatch = serde_json::from_str(json).unwrap();
        assert_eq!(raw.ship_info.ship_names, vec!["Kongo".to_string(), "7".to_string()]);
        assert_eq!(raw.ship_info.hull_numbers, vec!["173".to_string(), "DDG-174".to_string()]);

        let raw: RawMatch = serde_json::from_str(r#"{"ship_info": {"hull_numbers": null}}"#).unwrap();
        assert!(raw.ship_info.hull_numbers.is_empty());
    }

    #[test]
    fn test_minimal_response() {
        let response: ClassifyResponse = serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert!(response.matches.is_empty());
        assert_eq!(response.total_matches, 0);
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = ClassificationClient::new("http://localhost:5001/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:5001");
    }
}

//! Cloud sink HTTP client
//!
//! The datastore accepts one row per HTTPS POST, authenticated with a
//! static API-key header plus a bearer credential. 201 and 204 are the only
//! success statuses; anything else is reported with the response body
//! truncated to 200 characters and the row is lost.
//!
//! The client is deliberately minimal: a lightweight `ureq` agent, JSON
//! bodies, one synchronous request per row with an explicit timeout. No
//! connection pooling knobs, no retries: delivery is at-most-once by
//! design.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use urbansense_core::{CompletedBucket, NodeIdentity};

/// Default request timeout
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Characters of an error response body kept for logging
const ERROR_BODY_MAX_CHARS: usize = 200;

/// Sink client errors
#[derive(Debug, Error)]
pub enum SinkError {
    /// Network or transport failure
    #[error("transport: {0}")]
    Transport(String),

    /// Sink answered with a non-success status
    #[error("sink rejected row: status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, truncated to 200 characters
        body: String,
    },

    /// Row could not be serialized
    #[error("serialization: {0}")]
    Serialization(String),

    /// Invalid configuration
    #[error("configuration: {0}")]
    Config(String),
}

/// One row of the sink's insert schema
///
/// `celsius` is omitted from the JSON entirely when the bucket aggregated
/// no valid temperature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorRow {
    pub sensor_id: u32,
    pub lat: f32,
    pub lon: f32,
    pub location_name: String,
    /// Local-clock bucket instant, ISO-8601, no explicit offset
    pub ts_utc: String,
    pub average_db: f32,
    pub max_db: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub celsius: Option<f32>,
}

impl SensorRow {
    /// Join a completed bucket with its node's identity
    pub fn from_bucket(identity: &NodeIdentity, bucket: &CompletedBucket) -> Self {
        let k = bucket.key;
        Self {
            sensor_id: identity.sensor_id,
            lat: identity.lat,
            lon: identity.lon,
            location_name: identity.location_name.as_str().to_owned(),
            ts_utc: format!(
                "{:04}-{:02}-{:02}T{:02}:{:02}:00",
                k.year, k.month, k.day, k.hour, k.minute
            ),
            average_db: bucket.avg_spl_db,
            max_db: bucket.max_spl_db,
            celsius: bucket.avg_celsius,
        }
    }
}

/// Destination for insert rows
///
/// Seam for the dispatcher: production uses [`CloudSink`], tests record
/// rows in memory.
pub trait RowSink {
    /// Insert one row
    fn insert(&mut self, row: &SensorRow) -> Result<(), SinkError>;
}

impl<T: RowSink + ?Sized> RowSink for &mut T {
    fn insert(&mut self, row: &SensorRow) -> Result<(), SinkError> {
        (**self).insert(row)
    }
}

/// Sink configuration
#[derive(Clone)]
pub struct SinkConfig {
    /// Base URL of the datastore API
    pub base_url: String,
    /// Insert endpoint path
    pub insert_path: String,
    /// Static API key, sent as the `apikey` header
    pub api_key: Option<String>,
    /// Bearer credential for the `Authorization` header
    pub bearer: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl SinkConfig {
    /// Create a configuration with defaults for everything but the URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            insert_path: "/rest/v1/sensor_data_backup".into(),
            api_key: None,
            bearer: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Set the insert endpoint path
    pub fn insert_path(mut self, path: impl Into<String>) -> Self {
        self.insert_path = path.into();
        self
    }

    /// Set the static API key header
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the bearer credential
    pub fn bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    /// Set the request timeout in seconds
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }
}

/// HTTPS sink client
pub struct CloudSink {
    config: SinkConfig,
    agent: ureq::Agent,
}

impl CloudSink {
    /// Create a client; rejects base URLs without an http(s) scheme
    pub fn new(config: SinkConfig) -> Result<Self, SinkError> {
        if !config.base_url.starts_with("http://") && !config.base_url.starts_with("https://") {
            return Err(SinkError::Config(
                "base URL must start with http:// or https://".into(),
            ));
        }

        let agent = ureq::AgentBuilder::new()
            .timeout(config.timeout)
            .user_agent(&format!("urbansense/{}", env!("CARGO_PKG_VERSION")))
            .build();

        Ok(Self { config, agent })
    }

    fn build_request(&self) -> ureq::Request {
        let url = format!("{}{}", self.config.base_url, self.config.insert_path);
        let mut request = self
            .agent
            .post(&url)
            .set("Content-Type", "application/json");
        if let Some(key) = &self.config.api_key {
            request = request.set("apikey", key);
        }
        if let Some(token) = &self.config.bearer {
            request = request.set("Authorization", &format!("Bearer {}", token));
        }
        request
    }
}

impl RowSink for CloudSink {
    fn insert(&mut self, row: &SensorRow) -> Result<(), SinkError> {
        let body = serde_json::to_string(row)
            .map_err(|e| SinkError::Serialization(e.to_string()))?;

        match self.build_request().send_string(&body) {
            Ok(resp) if matches!(resp.status(), 201 | 204) => Ok(()),
            Ok(resp) => {
                let status = resp.status();
                let body = truncate_body(resp.into_string().unwrap_or_default());
                Err(SinkError::Status { status, body })
            }
            Err(ureq::Error::Status(status, resp)) => {
                let body = truncate_body(resp.into_string().unwrap_or_default());
                Err(SinkError::Status { status, body })
            }
            Err(ureq::Error::Transport(e)) => Err(SinkError::Transport(e.to_string())),
        }
    }
}

fn truncate_body(body: String) -> String {
    if body.chars().count() <= ERROR_BODY_MAX_CHARS {
        body
    } else {
        body.chars().take(ERROR_BODY_MAX_CHARS).collect()
    }
}

//! Status store record, wire bodies, and error definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Status schema spoken by this client: integer microsecond latency,
/// name and state always tracked.
pub const STATUS_SCHEMA_VERSION: &str = "2";

/// Header announcing [`STATUS_SCHEMA_VERSION`] on every request.
pub const SCHEMA_HEADER: &str = "X-Status-Schema";

/// A record as owned by the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RemoteStatusRecord {
    /// Store-side surrogate key.
    pub id: i64,
    #[serde(default)]
    pub name: String,
    /// Target address; the record's natural key.
    #[serde(rename = "ip_address", default)]
    pub address: String,
    #[serde(rename = "status", default)]
    pub state: String,
    /// Latency in microseconds.
    #[serde(rename = "ping_time")]
    pub latency_us: i64,
    pub last_successful_ping: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// `PATCH /container_status/{address}` body.
#[derive(Debug, Serialize)]
pub(crate) struct UpdateStatusBody<'a> {
    pub ping_time: i64,
    pub last_successful_ping: DateTime<Utc>,
    #[serde(skip_serializing_if = "str::is_empty")]
    pub name: &'a str,
    #[serde(rename = "status", skip_serializing_if = "str::is_empty")]
    pub state: &'a str,
}

/// `POST /container_status` body.
#[derive(Debug, Serialize)]
pub(crate) struct CreateStatusBody<'a> {
    pub ip_address: &'a str,
    pub ping_time: i64,
    pub last_successful_ping: DateTime<Utc>,
    pub name: &'a str,
    #[serde(rename = "status")]
    pub state: &'a str,
}

/// Errors that can occur talking to the status store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No record exists for the address. Drives the create fallback.
    #[error("no status record for '{0}'")]
    NotFound(String),

    /// Store answered with an unexpected status.
    #[error("status store returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Request could not be sent or the response not read.
    #[error("status store request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Response body did not match the record schema.
    #[error("failed to decode status records: {0}")]
    Decode(#[from] serde_json::Error),

    /// Client could not be built from its configuration.
    #[error("invalid status store configuration: {0}")]
    Config(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

/// Result type for status store operations.
pub type StoreResult<T> = Result<T, StoreError>;

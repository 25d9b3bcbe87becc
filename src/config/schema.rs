//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the pinger.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the pinger service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct PingerConfig {
    /// Reconciliation loop cadence.
    pub monitor: MonitorConfig,

    /// ICMP probe settings.
    pub probe: ProbeConfig,

    /// Remote status store connection.
    pub store: StoreConfig,

    /// Container runtime discovery.
    pub discovery: DiscoveryConfig,

    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,
}

/// Reconciliation loop configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Seconds between reconciliation cycles.
    pub interval_secs: u64,
}

impl MonitorConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self { interval_secs: 10 }
    }
}

/// Probe configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Echo requests sent per probe.
    pub count: u16,

    /// Timeout for a single echo request in milliseconds.
    pub attempt_timeout_ms: u64,

    /// Gap between consecutive echo requests in milliseconds.
    pub send_interval_ms: u64,

    /// ICMP payload size in bytes.
    pub payload_size: usize,
}

impl ProbeConfig {
    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.attempt_timeout_ms)
    }

    pub fn send_interval(&self) -> Duration {
        Duration::from_millis(self.send_interval_ms)
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            count: 3,
            attempt_timeout_ms: 1000,
            send_interval_ms: 100,
            payload_size: 56,
        }
    }
}

/// Status store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    /// API root, e.g. "http://backend:8080/api/v1".
    pub base_url: String,

    /// API key sent with every request.
    pub api_key: String,

    /// Header carrying the API key.
    pub api_key_header: String,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// Maximum concurrent upserts within one cycle.
    pub publish_concurrency: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api/v1".to_string(),
            api_key: String::new(),
            api_key_header: "X-Api-Key".to_string(),
            timeout_secs: 10,
            publish_concurrency: 16,
        }
    }
}

/// Container runtime discovery configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Path to the Docker Engine unix socket.
    pub socket_path: String,

    /// Timeout for the whole listing call in seconds.
    pub timeout_secs: u64,

    /// Include stopped containers.
    pub all: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            socket_path: "/var/run/docker.sock".to_string(),
            timeout_secs: 10,
            all: false,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Human-readable or JSON log lines.
    pub log_format: LogFormat,

    /// Enable the Prometheus endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9102".to_string(),
        }
    }
}

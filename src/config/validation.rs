//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (intervals and timeouts > 0, probe count bounded)
//! - Check that the store URL and metrics address are usable
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: PingerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::PingerConfig;

/// Upper bound on echo requests per probe.
pub const MAX_PROBE_COUNT: u16 = 100;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field, e.g. `store.base_url`.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check every semantic constraint and collect all failures.
pub fn validate_config(config: &PingerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.monitor.interval_secs == 0 {
        errors.push(ValidationError::new("monitor.interval_secs", "must be greater than 0"));
    }

    if config.probe.count == 0 || config.probe.count > MAX_PROBE_COUNT {
        errors.push(ValidationError::new(
            "probe.count",
            format!("must be between 1 and {}", MAX_PROBE_COUNT),
        ));
    }
    if config.probe.attempt_timeout_ms == 0 {
        errors.push(ValidationError::new("probe.attempt_timeout_ms", "must be greater than 0"));
    }

    match url::Url::parse(&config.store.base_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && !url.cannot_be_a_base() => {}
        Ok(url) => errors.push(ValidationError::new(
            "store.base_url",
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new("store.base_url", e.to_string())),
    }
    if config.store.api_key_header.trim().is_empty() {
        errors.push(ValidationError::new("store.api_key_header", "must not be empty"));
    }
    if config.store.timeout_secs == 0 {
        errors.push(ValidationError::new("store.timeout_secs", "must be greater than 0"));
    }
    if config.store.publish_concurrency == 0 {
        errors.push(ValidationError::new("store.publish_concurrency", "must be greater than 0"));
    }

    if config.discovery.socket_path.trim().is_empty() {
        errors.push(ValidationError::new("discovery.socket_path", "must not be empty"));
    }
    if config.discovery.timeout_secs == 0 {
        errors.push(ValidationError::new("discovery.timeout_secs", "must be greater than 0"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

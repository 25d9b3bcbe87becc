//! Target discovery subsystem.
//!
//! # Data Flow
//! ```text
//! Reconciliation cycle starts
//!     → Discover::list (docker.rs talks to the runtime socket)
//!     → Vec<Target> (full live set, fresh every cycle)
//!     → dedup_by_address (address is the identity key)
//! ```
//!
//! # Design Decisions
//! - No filtering beyond identity dedup; the runtime's view is authoritative
//! - Any discovery failure aborts the whole cycle; retry waits for the next tick
//! - Empty addresses are passed through; later stages decide what to skip

pub mod docker;

pub use docker::DockerDiscovery;

use std::collections::HashSet;
use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

/// A monitored endpoint reported by the container runtime.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target {
    /// Network address; the identity key within a cycle. May be empty.
    pub address: String,
    /// Display name (container name without the leading slash).
    pub name: String,
    /// Runtime lifecycle state, e.g. "running".
    pub state: String,
}

impl Target {
    pub fn new(
        address: impl Into<String>,
        name: impl Into<String>,
        state: impl Into<String>,
    ) -> Self {
        Self {
            address: address.into(),
            name: name.into(),
            state: state.into(),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) [{}]", self.name, self.address, self.state)
    }
}

/// Errors that can occur while listing targets.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Runtime socket could not be reached.
    #[error("cannot connect to runtime at {path}: {source}")]
    Connect {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// HTTP exchange with the runtime failed.
    #[error("runtime request failed: {0}")]
    Request(String),

    /// Runtime answered with a non-success status.
    #[error("runtime returned status {0}")]
    Status(u16),

    /// Response body was not the expected container list.
    #[error("failed to decode runtime response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Listing did not finish in time.
    #[error("runtime did not answer within {0} seconds")]
    Timeout(u64),

    /// Adapter could not be constructed.
    #[error("invalid discovery configuration: {0}")]
    Config(String),
}

/// Capability to list the current live targets.
#[async_trait]
pub trait Discover: Send + Sync {
    /// Return the full live set for this cycle.
    async fn list(&self) -> Result<Vec<Target>, DiscoveryError>;
}

/// Keep the first target for every non-empty address.
///
/// Empty addresses are never merged: they identify nothing and are dropped
/// later by the probe stage.
pub fn dedup_by_address(targets: Vec<Target>) -> Vec<Target> {
    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(targets.len());

    for target in targets {
        if target.address.is_empty() || seen.insert(target.address.clone()) {
            unique.push(target);
        } else {
            tracing::warn!(
                address = %target.address,
                name = %target.name,
                "Duplicate target address discovered, keeping first occurrence"
            );
        }
    }

    unique
}

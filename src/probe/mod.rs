//! Reachability probing subsystem.
//!
//! # Data Flow
//! ```text
//! Discovered targets
//!     → engine.rs (one task per target, barrier join)
//!     → Prober::probe (icmp.rs sends a bounded echo series)
//!     → ProbeOutcome per target slot (index = target position)
//! ```
//!
//! # Design Decisions
//! - Probes share no mutable state; each task writes only its own slot
//! - Zero replies is a result (unreachable, latency -1), not an error
//! - A probe that cannot start is an error for that target only

pub mod engine;
pub mod icmp;

pub use engine::{ProbeEngine, ProbeOutcome};
pub use icmp::IcmpProber;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::discovery::Target;

/// Latency reported for a target that answered no echo request.
pub const UNREACHABLE_LATENCY: i64 = -1;

/// Outcome of one completed probe.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeResult {
    pub target: Target,
    /// At least one echo reply was received.
    pub reachable: bool,
    /// Mean round trip in microseconds, or [`UNREACHABLE_LATENCY`].
    pub latency_us: i64,
    pub observed_at: DateTime<Utc>,
}

impl ProbeResult {
    pub fn reachable(target: Target, latency_us: i64) -> Self {
        Self {
            target,
            reachable: true,
            latency_us,
            observed_at: Utc::now(),
        }
    }

    pub fn unreachable(target: Target) -> Self {
        Self {
            target,
            reachable: false,
            latency_us: UNREACHABLE_LATENCY,
            observed_at: Utc::now(),
        }
    }

    /// Build a result from the round trips of the replies that arrived.
    pub fn from_round_trips(target: Target, round_trips: &[Duration]) -> Self {
        if round_trips.is_empty() {
            return Self::unreachable(target);
        }

        let total: u128 = round_trips.iter().map(Duration::as_micros).sum();
        let mean = total / round_trips.len() as u128;
        Self::reachable(target, i64::try_from(mean).unwrap_or(i64::MAX))
    }
}

/// Errors that keep a probe from producing a result.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProbeError {
    /// Probe could not be set up, e.g. the address does not parse.
    #[error("cannot initialize probe for '{address}': {reason}")]
    Init { address: String, reason: String },

    /// ICMP socket could not be opened.
    #[error("ICMP socket unavailable: {0}")]
    Socket(String),

    /// Probe task ended without reporting (panicked or was aborted).
    #[error("probe task for '{address}' did not complete")]
    Aborted { address: String },
}

/// Capability to measure one target.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, target: &Target) -> Result<ProbeResult, ProbeError>;
}

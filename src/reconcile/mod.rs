//! Reconciliation subsystem.
//!
//! # State Machine
//! ```text
//! Idle → Discovering → Probing → Publishing → GarbageCollecting → Idle
//!          │ error                                   │ error
//!          └──────────────→ Idle ←───────────────────┘
//! ```
//!
//! # Data Flow
//! ```text
//! monitor.rs: timer tick (or shutdown, checked only while Idle)
//!     → cycle.rs: Reconciler::run_cycle
//!         → discovery (abort cycle on error)
//!         → probe engine (barrier)
//!         → publish reachable results (independent per target)
//!         → garbage-collect records for addresses not discovered
//! ```
//!
//! # Design Decisions
//! - At most one cycle runs at a time; missed ticks are skipped
//! - Unreachable targets keep their last record untouched
//! - Activity is decided by discovery, not by probe success
//! - Publish tolerates per-target failures; cleanup stops at the first
//!   failed delete and reports it as the cycle's error

pub mod cycle;
pub mod monitor;

pub use cycle::{stale_addresses, Reconciler};
pub use monitor::ReconcileLoop;

use std::fmt;

use thiserror::Error;

use crate::discovery::DiscoveryError;
use crate::store::StoreError;

/// Where a reconciler currently is in its cycle.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePhase {
    Idle = 0,
    Discovering = 1,
    Probing = 2,
    Publishing = 3,
    GarbageCollecting = 4,
}

impl From<u8> for CyclePhase {
    fn from(val: u8) -> Self {
        match val {
            1 => CyclePhase::Discovering,
            2 => CyclePhase::Probing,
            3 => CyclePhase::Publishing,
            4 => CyclePhase::GarbageCollecting,
            _ => CyclePhase::Idle,
        }
    }
}

impl fmt::Display for CyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CyclePhase::Idle => "idle",
            CyclePhase::Discovering => "discovering",
            CyclePhase::Probing => "probing",
            CyclePhase::Publishing => "publishing",
            CyclePhase::GarbageCollecting => "garbage_collecting",
        };
        f.write_str(name)
    }
}

/// Errors that end a cycle early.
#[derive(Debug, Error)]
pub enum CycleError {
    /// Targets could not be listed; nothing was probed or published.
    #[error("target discovery failed: {0}")]
    Discovery(#[source] DiscoveryError),

    /// Remote records could not be listed; no deletes were issued.
    #[error("failed to list status records: {0}")]
    CleanupList(#[source] StoreError),

    /// A delete failed; remaining stale records were left for the next cycle.
    #[error("failed to delete status for {address}: {source}")]
    CleanupDelete {
        address: String,
        #[source]
        source: StoreError,
    },
}

impl CycleError {
    /// Label used for the cycle outcome metric.
    pub fn outcome(&self) -> &'static str {
        match self {
            CycleError::Discovery(_) => "discovery_failed",
            CycleError::CleanupList(_) => "cleanup_list_failed",
            CycleError::CleanupDelete { .. } => "cleanup_delete_failed",
        }
    }
}

/// Counters for one completed cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub discovered: usize,
    pub reachable: usize,
    pub unreachable: usize,
    pub probe_failures: usize,
    pub updated: usize,
    pub created: usize,
    pub publish_failures: usize,
    pub deleted: usize,
}

impl CycleReport {
    /// Probe outcomes collected; always equals `discovered`.
    pub fn probed(&self) -> usize {
        self.reachable + self.unreachable + self.probe_failures
    }
}

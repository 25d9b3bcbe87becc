//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events, one span per cycle)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON lines)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - The subscriber is installed once by the binary; library code only emits
//! - Every cycle carries a `cycle_id` so its events can be correlated
//! - Metric calls are no-ops until an exporter is installed

pub mod logging;
pub mod metrics;

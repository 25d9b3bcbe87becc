//! Container health reconciliation service library.
//!
//! Discovers live containers, probes them concurrently, and keeps a remote
//! status store in step with what was found.

pub mod config;
pub mod discovery;
pub mod lifecycle;
pub mod observability;
pub mod probe;
pub mod reconcile;
pub mod store;

pub use config::schema::PingerConfig;
pub use lifecycle::Shutdown;
pub use reconcile::{ReconcileLoop, Reconciler};

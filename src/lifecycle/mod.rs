//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     trigger → every subscriber wakes
//!     → reconciliation loop exits at its next idle boundary
//! ```
//!
//! # Design Decisions
//! - Shutdown is cooperative; an in-flight cycle always finishes first
//! - Construction failures happen before any of this is wired up

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::spawn_signal_listener;

//! Periodic reconciliation loop.
//!
//! # Responsibilities
//! - Run one cycle per timer tick
//! - Never overlap cycles; ticks missed during a long cycle are skipped
//! - Exit on shutdown, but only between cycles

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};
use tracing::Instrument;
use uuid::Uuid;

use crate::reconcile::Reconciler;

pub struct ReconcileLoop {
    reconciler: Arc<Reconciler>,
    interval: Duration,
}

impl ReconcileLoop {
    pub fn new(reconciler: Arc<Reconciler>, interval: Duration) -> Self {
        Self { reconciler, interval }
    }

    /// Run until shutdown is signalled. Returns the number of cycles run.
    ///
    /// The first cycle starts immediately.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) -> u64 {
        tracing::info!(interval_secs = self.interval.as_secs_f64(), "Starting monitoring");

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut cycles = 0;

        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    tracing::info!(cycles, "Shutting down monitoring loop");
                    break;
                }
                _ = ticker.tick() => {
                    let span = tracing::info_span!("cycle", cycle_id = %Uuid::new_v4());
                    // Errors are logged by the reconciler; the loop only keeps going.
                    let _ = self.reconciler.run_cycle().instrument(span).await;
                    cycles += 1;
                }
            }
        }

        cycles
    }
}

//! Concurrent probe fan-out.
//!
//! # Responsibilities
//! - Spawn one independent task per target
//! - Wait for the whole batch before returning (barrier)
//! - Keep results in target order so slot `i` belongs to target `i`

use std::sync::Arc;

use tokio::task::JoinSet;

use crate::discovery::Target;
use crate::observability::metrics;
use crate::probe::{ProbeError, ProbeResult, Prober};

/// What a single target's probe produced this cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    Measured(ProbeResult),
    Failed(ProbeError),
}

impl ProbeOutcome {
    /// The measured result, if the probe ran.
    pub fn result(&self) -> Option<&ProbeResult> {
        match self {
            ProbeOutcome::Measured(result) => Some(result),
            ProbeOutcome::Failed(_) => None,
        }
    }
}

/// Runs a batch of probes in parallel.
#[derive(Clone)]
pub struct ProbeEngine {
    prober: Arc<dyn Prober>,
}

impl ProbeEngine {
    pub fn new(prober: Arc<dyn Prober>) -> Self {
        Self { prober }
    }

    /// Probe every target concurrently and return one outcome per target.
    ///
    /// The returned vector has the same length and order as `targets`.
    pub async fn probe_all(&self, targets: &[Target]) -> Vec<ProbeOutcome> {
        let mut slots: Vec<Option<ProbeOutcome>> = (0..targets.len()).map(|_| None).collect();
        let mut tasks = JoinSet::new();

        for (index, target) in targets.iter().cloned().enumerate() {
            let prober = Arc::clone(&self.prober);
            tasks.spawn(async move {
                let outcome = match prober.probe(&target).await {
                    Ok(result) => ProbeOutcome::Measured(result),
                    Err(e) => ProbeOutcome::Failed(e),
                };
                (index, outcome)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => slots[index] = Some(outcome),
                Err(e) => tracing::error!(error = %e, "Probe task did not complete"),
            }
        }

        slots
            .into_iter()
            .zip(targets)
            .map(|(slot, target)| {
                let outcome = slot.unwrap_or_else(|| {
                    ProbeOutcome::Failed(ProbeError::Aborted {
                        address: target.address.clone(),
                    })
                });
                log_outcome(target, &outcome);
                outcome
            })
            .collect()
    }
}

fn log_outcome(target: &Target, outcome: &ProbeOutcome) {
    match outcome {
        ProbeOutcome::Measured(result) if result.reachable => {
            tracing::debug!(
                address = %target.address,
                name = %target.name,
                state = %target.state,
                latency_us = result.latency_us,
                "Probe succeeded"
            );
            metrics::record_probe("reachable", Some(result.latency_us));
        }
        ProbeOutcome::Measured(_) => {
            tracing::info!(
                address = %target.address,
                name = %target.name,
                state = %target.state,
                "Target unreachable, no echo replies"
            );
            metrics::record_probe("unreachable", None);
        }
        ProbeOutcome::Failed(e) => {
            tracing::warn!(
                address = %target.address,
                name = %target.name,
                state = %target.state,
                error = %e,
                "Probe failed"
            );
            metrics::record_probe("failed", None);
        }
    }
}

//! One reconciliation cycle.
//!
//! # Responsibilities
//! - Drive discover → probe → publish → garbage-collect
//! - Isolate per-target failures during probing and publishing
//! - Delete records whose address was not discovered this cycle

use std::collections::HashSet;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Instant;

use futures_util::stream::{self, StreamExt};

use crate::discovery::{dedup_by_address, Discover, Target};
use crate::observability::metrics;
use crate::probe::{ProbeEngine, ProbeOutcome, ProbeResult, Prober};
use crate::reconcile::{CycleError, CyclePhase, CycleReport};
use crate::store::{self, RemoteStatusRecord, StoreHandles, UpsertAction, UpsertStatus};

/// Default cap on concurrent upserts within one cycle.
pub const DEFAULT_PUBLISH_CONCURRENCY: usize = 16;

/// Runs reconciliation cycles against one runtime and one store.
pub struct Reconciler {
    discovery: Arc<dyn Discover>,
    engine: ProbeEngine,
    store: StoreHandles,
    publish_concurrency: usize,
    phase: AtomicU8,
}

impl Reconciler {
    pub fn new(discovery: Arc<dyn Discover>, prober: Arc<dyn Prober>, store: StoreHandles) -> Self {
        Self {
            discovery,
            engine: ProbeEngine::new(prober),
            store,
            publish_concurrency: DEFAULT_PUBLISH_CONCURRENCY,
            phase: AtomicU8::new(CyclePhase::Idle as u8),
        }
    }

    pub fn with_publish_concurrency(mut self, limit: usize) -> Self {
        self.publish_concurrency = limit.max(1);
        self
    }

    /// Current phase; `Idle` between cycles.
    pub fn phase(&self) -> CyclePhase {
        CyclePhase::from(self.phase.load(Ordering::Relaxed))
    }

    fn enter(&self, phase: CyclePhase) {
        self.phase.store(phase as u8, Ordering::Relaxed);
        tracing::trace!(phase = %phase, "Cycle phase");
    }

    /// Run a single cycle to completion.
    pub async fn run_cycle(&self) -> Result<CycleReport, CycleError> {
        let started = Instant::now();
        let result = self.execute().await;
        self.enter(CyclePhase::Idle);

        let elapsed = started.elapsed();
        match &result {
            Ok(report) => {
                metrics::record_cycle("ok", elapsed);
                tracing::info!(
                    discovered = report.discovered,
                    reachable = report.reachable,
                    unreachable = report.unreachable,
                    probe_failures = report.probe_failures,
                    updated = report.updated,
                    created = report.created,
                    publish_failures = report.publish_failures,
                    deleted = report.deleted,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Reconciliation cycle complete"
                );
            }
            Err(e) => {
                metrics::record_cycle(e.outcome(), elapsed);
                tracing::error!(error = %e, elapsed_ms = elapsed.as_millis() as u64, "Reconciliation cycle failed");
            }
        }

        result
    }

    async fn execute(&self) -> Result<CycleReport, CycleError> {
        let mut report = CycleReport::default();

        self.enter(CyclePhase::Discovering);
        let targets = self.discover().await?;
        report.discovered = targets.len();

        self.enter(CyclePhase::Probing);
        let mut reachable = Vec::new();
        for outcome in self.engine.probe_all(&targets).await {
            match outcome {
                ProbeOutcome::Measured(result) if result.reachable => {
                    report.reachable += 1;
                    reachable.push(result);
                }
                ProbeOutcome::Measured(_) => report.unreachable += 1,
                ProbeOutcome::Failed(_) => report.probe_failures += 1,
            }
        }

        self.enter(CyclePhase::Publishing);
        self.publish(&reachable, &mut report).await;

        self.enter(CyclePhase::GarbageCollecting);
        // Every discovered target stays active, whatever its probe said.
        let active: HashSet<&str> = targets.iter().map(|t| t.address.as_str()).collect();
        report.deleted = self.collect_garbage(&active).await?;

        Ok(report)
    }

    async fn discover(&self) -> Result<Vec<Target>, CycleError> {
        let targets = self.discovery.list().await.map_err(CycleError::Discovery)?;
        let targets = dedup_by_address(targets);

        metrics::record_targets(targets.len());
        tracing::debug!(
            count = targets.len(),
            targets = %targets.iter().map(Target::to_string).collect::<Vec<_>>().join(", "),
            "Discovered targets"
        );

        Ok(targets)
    }

    async fn publish(&self, results: &[ProbeResult], report: &mut CycleReport) {
        let actions: Vec<Option<UpsertAction>> = stream::iter(results.iter().cloned())
            .map(|result| publish_one(Arc::clone(&self.store.upsert), result))
            .buffer_unordered(self.publish_concurrency)
            .collect()
            .await;

        for action in actions {
            match action {
                Some(UpsertAction::Updated) => report.updated += 1,
                Some(UpsertAction::Created) => report.created += 1,
                None => report.publish_failures += 1,
            }
        }
    }

    async fn collect_garbage(&self, active: &HashSet<&str>) -> Result<usize, CycleError> {
        let records = self.store.list.list().await.map_err(CycleError::CleanupList)?;
        let stale = stale_addresses(&records, active);

        tracing::debug!(records = records.len(), stale = stale.len(), "Cleaning up statuses");

        let mut deleted = 0;
        for address in stale {
            if let Err(source) = self.store.delete.delete(address).await {
                metrics::record_delete("failed");
                return Err(CycleError::CleanupDelete {
                    address: address.to_string(),
                    source,
                });
            }

            metrics::record_delete("deleted");
            tracing::info!(address, "Deleted status of vanished target");
            deleted += 1;
        }

        Ok(deleted)
    }
}

/// Upsert one reachable result; failures are logged and reported as `None`.
async fn publish_one(upsert: Arc<dyn UpsertStatus>, result: ProbeResult) -> Option<UpsertAction> {
    let target = &result.target;
    match store::upsert(
        upsert.as_ref(),
        &target.address,
        result.latency_us,
        &target.name,
        &target.state,
    )
    .await
    {
        Ok(action) => {
            metrics::record_publish(action.as_str());
            Some(action)
        }
        Err(e) => {
            metrics::record_publish("failed");
            tracing::error!(
                address = %target.address,
                name = %target.name,
                state = %target.state,
                error = %e,
                "Failed to publish status"
            );
            None
        }
    }
}

/// Addresses of records that should be deleted, in list order.
///
/// Records with an empty address are never selected; an address listed
/// twice is selected once.
pub fn stale_addresses<'a>(records: &'a [RemoteStatusRecord], active: &HashSet<&str>) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    records
        .iter()
        .map(|record| record.address.as_str())
        .filter(|address| !address.is_empty() && !active.contains(*address) && seen.insert(*address))
        .collect()
}

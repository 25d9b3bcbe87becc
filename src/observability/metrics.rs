//! Metrics collection and exposition.
//!
//! # Metrics
//! - `pinger_cycles_total` (counter): cycles by outcome
//! - `pinger_cycle_duration_seconds` (histogram): wall time per cycle
//! - `pinger_targets_discovered` (gauge): targets in the last cycle
//! - `pinger_probes_total` (counter): probes by result
//! - `pinger_probe_latency_microseconds` (histogram): reachable targets only
//! - `pinger_publish_total` (counter): upserts by action
//! - `pinger_deletes_total` (counter): garbage-collection deletes by result

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Start the Prometheus scrape endpoint. Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_cycle(outcome: &'static str, elapsed: Duration) {
    counter!("pinger_cycles_total", "outcome" => outcome).increment(1);
    histogram!("pinger_cycle_duration_seconds").record(elapsed.as_secs_f64());
}

pub fn record_targets(count: usize) {
    gauge!("pinger_targets_discovered").set(count as f64);
}

pub fn record_probe(result: &'static str, latency_us: Option<i64>) {
    counter!("pinger_probes_total", "result" => result).increment(1);
    if let Some(latency) = latency_us {
        histogram!("pinger_probe_latency_microseconds").record(latency as f64);
    }
}

pub fn record_publish(action: &'static str) {
    counter!("pinger_publish_total", "action" => action).increment(1);
}

pub fn record_delete(result: &'static str) {
    counter!("pinger_deletes_total", "result" => result).increment(1);
}

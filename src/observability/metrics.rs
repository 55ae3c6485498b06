//! Metrics collection and exposition.
//!
//! # Metrics
//! - `fleet_probes_total` (counter): probe outcomes by `outcome`
//! - `fleet_host_transitions_total` (counter): status transitions by `to`
//! - `fleet_hosts` (gauge): registered hosts by `status`
//! - `fleet_redistributions_total` (counter): attempts by `outcome`
//! - `fleet_replica_placements_total` (counter): per-host scale commands by `outcome`
//! - `fleet_unplaced_replicas` (gauge): replicas parked without a target
//! - `fleet_scale_requests_total` (counter): explicit scale requests by `outcome`

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::registry::StatusCounts;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_probe(healthy: bool) {
    let outcome = if healthy { "success" } else { "failure" };
    ::metrics::counter!("fleet_probes_total", "outcome" => outcome).increment(1);
}

pub fn record_transition(to: &'static str) {
    ::metrics::counter!("fleet_host_transitions_total", "to" => to).increment(1);
}

pub fn record_fleet_size(counts: &StatusCounts) {
    ::metrics::gauge!("fleet_hosts", "status" => "unknown").set(counts.unknown as f64);
    ::metrics::gauge!("fleet_hosts", "status" => "running").set(counts.running as f64);
    ::metrics::gauge!("fleet_hosts", "status" => "down").set(counts.down as f64);
}

pub fn record_redistribution(outcome: &'static str) {
    ::metrics::counter!("fleet_redistributions_total", "outcome" => outcome).increment(1);
}

pub fn record_placement(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    ::metrics::counter!("fleet_replica_placements_total", "outcome" => outcome).increment(1);
}

pub fn record_unplaced(replicas: u64) {
    ::metrics::gauge!("fleet_unplaced_replicas").set(replicas as f64);
}

pub fn record_scale(outcome: &'static str) {
    ::metrics::counter!("fleet_scale_requests_total", "outcome" => outcome).increment(1);
}

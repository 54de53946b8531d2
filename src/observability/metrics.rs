//! Metrics collection and exposition.
//!
//! # Metrics
//! - `router_selections_total` (counter): reads routed, by role and index
//! - `router_ping_total` (counter): pings by index and result
//! - `router_fatal_writes_total` (counter): writes that aborted the caller
//! - `router_connections_in_use` (gauge): open-connection slots held, by index

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::router::Role;

/// Start the Prometheus scrape endpoint. Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_selection(role: Role, index: usize) {
    counter!(
        "router_selections_total",
        "role" => role.as_str(),
        "index" => index.to_string()
    )
    .increment(1);
}

pub fn record_ping(index: usize, ok: bool) {
    let result = if ok { "ok" } else { "error" };
    counter!("router_ping_total", "index" => index.to_string(), "result" => result).increment(1);
}

pub fn record_fatal_write() {
    counter!("router_fatal_writes_total").increment(1);
}

pub fn record_in_use(index: usize, in_use: u32) {
    gauge!("router_connections_in_use", "index" => index.to_string()).set(in_use as f64);
}

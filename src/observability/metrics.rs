//! Metrics collection.
//!
//! # Metrics
//! - `fabric_proposals_total` (counter): endorsement results by outcome
//! - `fabric_order_status_total` (counter): orderer acknowledgements by status
//! - `fabric_commit_status_total` (counter): commit results (valid, invalid, timeout)
//! - `fabric_invoke_duration_seconds` (histogram): propose to settled
//! - `fabric_operations_total` (counter): lifecycle and query operations by result

use std::time::Instant;

pub fn record_proposal(endorsed: bool) {
    let result = if endorsed { "endorsed" } else { "rejected" };
    metrics::counter!("fabric_proposals_total", "result" => result).increment(1);
}

pub fn record_order_status(success: bool) {
    let status = if success { "success" } else { "failure" };
    metrics::counter!("fabric_order_status_total", "status" => status).increment(1);
}

pub fn record_commit_status(kind: &'static str) {
    metrics::counter!("fabric_commit_status_total", "status" => kind).increment(1);
}

pub fn record_invoke_duration(channel: &str, start: Instant) {
    metrics::histogram!("fabric_invoke_duration_seconds", "channel" => channel.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_operation(operation: &'static str, ok: bool) {
    let result = if ok { "ok" } else { "error" };
    metrics::counter!("fabric_operations_total", "operation" => operation, "result" => result)
        .increment(1);
}

//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Install the Prometheus recorder
//! - Define service metrics and the helpers that record them
//! - Refresh pull-style gauges from live state on each scrape
//!
//! # Metrics
//! - `todo_api_tasks_created_total` (counter)
//! - `todo_api_http_requests_total` (counter): by method, path, status
//! - `todo_api_http_request_duration_seconds` (histogram)
//! - `todo_api_tasks_current` (gauge): last observed list length
//! - `todo_api_memory_rss_bytes` (gauge): resident memory
//! - `todo_api_stress_chunks` (gauge): blocks held by the stress pool
//!
//! Every series carries an `instance` label.

use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use metrics::Label;
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};

const REQUEST_DURATION: &str = "todo_api_http_request_duration_seconds";

const LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
];

static HANDLE: Mutex<Option<PrometheusHandle>> = Mutex::new(None);

/// Install the global Prometheus recorder, or return the existing handle.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    let mut slot = HANDLE.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(handle) = slot.as_ref() {
        return Ok(handle.clone());
    }

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(Matcher::Full(REQUEST_DURATION.to_string()), LATENCY_BUCKETS)?
        .install_recorder()?;
    *slot = Some(handle.clone());
    Ok(handle)
}

/// Count a created task.
pub fn record_task_created(instance: &str) {
    metrics::counter!("todo_api_tasks_created_total", "instance" => instance.to_string()).increment(1);
}

/// Record a completed HTTP request.
pub fn record_request(instance: &str, method: &str, path: &str, status: u16, start: Instant) {
    let labels = vec![
        Label::new("instance", instance.to_string()),
        Label::new("method", method.to_string()),
        Label::new("path", path.to_string()),
        Label::new("status", status.to_string()),
    ];
    metrics::counter!("todo_api_http_requests_total", labels.clone()).increment(1);
    metrics::histogram!(REQUEST_DURATION, labels).record(start.elapsed().as_secs_f64());
}

/// Set the pull-style gauges from current state.
pub fn observe_gauges(instance: &str, tasks: usize, rss_bytes: u64, stress_chunks: usize) {
    let instance = instance.to_string();
    metrics::gauge!("todo_api_tasks_current", "instance" => instance.clone()).set(tasks as f64);
    metrics::gauge!("todo_api_memory_rss_bytes", "instance" => instance.clone()).set(rss_bytes as f64);
    metrics::gauge!("todo_api_stress_chunks", "instance" => instance).set(stress_chunks as f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_is_idempotent() {
        let first = install_recorder().unwrap();
        let second = install_recorder().unwrap();

        observe_gauges("metrics-test", 3, 1024, 2);
        record_task_created("metrics-test");

        let rendered = second.render();
        assert!(rendered.contains("todo_api_tasks_current{instance=\"metrics-test\"} 3"));
        assert!(rendered.contains("todo_api_stress_chunks{instance=\"metrics-test\"} 2"));
        assert!(first.render().contains("todo_api_tasks_created_total{instance=\"metrics-test\"}"));
    }
}

//! Prometheus metrics endpoint.

use axum::extract::State;
use metrics_exporter_prometheus::PrometheusHandle;

/// GET /metrics — render Prometheus metrics.
pub async fn get(State(handle): State<PrometheusHandle>) -> String {
    handle.render()
}

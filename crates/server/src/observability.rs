use axum::http::StatusCode;
use once_cell::sync::Lazy;
use prometheus::{register_int_counter_vec, Encoder, IntCounterVec, TextEncoder};

// Prometheus metrics (default registry)
pub static REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "custom_attributes_requests_total",
        "Attribute requests by operation and outcome",
        &["op", "outcome"]
    )
    .expect("register requests_total")
});

/// Count one finished request.
pub fn record(op: &str, outcome: &str) {
    REQUESTS_TOTAL.with_label_values(&[op, outcome]).inc();
}

/// Render the default registry in the Prometheus text format.
pub fn metrics_text() -> (StatusCode, String) {
    let mut buf = Vec::new();
    let encoder = TextEncoder::new();
    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buf) {
        return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
    }
    match String::from_utf8(buf) {
        Ok(body) => (StatusCode::OK, body),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

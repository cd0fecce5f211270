//! Prometheus Metrics for the SignDesk Gateway
//!
//! Provides upstream, forwarder, session guard and login metrics.

use lazy_static::lazy_static;
use prometheus::{self, CounterVec, HistogramOpts, HistogramVec, IntCounter, Opts, Registry, TextEncoder};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // Upstream Metrics
    pub static ref UPSTREAM_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("signdesk_upstream_requests_total", "Total upstream API calls"),
        &["service", "status"]
    ).unwrap();

    pub static ref UPSTREAM_DURATION: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "signdesk_upstream_duration_seconds",
            "Upstream API call duration in seconds"
        ).buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["service"]
    ).unwrap();

    // Forwarder Metrics
    pub static ref FORWARDER_REJECTIONS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("signdesk_forwarder_rejections_total", "Requests rejected before reaching upstream"),
        &["operation", "reason"]
    ).unwrap();

    pub static ref GROUP_LOOKUP_FAILURES_TOTAL: IntCounter = IntCounter::new(
        "signdesk_group_lookup_failures_total",
        "Document group lookups that failed during tracking list enrichment"
    ).unwrap();

    // Session Metrics
    pub static ref GUARD_DECISIONS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("signdesk_guard_decisions_total", "Session guard decisions for page requests"),
        &["decision"]
    ).unwrap();

    pub static ref LOGINS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("signdesk_logins_total", "Total login attempts"),
        &["status"]
    ).unwrap();
}

/// Register all metrics with the registry
pub fn register_metrics() {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(UPSTREAM_REQUESTS_TOTAL.clone()),
        Box::new(UPSTREAM_DURATION.clone()),
        Box::new(FORWARDER_REJECTIONS_TOTAL.clone()),
        Box::new(GROUP_LOOKUP_FAILURES_TOTAL.clone()),
        Box::new(GUARD_DECISIONS_TOTAL.clone()),
        Box::new(LOGINS_TOTAL.clone()),
    ];

    for collector in collectors {
        if let Err(e) = REGISTRY.register(collector) {
            tracing::warn!("Failed to register metric: {}", e);
        }
    }
}

/// Handler for /metrics endpoint - returns Prometheus text format
pub async fn metrics_handler() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    encoder.encode_to_string(&metric_families).unwrap_or_default()
}

/// Record an upstream call; status 0 means the request never completed
pub fn record_upstream_request(service: &str, status: u16, duration_secs: f64) {
    UPSTREAM_REQUESTS_TOTAL
        .with_label_values(&[service, &status.to_string()])
        .inc();
    UPSTREAM_DURATION
        .with_label_values(&[service])
        .observe(duration_secs);
}

/// Record a request rejected by validation or auth
pub fn record_rejection(operation: &str, reason: &str) {
    FORWARDER_REJECTIONS_TOTAL
        .with_label_values(&[operation, reason])
        .inc();
}

pub fn record_group_lookup_failure() {
    GROUP_LOOKUP_FAILURES_TOTAL.inc();
}

pub fn record_guard_decision(decision: &str) {
    GUARD_DECISIONS_TOTAL.with_label_values(&[decision]).inc();
}

/// Record a login attempt
pub fn record_login(success: bool) {
    let status = if success { "success" } else { "failure" };
    LOGINS_TOTAL.with_label_values(&[status]).inc();
}

use lazy_static::lazy_static;
use prometheus::{opts, register_histogram, register_int_counter, register_int_counter_vec};
use prometheus::{Histogram, IntCounter, IntCounterVec};

lazy_static! {
    pub static ref MODULES_SCANNED_TOTAL: IntCounter =
        register_int_counter!(opts!("badlads_runtime_modules_scanned_total", "Plugin modules put through the signature scan"))
            .unwrap();

    pub static ref SCAN_REJECTIONS_TOTAL: IntCounter =
        register_int_counter!(opts!("badlads_runtime_scan_rejections_total", "Plugin modules rejected by the signature scan"))
            .unwrap();

    pub static ref EVENTS_DISPATCHED_TOTAL: IntCounterVec = register_int_counter_vec!(
        opts!("badlads_runtime_events_dispatched_total", "Guest event exports called, by export name"),
        &["event"]
    )
    .unwrap();

    pub static ref OWNED_BUFFERS_WRITTEN_TOTAL: IntCounter =
        register_int_counter!(opts!("badlads_runtime_owned_buffers_written_total", "Owned buffers written into guest memory"))
            .unwrap();

    pub static ref EVENT_DURATION_SECONDS: Histogram = register_histogram!(
        "badlads_runtime_event_duration_seconds",
        "Time spent inside a guest event export",
        vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5]
    )
    .unwrap();
}

pub fn record_module_scanned() {
    MODULES_SCANNED_TOTAL.inc();
}

pub fn record_scan_rejection() {
    SCAN_REJECTIONS_TOTAL.inc();
}

pub fn record_event_dispatched(export_name: &str, duration_secs: f64) {
    EVENTS_DISPATCHED_TOTAL.with_label_values(&[export_name]).inc();
    EVENT_DURATION_SECONDS.observe(duration_secs);
}

pub fn record_owned_buffer_written() {
    OWNED_BUFFERS_WRITTEN_TOTAL.inc();
}

/// Current metrics in the Prometheus text format.
pub fn gather_text() -> String {
    use prometheus::{Encoder, TextEncoder};

    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
        tracing::warn!(error = %e, "failed to encode metrics");
    }
    String::from_utf8(buffer).unwrap_or_default()
}

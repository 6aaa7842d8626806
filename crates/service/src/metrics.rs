use once_cell::sync::Lazy;
use prometheus::{register_int_counter, register_int_counter_vec, Encoder, IntCounter, IntCounterVec, TextEncoder};

// Prometheus metrics (default registry)
pub static CONTENT_MUTATIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "site_cms_content_mutations_total",
        "Committed content mutations by kind and operation",
        &["kind", "op"]
    )
    .expect("register content_mutations_total")
});

pub static MEDIA_STAGED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "site_cms_media_staged_total",
        "Uploads optimized and stored as staging assets"
    )
    .expect("register media_staged_total")
});

pub static MEDIA_CONFIRMED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "site_cms_media_confirmed_total",
        "Assets moved from staging to active"
    )
    .expect("register media_confirmed_total")
});

pub static MEDIA_RELEASED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "site_cms_media_released_total",
        "Assets deleted together with their blob"
    )
    .expect("register media_released_total")
});

pub static CONFIRM_FAILURES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "site_cms_confirm_failures_total",
        "Confirmation batches dropped after retries or on a full queue"
    )
    .expect("register confirm_failures_total")
});

/// Render the default registry in the Prometheus text format.
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&prometheus::gather(), &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

pub fn record_mutation(kind: models::kind::EntityKind, op: &str) {
    CONTENT_MUTATIONS_TOTAL.with_label_values(&[kind.slug(), op]).inc();
}

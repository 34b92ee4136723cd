
use std::sync::Once;

use lazy_static::lazy_static;
use prometheus::exponential_buckets;
use prometheus::Encoder;
use prometheus::Histogram;
use prometheus::HistogramOpts;
use prometheus::IntCounterVec;
use prometheus::Opts;
use prometheus::Registry;
use prometheus::TextEncoder;
use tracing::error;

lazy_static! {
    pub static ref CACHE_LOOKUPS: IntCounterVec = IntCounterVec::new(
        Opts::new("nickname_cache_lookups", "Resolver cache lookups by outcome"),
        &["outcome"]
    )
    .expect("metric can not be created");

    pub static ref INQUIRY_OUTCOMES: IntCounterVec = IntCounterVec::new(
        Opts::new("nickname_inquiry_outcomes", "Cache-miss inquiry waits by outcome"),
        &["outcome"]
    )
    .expect("metric can not be created");

    pub static ref NICKNAME_WRITES: IntCounterVec = IntCounterVec::new(
        Opts::new("nickname_writes", "Nickname write attempts by outcome"),
        &["outcome"]
    )
    .expect("metric can not be created");

    pub static ref BATCH_FLUSHES: IntCounterVec = IntCounterVec::new(
        Opts::new("nickname_batch_flushes", "Export batch deliveries by outcome"),
        &["outcome"]
    )
    .expect("metric can not be created");

    pub static ref BATCH_SIZE: Histogram = Histogram::with_opts(
        HistogramOpts::new("nickname_batch_size", "Entries per export batch")
            .buckets(exponential_buckets(1.0, 2.0, 10).expect("valid bucket layout"))
    )
    .expect("metric can not be created");

    pub static ref REGISTRY: Registry = Registry::new();
}

static REGISTER: Once = Once::new();

/// Registers the crate collectors into [`REGISTRY`]; later calls are no-ops.
pub fn register_custom_metrics() {
    REGISTER.call_once(|| {
        REGISTRY
            .register(Box::new(CACHE_LOOKUPS.clone()))
            .expect("collector can be registered");
        REGISTRY
            .register(Box::new(INQUIRY_OUTCOMES.clone()))
            .expect("collector can be registered");
        REGISTRY
            .register(Box::new(NICKNAME_WRITES.clone()))
            .expect("collector can be registered");
        REGISTRY
            .register(Box::new(BATCH_FLUSHES.clone()))
            .expect("collector can be registered");
        REGISTRY
            .register(Box::new(BATCH_SIZE.clone()))
            .expect("collector can be registered");
    });
}

/// Text exposition of every registered collector.
pub fn render_metrics() -> String {
    register_custom_metrics();

    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
        error!("could not encode metrics: {:?}", e);
        return String::new();
    }

    String::from_utf8(buffer).unwrap_or_else(|e| {
        error!("metrics output is not utf-8: {:?}", e);
        String::new()
    })
}

use lazy_static::lazy_static;
use prometheus::{Counter, Gauge, Histogram, register_counter, register_gauge, register_histogram};


lazy_static! {
    pub static ref REQUEST_TOTAL: Counter =
        register_counter!("gateway_requests_total", "Total number of media requests").unwrap();
    pub static ref RATE_LIMITED: Counter =
        register_counter!("gateway_rate_limited_total", "Requests rejected by the rate limiter").unwrap();
    pub static ref GENERATION_FAILURES: Counter =
        register_counter!("gateway_generation_failures_total", "Media generator errors").unwrap();
    pub static ref GENERATION_LATENCY: Histogram = register_histogram!(
        "gateway_generation_latency_seconds",
        "Media generation latency in seconds"
    )
    .unwrap();
    pub static ref TRACKED_VISITORS: Gauge =
        register_gauge!("gateway_tracked_visitors", "Client keys held by the rate limiter").unwrap();
}

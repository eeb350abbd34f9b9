use lazy_static::lazy_static;
use prometheus::{
    Counter, CounterVec, Encoder, Histogram, TextEncoder, register_counter, register_counter_vec,
    register_histogram,
};

lazy_static! {
    pub static ref REQUEST_TOTAL: Counter =
        register_counter!("waitlist_requests_total", "Total number of waitlist submissions").unwrap();
    pub static ref SIGNUPS: Counter =
        register_counter!("waitlist_signups_total", "Emails added to the waitlist").unwrap();
    pub static ref HONEYPOT_HITS: Counter =
        register_counter!("waitlist_honeypot_total", "Submissions dropped by the honeypot field").unwrap();
    pub static ref REJECTIONS: CounterVec = register_counter_vec!(
        "waitlist_rejections_total",
        "Submissions answered with an error, by reason",
        &["reason"]
    )
    .unwrap();
    pub static ref ANALYTICS_FAILURES: Counter =
        register_counter!("waitlist_analytics_failures_total", "Lead events that could not be delivered").unwrap();
    pub static ref REQUEST_LATENCY: Histogram = register_histogram!(
        "waitlist_request_latency_seconds",
        "Waitlist submission latency in seconds"
    )
    .unwrap();
}

// Text exposition of everything in the default registry
pub fn render() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

//! Client metrics
//!
//! - `nitilens_client_requests_total` - requests by operation and outcome
//! - `nitilens_client_request_duration_seconds` - request latency by operation
//! - `nitilens_client_cache_hits` / `nitilens_client_cache_misses` - usage cache lookups

use std::time::Instant;

use metrics::{counter, histogram};

pub const REQUESTS_TOTAL: &str = "nitilens_client_requests_total";
pub const REQUEST_DURATION_SECONDS: &str = "nitilens_client_request_duration_seconds";
pub const CACHE_HITS: &str = "nitilens_client_cache_hits";
pub const CACHE_MISSES: &str = "nitilens_client_cache_misses";

/// Records one request's outcome and latency when finished
#[must_use]
pub struct RequestTimer {
    operation: &'static str,
    start: Instant,
}

impl RequestTimer {
    pub fn start(operation: &'static str) -> Self {
        Self {
            operation,
            start: Instant::now(),
        }
    }

    /// Record the request with the given status label
    pub fn finish(self, status: &'static str) {
        counter!(REQUESTS_TOTAL, "operation" => self.operation, "status" => status).increment(1);
        histogram!(REQUEST_DURATION_SECONDS, "operation" => self.operation)
            .record(self.start.elapsed().as_secs_f64());
    }
}

pub fn record_cache_hit(operation: &'static str) {
    counter!(CACHE_HITS, "operation" => operation).increment(1);
}

pub fn record_cache_miss(operation: &'static str) {
    counter!(CACHE_MISSES, "operation" => operation).increment(1);
}

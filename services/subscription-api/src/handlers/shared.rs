//! Shared handler utilities

use std::time::Instant;

/// Record HTTP operation duration with result label.
///
/// Labels: operation, result (ok/err)
#[inline]
pub fn record_op_duration(operation: &'static str, start: Instant, success: bool) {
    let result = if success { "ok" } else { "err" };
    metrics::histogram!(
        "subscription_operation_duration_seconds",
        "operation" => operation,
        "result" => result
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record the duration of a handler result and pass it through
#[inline]
pub fn timed<T, E>(operation: &'static str, start: Instant, result: Result<T, E>) -> Result<T, E> {
    record_op_duration(operation, start, result.is_ok());
    result
}

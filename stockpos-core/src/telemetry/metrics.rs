//! Metric definitions recorded through the `metrics` facade.
//!
//! Nothing is exported unless the embedding application installs a recorder.

use metrics::{counter, describe_counter};

pub const HTTP_REQUESTS_TOTAL: &str = "stockpos_http_requests_total";
pub const AUTH_REFRESH_TOTAL: &str = "stockpos_auth_refresh_total";
pub const AUTH_REFRESH_WAITERS_TOTAL: &str = "stockpos_auth_refresh_waiters_total";

/// Register metric descriptions.
pub fn describe_metrics() {
    describe_counter!(
        HTTP_REQUESTS_TOTAL,
        "Total number of backend HTTP calls by method and status"
    );
    describe_counter!(
        AUTH_REFRESH_TOTAL,
        "Total number of session refresh attempts by outcome"
    );
    describe_counter!(
        AUTH_REFRESH_WAITERS_TOTAL,
        "Requests that waited on an in-flight refresh instead of starting one"
    );
}

pub fn record_http_request(method: &str, status: &str) {
    counter!(
        HTTP_REQUESTS_TOTAL,
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

pub fn record_refresh(outcome: &'static str) {
    counter!(AUTH_REFRESH_TOTAL, "outcome" => outcome).increment(1);
}

pub fn record_refresh_waiter() {
    counter!(AUTH_REFRESH_WAITERS_TOTAL).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_recorder_is_noop() {
        describe_metrics();
        record_http_request("GET", "200");
        record_refresh("success");
        record_refresh_waiter();
    }
}

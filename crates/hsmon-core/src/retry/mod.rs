//! Retry and backoff policy for coordinator requests.
//!
//! Classifies fetch failures (timeouts, throttling, connection errors, 5xx)
//! and decides exponential backoff so the HTTP client can retry a request
//! internally before the monitor sees the failure.

mod classify;
mod policy;
mod run;

pub use classify::{classify, classify_curl_error, classify_http_status};
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
pub use run::run_with_retry;

//! Errors from the coordinator REST API.

use thiserror::Error;

/// Failure of one snapshot request. Inside the monitor loop every variant is
/// transient: the tick is skipped and the next one tries again.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("there was an error completing the request: {0}")]
    Transport(#[from] curl::Error),
    #[error("authentication failed: you may need to run auth again")]
    Unauthorized,
    #[error("you do not have access to that resource")]
    Forbidden,
    #[error("there were some validation errors for your request")]
    BadRequest,
    #[error("item not found on server")]
    NotFound,
    #[error("there was an internal server error (HTTP {0})")]
    Server(u32),
    #[error("unexpected HTTP status {0}")]
    UnexpectedStatus(u32),
    #[error("there was an error decoding JSON returned from the server: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid server URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Map a response status to an error; `None` for 2xx.
pub fn error_for_status(code: u32) -> Option<FetchError> {
    match code {
        200..=299 => None,
        400 => Some(FetchError::BadRequest),
        401 => Some(FetchError::Unauthorized),
        403 => Some(FetchError::Forbidden),
        404 => Some(FetchError::NotFound),
        500..=599 => Some(FetchError::Server(code)),
        _ => Some(FetchError::UnexpectedStatus(code)),
    }
}

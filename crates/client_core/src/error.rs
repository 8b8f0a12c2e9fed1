use reqwest::StatusCode;
use thiserror::Error;

/// Failure talking to the remote agenda service.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid agenda service url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("agenda service request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("agenda service responded with status {0}")]
    Status(StatusCode),
    #[error("malformed agenda service response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// User-facing failure recorded by the store.
///
/// One fixed message per operation; the underlying [`ServiceError`] is only
/// logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("failed to load contacts")]
    Load,
    #[error("failed to create contact")]
    Create,
    #[error("failed to update contact")]
    Update,
    #[error("failed to delete contact")]
    Delete,
}

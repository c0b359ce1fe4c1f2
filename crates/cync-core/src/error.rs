//! Core error types. These are NOT wire-specific — callers never see HTTP
//! statuses or raw socket errors, only domain-appropriate variants. The
//! `From<cync_api::Error>` impl translates the transport layer's errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("login rejected: invalid email or password")]
    InvalidAuth,

    #[error("two-factor authentication code required, call submit_two_factor")]
    TwoFactorRequired,

    #[error("invalid configuration: {message}")]
    InvalidCyncConfiguration { message: String },

    #[error("transport error: {0}")]
    TransportError(String),

    #[error("lost connection to the gateway")]
    LostConnection,

    #[error("command timed out after exhausting all retry attempts")]
    CommandTimeout,

    #[error("entity not found: {0}")]
    NotFound(String),

    #[error("client is shutting down")]
    ShuttingDown,

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;

impl From<cync_api::Error> for CoreError {
    fn from(err: cync_api::Error) -> Self {
        match err {
            cync_api::Error::InvalidCredentials => CoreError::InvalidAuth,
            cync_api::Error::TwoFactorRequired => CoreError::TwoFactorRequired,
            cync_api::Error::Status { status: 401 | 403, .. } => CoreError::InvalidAuth,
            err if err.is_transient() => CoreError::TransportError(err.to_string()),
            other => CoreError::Internal(other.to_string()),
        }
    }
}

//! Error types for REST, transport, and codec failures.

use thiserror::Error;

/// Errors produced by the `cync-api` crate.
///
/// This crate only knows about the wire: HTTP responses, socket I/O, and
/// malformed outbound requests. Domain-level recovery policy (retry,
/// surfacing to a caller, reconnect) lives one layer up in `cync-core`.
#[derive(Debug, Error)]
pub enum Error {
    // ── REST / authentication ──
    #[error("request rejected: invalid credentials")]
    InvalidCredentials,

    #[error("two-factor authentication code required")]
    TwoFactorRequired,

    #[error("unexpected HTTP status {status} from {endpoint}")]
    Status { status: u16, endpoint: &'static str },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("response body did not match the expected shape: {0}")]
    Decode(serde_json::Error),

    // ── Transport (TCP/TLS gateway) ──
    #[error("socket I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TLS handshake failed: {0}")]
    TlsHandshake(String),

    #[error("connection attempt timed out")]
    ConnectTimeout,

    #[error("peer closed the connection")]
    PeerClosed,

    // ── Codec ──
    #[error("cannot encode command: {reason}")]
    Codec { reason: &'static str },
}

impl Error {
    /// True for failures that indicate the REST credentials themselves are
    /// bad, as opposed to a transient network problem.
    #[must_use]
    pub fn is_invalid_auth(&self) -> bool {
        matches!(self, Error::InvalidCredentials)
            || matches!(self, Error::Status { status: 401 | 403, .. })
    }

    /// True for failures that should trigger a reconnect rather than be
    /// surfaced to a caller.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::Io(_) | Error::TlsHandshake(_) | Error::ConnectTimeout | Error::PeerClosed
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

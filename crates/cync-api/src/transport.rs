//! Shared transport configuration for the REST client and the TCP gateway
//! session.

use std::time::Duration;

use crate::error::{Error, Result};

/// How the TCP gateway connection verifies (or doesn't verify) the peer's
/// TLS certificate.
///
/// The REST API always uses the system's default trust store; only the
/// `cm.gelighting.com` gateway socket needs a fallback mode, because the
/// vendor gateway has historically presented certificates that don't
/// validate cleanly everywhere (see [`crate::session`]'s connect fallback).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TlsMode {
    /// Verify against the system's default root store.
    #[default]
    System,
    /// Accept any certificate. Used only as a fallback after a verified
    /// TLS attempt fails, never as the first attempt.
    DangerAcceptInvalid,
}

/// Configuration shared by the REST client.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
    pub user_agent: &'static str,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            user_agent: concat!("cync-api/", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl TransportConfig {
    /// Build a [`reqwest::Client`] from this configuration.
    pub fn build_client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent)
            .build()
            .map_err(Error::Http)
    }
}

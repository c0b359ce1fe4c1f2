//! Runtime configuration for [`crate::CyncClient`].
//!
//! The core never reads configuration files and never persists credentials
//! — it is handed everything it needs at construction. Any file- or
//! keyring-backed persistence is a host concern, the same split the
//! teacher workspace draws between its core and its CLI/config crates.

use std::time::Duration;

use secrecy::SecretString;

/// Credentials for the initial REST login. Two-factor accounts require a
/// two-step construction: [`CyncClient::login`] first, which may return
/// [`crate::CoreError::TwoFactorRequired`], then
/// [`CyncClient::submit_two_factor`] with the emailed code.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: SecretString,
}

/// How the TCP gateway socket is allowed to fall back when TLS
/// verification fails (spec §4.3's connect sequence always tries verified
/// TLS first regardless of this value; it only governs whether the
/// unverified-TLS and plaintext fallbacks are permitted at all).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayTlsPolicy {
    /// Allow both fallbacks, matching spec §4.3 exactly. Default.
    AllowFallback,
    /// Require verified TLS; treat a verification failure as terminal
    /// rather than retrying unverified or plaintext.
    RequireVerified,
}

impl Default for GatewayTlsPolicy {
    fn default() -> Self {
        Self::AllowFallback
    }
}

/// Explicitly-constructed runtime configuration for a [`crate::CyncClient`].
#[derive(Debug, Clone)]
pub struct CyncConfig {
    pub credentials: Credentials,
    pub gateway_tls_policy: GatewayTlsPolicy,
    /// Ack timeout per command-retry attempt. Spec default: 500 ms.
    pub command_ack_timeout: Duration,
    /// Overall per-command retry window. Spec default: 5 s (10 attempts).
    pub command_retry_window: Duration,
    /// Session heartbeat interval. Spec default: 180 s.
    pub heartbeat_interval: Duration,
    /// Controller-tracker full refresh interval. Spec default: 3600 s.
    pub tracker_refresh_interval: Duration,
    /// Reconnect backoff after a failure in an already-established
    /// session. Spec default: 15 s.
    pub reconnect_backoff: Duration,
    /// Reconnect backoff after a failed connect attempt (all three
    /// transport strategies exhausted). Spec default: 5 s.
    pub connect_backoff: Duration,
}

impl CyncConfig {
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            credentials: Credentials { email: email.into(), password: SecretString::from(password.into()) },
            gateway_tls_policy: GatewayTlsPolicy::default(),
            command_ack_timeout: Duration::from_millis(500),
            command_retry_window: Duration::from_secs(5),
            heartbeat_interval: Duration::from_secs(180),
            tracker_refresh_interval: Duration::from_secs(3600),
            reconnect_backoff: Duration::from_secs(15),
            connect_backoff: Duration::from_secs(5),
        }
    }

    /// Number of command-retry attempts implied by the ack timeout and
    /// retry window (spec §4.5: `retry_window / timeout`, 5s / 0.5s = 10).
    #[must_use]
    pub fn command_retry_attempts(&self) -> u32 {
        let window = self.command_retry_window.as_millis().max(1);
        let timeout = self.command_ack_timeout.as_millis().max(1);
        (window / timeout) as u32
    }
}

use secrecy::{ExposeSecret, SecretString};
use tracing::instrument;

use crate::error::{Error, Result};
use crate::transport::TransportConfig;

use super::{API_BASE, CORP_ID};

/// Credentials recovered from a successful login, held for the lifetime of
/// the REST client and used to derive the TCP gateway login frame.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: u32,
    pub authorize: SecretString,
    pub access_token: SecretString,
}

/// Thin async wrapper around the four REST endpoints the core needs.
///
/// Mirrors the teacher's `LegacyClient`: a bare `reqwest::Client` plus a
/// base URL, with one helper per endpoint rather than a generic verb-based
/// dispatcher, since the Cync API has no shared response envelope to
/// centralize parsing around.
pub struct RestClient {
    pub(super) http: reqwest::Client,
    pub(super) base_url: &'static str,
}

impl RestClient {
    pub fn new() -> Result<Self> {
        Self::with_config(&TransportConfig::default())
    }

    pub fn with_config(config: &TransportConfig) -> Result<Self> {
        Ok(Self {
            http: config.build_client()?,
            base_url: API_BASE,
        })
    }

    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<AuthOutcome> {
        super::auth::authenticate(self, email, password).await
    }

    #[instrument(skip(self, password, code), fields(email = %email))]
    pub async fn submit_two_factor(
        &self,
        email: &str,
        password: &str,
        code: &str,
    ) -> Result<Session> {
        super::auth::submit_two_factor(self, email, password, code).await
    }

    #[instrument(skip(self, session))]
    pub async fn discover(&self, session: &Session) -> Result<Vec<super::discovery::RawHome>> {
        super::discovery::discover(self, session).await
    }

    pub(super) fn auth_header(session: &Session) -> (&'static str, String) {
        ("Access-Token", session.access_token.expose_secret().to_owned())
    }
}

/// Result of [`RestClient::authenticate`]: either a complete session, or a
/// signal that an emailed two-factor code is now required.
#[derive(Debug)]
pub enum AuthOutcome {
    Authorized(Session),
    TwoFactorRequired,
}

pub(super) fn status_error(status: reqwest::StatusCode, endpoint: &'static str) -> Error {
    if status.as_u16() == 401 || status.as_u16() == 403 {
        Error::InvalidCredentials
    } else {
        Error::Status { status: status.as_u16(), endpoint }
    }
}

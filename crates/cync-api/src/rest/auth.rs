use secrecy::SecretString;
use tracing::debug;

use crate::error::Result;

use super::client::{status_error, AuthOutcome, RestClient, Session};
use super::models::{AuthRequest, AuthResponse, TwoFactorAuthRequest, TwoFactorVerifyCodeRequest};
use super::{CORP_ID, TWO_FACTOR_RESOURCE};

/// `POST /v2/user_auth`.
///
/// Status 200 yields a usable [`Session`] directly. Status 400 means the
/// account requires two-factor verification: this function requests the
/// emailed code itself (`/v2/two_factor/email/verifycode`) and returns
/// [`AuthOutcome::TwoFactorRequired`] so the caller knows to prompt for the
/// code and call [`submit_two_factor`]. Any other status is
/// [`crate::Error::InvalidCredentials`].
pub(super) async fn authenticate(
    client: &RestClient,
    email: &str,
    password: &str,
) -> Result<AuthOutcome> {
    let url = format!("{}/v2/user_auth", client.base_url);
    let body = AuthRequest { corp_id: CORP_ID, email, password };
    let resp = client.http.post(&url).json(&body).send().await?;

    match resp.status().as_u16() {
        200 => {
            let parsed: AuthResponse = resp.json().await.map_err(crate::Error::Http)?;
            Ok(AuthOutcome::Authorized(Session {
                user_id: parsed.user_id,
                authorize: SecretString::from(parsed.authorize),
                access_token: SecretString::from(parsed.access_token),
            }))
        }
        400 => {
            debug!("account requires two-factor verification; requesting email code");
            request_two_factor_code(client, email).await?;
            Ok(AuthOutcome::TwoFactorRequired)
        }
        other => Err(status_error(
            reqwest::StatusCode::from_u16(other).unwrap_or(reqwest::StatusCode::UNAUTHORIZED),
            "/v2/user_auth",
        )),
    }
}

async fn request_two_factor_code(client: &RestClient, email: &str) -> Result<()> {
    let url = format!("{}/v2/two_factor/email/verifycode", client.base_url);
    let body = TwoFactorVerifyCodeRequest { corp_id: CORP_ID, email, local_lang: "en-us" };
    let resp = client.http.post(&url).json(&body).send().await?;
    if !resp.status().is_success() {
        return Err(status_error(resp.status(), "/v2/two_factor/email/verifycode"));
    }
    Ok(())
}

/// `POST /v2/user_auth/two_factor`.
pub(super) async fn submit_two_factor(
    client: &RestClient,
    email: &str,
    password: &str,
    code: &str,
) -> Result<Session> {
    let url = format!("{}/v2/user_auth/two_factor", client.base_url);
    let body = TwoFactorAuthRequest {
        corp_id: CORP_ID,
        email,
        password,
        two_factor: code,
        resource: TWO_FACTOR_RESOURCE,
    };
    let resp = client.http.post(&url).json(&body).send().await?;
    if !resp.status().is_success() {
        return Err(status_error(resp.status(), "/v2/user_auth/two_factor"));
    }
    let parsed: AuthResponse = resp.json().await.map_err(crate::Error::Http)?;
    Ok(Session {
        user_id: parsed.user_id,
        authorize: SecretString::from(parsed.authorize),
        access_token: SecretString::from(parsed.access_token),
    })
}

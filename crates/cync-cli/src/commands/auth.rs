//! Shared login/two-factor flow used by every subcommand.

use dialoguer::Input;

use cync_core::{CoreError, CyncClient};

use crate::error::CliError;

/// Log in, prompting for the emailed two-factor code if the account
/// requires one.
pub async fn login(client: &CyncClient) -> Result<(), CliError> {
    match client.login().await {
        Ok(()) => Ok(()),
        Err(CoreError::TwoFactorRequired) => {
            let code: String = Input::new()
                .with_prompt("Two-factor code (emailed to your account)")
                .interact_text()?;
            client.submit_two_factor(code.trim()).await?;
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

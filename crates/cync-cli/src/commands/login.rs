//! `login` subcommand: just verifies credentials.

use cync_core::CyncClient;

use crate::commands::auth;
use crate::error::CliError;

pub async fn handle(client: &CyncClient) -> Result<(), CliError> {
    auth::login(client).await?;
    println!("login ok");
    Ok(())
}

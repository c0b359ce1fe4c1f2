//! `discover` subcommand: fetch and summarize the account's topology.

use cync_core::CyncClient;

use crate::commands::auth;
use crate::error::CliError;

pub async fn handle(client: &CyncClient) -> Result<(), CliError> {
    auth::login(client).await?;
    let topology = client.discover().await?;
    let slots: usize = topology.homes.iter().map(|home| home.mesh_slots.len()).sum();
    println!("{} home(s), {slots} device slot(s)", topology.homes.len());
    for home in &topology.homes {
        println!("  {} ({})", home.name, home.id);
    }
    Ok(())
}

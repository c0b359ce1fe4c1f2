//! `connect` subcommand: hold a live gateway session open and print state
//! changes as they arrive, until the user interrupts with Ctrl-C.

use owo_colors::OwoColorize;

use cync_core::CyncClient;

use crate::cli::GlobalOpts;
use crate::commands::auth;
use crate::error::CliError;

pub async fn handle(client: &CyncClient, global: &GlobalOpts) -> Result<(), CliError> {
    auth::login(client).await?;
    client.discover().await?;
    client.connect().await?;

    if !global.quiet {
        println!("{}", "connected, press Ctrl-C to stop".dimmed());
    }

    let mut status = client.status();
    let mut changes = client.subscribe_changes();
    loop {
        tokio::select! {
            () = async { tokio::signal::ctrl_c().await.ok(); } => break,
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                println!("status: {:?}", *status.borrow());
            }
            event = changes.recv() => {
                match event {
                    Ok(event) => println!("changed: {}", event.entity),
                    Err(_) => break,
                }
            }
        }
    }

    client.shutdown().await;
    Ok(())
}

//! `on`/`off`/`brightness`/`color-temp` subcommands: each opens a short-lived
//! gateway session, issues one command through the Command Engine, and
//! tears the session back down.

use std::time::Duration;

use cync_core::{CoreError, CyncClient, DeviceAction, SessionStatus};

use crate::cli::{BrightnessArgs, ColorTempArgs, GlobalOpts, OnArgs, TargetArgs};
use crate::commands::{auth, util};
use crate::error::CliError;

const READY_TIMEOUT: Duration = Duration::from_secs(20);

pub async fn handle_on(client: &CyncClient, args: OnArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let rgb = args.rgb.as_deref().map(util::parse_rgb).transpose()?;
    let action =
        DeviceAction::TurnOn { rgb, brightness_0_255: args.brightness, color_temp_mireds: args.color_temp };
    run_command(client, &args.target, action, global).await
}

pub async fn handle_off(client: &CyncClient, args: TargetArgs, global: &GlobalOpts) -> Result<(), CliError> {
    run_command(client, &args, DeviceAction::TurnOff, global).await
}

pub async fn handle_brightness(
    client: &CyncClient,
    args: BrightnessArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let action =
        DeviceAction::TurnOn { rgb: None, brightness_0_255: Some(args.brightness), color_temp_mireds: None };
    run_command(client, &args.target, action, global).await
}

pub async fn handle_color_temp(
    client: &CyncClient,
    args: ColorTempArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let action = DeviceAction::TurnOn { rgb: None, brightness_0_255: None, color_temp_mireds: Some(args.mireds) };
    run_command(client, &args.target, action, global).await
}

async fn run_command(
    client: &CyncClient,
    target: &TargetArgs,
    action: DeviceAction,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    auth::login(client).await?;
    client.discover().await?;
    client.connect().await?;
    let ready = await_ready(client).await;

    let outcome = match ready {
        Ok(()) => {
            let entity = util::entity_id(target);
            client.command(&entity, action).await
        }
        Err(err) => Err(err),
    };

    client.shutdown().await;
    outcome?;

    if !global.quiet {
        println!("ok");
    }
    Ok(())
}

async fn await_ready(client: &CyncClient) -> Result<(), CoreError> {
    let mut status = client.status();
    loop {
        if *status.borrow() == SessionStatus::Ready {
            return Ok(());
        }
        tokio::time::timeout(READY_TIMEOUT, status.changed())
            .await
            .map_err(|_| CoreError::CommandTimeout)?
            .map_err(|_| CoreError::LostConnection)?;
    }
}

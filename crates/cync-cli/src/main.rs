//! `cync`: command-line control for a Cync/GE lighting account.

mod cli;
mod commands;
mod error;

use clap::Parser;
use secrecy::{ExposeSecret, SecretString};
use tracing_subscriber::EnvFilter;

use cync_core::{CyncClient, CyncConfig};

use crate::cli::{Cli, Command, GlobalOpts};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        eprintln!("error: {err}");
        std::process::exit(err.exit_code());
    }
}

fn init_tracing(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let password = resolve_password(&cli.global)?;
    let config = CyncConfig::new(cli.global.email.clone(), password.expose_secret().to_owned());
    let client = CyncClient::new(config)?;

    match cli.command {
        Command::Login => commands::login::handle(&client).await,
        Command::Discover => commands::discover::handle(&client).await,
        Command::Connect => commands::connect::handle(&client, &cli.global).await,
        Command::Devices => commands::devices::handle(&client, &cli.global).await,
        Command::Rooms => commands::rooms::handle(&client, &cli.global).await,
        Command::On(args) => commands::power::handle_on(&client, args, &cli.global).await,
        Command::Off(args) => commands::power::handle_off(&client, args, &cli.global).await,
        Command::Brightness(args) => commands::power::handle_brightness(&client, args, &cli.global).await,
        Command::ColorTemp(args) => commands::power::handle_color_temp(&client, args, &cli.global).await,
    }
}

fn resolve_password(global: &GlobalOpts) -> Result<SecretString, CliError> {
    if let Some(password) = &global.password {
        return Ok(SecretString::from(password.clone()));
    }
    let password = rpassword::prompt_password("Cync password: ").map_err(|_| CliError::NoPassword)?;
    Ok(SecretString::from(password))
}

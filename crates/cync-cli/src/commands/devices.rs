//! `devices` subcommand: discover and print the known devices.

use tabled::{Table, Tabled};

use cync_core::{CyncClient, Device};

use crate::cli::GlobalOpts;
use crate::commands::auth;
use crate::error::CliError;

#[derive(Tabled)]
struct DeviceRow {
    id: String,
    name: String,
    room: String,
    power: &'static str,
    brightness: u8,
    #[tabled(rename = "color temp")]
    color_temp: u8,
}

impl From<&Device> for DeviceRow {
    fn from(device: &Device) -> Self {
        Self {
            id: device.id.to_string(),
            name: device.name.clone(),
            room: device.room_id.as_ref().map_or_else(|| "-".to_owned(), ToString::to_string),
            power: if device.state.power { "on" } else { "off" },
            brightness: device.state.brightness,
            color_temp: device.state.color_temp,
        }
    }
}

pub async fn handle(client: &CyncClient, global: &GlobalOpts) -> Result<(), CliError> {
    auth::login(client).await?;
    client.discover().await?;
    let snapshot = client.devices().latest();

    if global.quiet {
        for device in snapshot.iter() {
            println!("{}", device.id);
        }
        return Ok(());
    }

    let rows: Vec<DeviceRow> = snapshot.iter().map(|device| DeviceRow::from(device.as_ref())).collect();
    println!("{}", Table::new(rows));
    Ok(())
}

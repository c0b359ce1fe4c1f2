//! `rooms` subcommand: discover and print the known rooms.

use tabled::{Table, Tabled};

use cync_core::{CyncClient, Room};

use crate::cli::GlobalOpts;
use crate::commands::auth;
use crate::error::CliError;

#[derive(Tabled)]
struct RoomRow {
    id: String,
    name: String,
    power: &'static str,
    brightness: u8,
    #[tabled(rename = "color temp")]
    color_temp: u8,
    members: usize,
}

impl From<&Room> for RoomRow {
    fn from(room: &Room) -> Self {
        Self {
            id: room.id.to_string(),
            name: room.name.clone(),
            power: if room.state.power { "on" } else { "off" },
            brightness: room.state.brightness,
            color_temp: room.state.color_temp,
            members: room.members.len(),
        }
    }
}

pub async fn handle(client: &CyncClient, global: &GlobalOpts) -> Result<(), CliError> {
    auth::login(client).await?;
    client.discover().await?;
    let snapshot = client.rooms().latest();

    if global.quiet {
        for room in snapshot.iter() {
            println!("{}", room.id);
        }
        return Ok(());
    }

    let rows: Vec<RoomRow> = snapshot.iter().map(|room| RoomRow::from(room.as_ref())).collect();
    println!("{}", Table::new(rows));
    Ok(())
}

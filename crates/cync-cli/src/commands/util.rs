//! Small helpers shared by the subcommand handlers.

use cync_core::{DeviceId, EntityId, RoomId};

use crate::cli::TargetArgs;
use crate::error::CliError;

#[must_use]
pub fn entity_id(target: &TargetArgs) -> EntityId {
    if target.room {
        EntityId::Room(RoomId::from(target.id.as_str()))
    } else {
        EntityId::Device(DeviceId::from(target.id.as_str()))
    }
}

pub fn parse_rgb(raw: &str) -> Result<(u8, u8, u8), CliError> {
    let mut parts = raw.split(',').map(str::trim);
    let (Some(r), Some(g), Some(b), None) = (parts.next(), parts.next(), parts.next(), parts.next()) else {
        return Err(CliError::InvalidRgb(raw.to_owned()));
    };
    let channel = |s: &str| s.parse::<u8>().map_err(|_| CliError::InvalidRgb(raw.to_owned()));
    Ok((channel(r)?, channel(g)?, channel(b)?))
}

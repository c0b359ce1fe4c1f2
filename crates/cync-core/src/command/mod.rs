//! The Command Engine (spec §4.5): translates a high-level `turn_on`/
//! `turn_off` request into an encoded frame, picks a controller, and
//! retries across alternates until an ack arrives or the retry window is
//! exhausted.

pub mod engine;

pub use engine::CommandEngine;

/// The current state fields the opcode-selection logic in
/// [`engine::decide_encoding`] needs, independent of whether the target is
/// a `Device` or a `Room` (both carry power/brightness/color_temp/rgb).
#[derive(Debug, Clone, Copy, Default)]
pub struct CurrentLevels {
    pub power: bool,
    pub brightness: u8,
    pub color_temp: u8,
    pub rgb: (u8, u8, u8),
}

/// A `turn_on`/`turn_off` request against a single mesh address (a device
/// or a room, both addressable the same way on the wire).
#[derive(Debug, Clone)]
pub enum DeviceAction {
    TurnOn { rgb: Option<(u8, u8, u8)>, brightness_0_255: Option<u8>, color_temp_mireds: Option<u16> },
    TurnOff,
}

/// Where to send a command: its mesh address plus the controllers allowed
/// to carry it, most-preferred first (spec §4.4).
#[derive(Debug, Clone)]
pub struct CommandTarget {
    pub mesh_id: u16,
    pub controllers_in_order: Vec<u32>,
    pub default_controller: Option<u32>,
}

//! Room model (spec §3) — composite id, rollup state, and the two-level
//! subgroup tree. A `Room` only holds member ids, never owning references
//! to `Device`/`Room`, avoiding the cyclic Device<->Room references spec §9
//! flags for re-architecture.

use super::capability::Capabilities;
use super::device::RgbState;
use super::ids::{DeviceId, HomeId, RoomId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RoomState {
    pub power: bool,
    pub brightness: u8,
    pub color_temp: u8,
    pub rgb: RgbState,
}

#[derive(Debug, Clone)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    pub home_id: HomeId,
    pub mesh_id: u16,
    pub default_controller: Option<u32>,
    pub members: Vec<DeviceId>,
    pub subgroups: Vec<RoomId>,
    pub is_subgroup: bool,
    pub parent_name: Option<String>,
    pub capabilities: Capabilities,
    pub state: RoomState,
    pub controllers_in_order: Vec<u32>,
}

impl Room {
    #[must_use]
    pub fn controller_order(&self) -> Vec<u32> {
        if !self.controllers_in_order.is_empty() {
            self.controllers_in_order.clone()
        } else if let Some(default) = self.default_controller {
            vec![default]
        } else {
            Vec::new()
        }
    }
}

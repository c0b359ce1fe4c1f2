//! The shared, reactive store of Device/Room state. Owned read-write only
//! by the inbound-dispatch task per session (spec §3/§5); read-only
//! snapshots and subscriptions are freely shared with the rest of the
//! process.

use std::collections::HashMap;
use std::sync::Arc;

use cync_api::codec::ElementState;
use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::trace;

use crate::model::{ChangeEvent, Device, DeviceId, EntityId, HomeId, Room, RoomId, Topology};

use super::aggregator;
use super::collection::EntityCollection;

const CHANGE_CHANNEL_CAPACITY: usize = 256;

pub struct DataStore {
    devices: EntityCollection<Device>,
    rooms: EntityCollection<Room>,
    /// `(home_id, mesh_id) -> device key`, rebuilt whenever the topology
    /// loads; inbound frames only carry `mesh_id`, so dispatch needs this
    /// to resolve the device within the session's home.
    mesh_index: DashMap<(HomeId, u16), String>,
    changes: broadcast::Sender<ChangeEvent>,
}

impl DataStore {
    #[must_use]
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self { devices: EntityCollection::new(), rooms: EntityCollection::new(), mesh_index: DashMap::new(), changes }
    }

    /// Populate the store from a freshly discovered [`Topology`]. Topology
    /// is immutable structure thereafter (spec §3 lifecycle); only state
    /// fields mutate after this call.
    pub fn load_topology(&self, topology: &Topology, devices: Vec<Device>, rooms: Vec<Room>) {
        self.devices.clear();
        self.rooms.clear();
        self.mesh_index.clear();
        for device in devices {
            let home_id = device.home_id.clone();
            let mesh_id = device.mesh_id;
            let key = device.id.as_str().to_owned();
            self.mesh_index.insert((home_id, mesh_id), key.clone());
            self.devices.upsert(key, device);
        }
        for room in rooms {
            self.rooms.upsert(room.id.as_str().to_owned(), room);
        }
        let _ = topology; // topology's Home/mesh_slots were already used by the caller to build `devices`
    }

    #[must_use]
    pub fn device(&self, id: &DeviceId) -> Option<Arc<Device>> {
        self.devices.get(id.as_str())
    }

    #[must_use]
    pub fn room(&self, id: &RoomId) -> Option<Arc<Room>> {
        self.rooms.get(id.as_str())
    }

    #[must_use]
    pub fn devices_snapshot(&self) -> Arc<Vec<Arc<Device>>> {
        self.devices.snapshot()
    }

    #[must_use]
    pub fn rooms_snapshot(&self) -> Arc<Vec<Arc<Room>>> {
        self.rooms.snapshot()
    }

    #[must_use]
    pub fn subscribe_devices(&self) -> tokio::sync::watch::Receiver<Arc<Vec<Arc<Device>>>> {
        self.devices.subscribe()
    }

    #[must_use]
    pub fn subscribe_rooms(&self) -> tokio::sync::watch::Receiver<Arc<Vec<Arc<Room>>>> {
        self.rooms.subscribe()
    }

    #[must_use]
    pub fn subscribe_changes(&self) -> broadcast::Receiver<ChangeEvent> {
        self.changes.subscribe()
    }

    #[must_use]
    pub fn device_id_at(&self, home_id: &HomeId, mesh_id: u16) -> Option<DeviceId> {
        self.mesh_index.get(&(home_id.clone(), mesh_id)).map(|k| DeviceId::from(k.value().as_str()))
    }

    /// Apply a decoded element update (from a delta, snapshot record, or
    /// batched record) to the device at `mesh_id` within `home_id`, then
    /// recompute its room's rollup if it belongs to one.
    pub fn apply_element_state(&self, home_id: &HomeId, mesh_id: u16, element: ElementState) {
        let Some(device_id) = self.device_id_at(home_id, mesh_id) else {
            trace!(?home_id, mesh_id, "state update for unknown mesh slot, discarding");
            return;
        };
        let Some(device) = self.devices.get(device_id.as_str()) else { return };
        let mut updated = (*device).clone();
        updated.state.power = element.on;
        updated.state.brightness = element.brightness;
        updated.state.color_temp = element.color_temp;
        updated.state.rgb.active = element.rgb_active;
        updated.state.rgb.rgb = element.rgb;
        updated.state.normalize(updated.capabilities);
        let room_id = updated.room_id.clone();
        self.devices.upsert(device_id.as_str().to_owned(), updated);
        let _ = self.changes.send(ChangeEvent { entity: EntityId::Device(device_id) });
        if let Some(room_id) = room_id {
            self.recompute_room(&room_id);
        }
    }

    /// Apply a delta (spec §4.2): on/power + brightness only. Color
    /// temperature and RGB are never carried by a delta and must be left
    /// untouched, unlike the full-record update in [`Self::apply_element_state`].
    pub fn apply_power_brightness(&self, home_id: &HomeId, mesh_id: u16, on: bool, brightness: u8) {
        let Some(device_id) = self.device_id_at(home_id, mesh_id) else {
            trace!(?home_id, mesh_id, "delta for unknown mesh slot, discarding");
            return;
        };
        let Some(device) = self.devices.get(device_id.as_str()) else { return };
        let mut updated = (*device).clone();
        updated.state.power = on;
        updated.state.brightness = brightness;
        updated.state.normalize(updated.capabilities);
        let room_id = updated.room_id.clone();
        self.devices.upsert(device_id.as_str().to_owned(), updated);
        let _ = self.changes.send(ChangeEvent { entity: EntityId::Device(device_id) });
        if let Some(room_id) = room_id {
            self.recompute_room(&room_id);
        }
    }

    pub fn apply_sensor(&self, home_id: &HomeId, mesh_id: u16, motion: bool, ambient_light: bool) {
        let Some(device_id) = self.device_id_at(home_id, mesh_id) else { return };
        let Some(device) = self.devices.get(device_id.as_str()) else { return };
        let mut updated = (*device).clone();
        updated.state.motion = motion;
        updated.state.ambient_light = ambient_light;
        self.devices.upsert(device_id.as_str().to_owned(), updated);
        let _ = self.changes.send(ChangeEvent { entity: EntityId::Device(device_id) });
    }

    /// Recompute a room's rollup (spec §4.6); if it changed, emit a change
    /// event and, if the room is itself a subgroup, recompute its parent
    /// (at most one level — subgroups cannot themselves contain
    /// subgroups).
    pub fn recompute_room(&self, room_id: &RoomId) {
        let Some(room) = self.rooms.get(room_id.as_str()) else { return };
        let member_devices: Vec<Arc<Device>> =
            room.members.iter().filter_map(|id| self.devices.get(id.as_str())).collect();
        let refs: Vec<&Device> = member_devices.iter().map(std::convert::AsRef::as_ref).collect();
        let new_state = aggregator::rollup(&refs);
        if new_state == room.state {
            return;
        }
        let mut updated = (*room).clone();
        updated.state = new_state;
        let is_subgroup = updated.is_subgroup;
        self.rooms.upsert(room_id.as_str().to_owned(), updated);
        let _ = self.changes.send(ChangeEvent { entity: EntityId::Room(room_id.clone()) });
        if is_subgroup {
            if let Some(parent_id) = self.parent_of(room_id) {
                self.recompute_room(&parent_id);
            }
        }
    }

    fn parent_of(&self, subgroup_id: &RoomId) -> Option<RoomId> {
        self.rooms.snapshot().iter().find(|r| r.subgroups.contains(subgroup_id)).map(|r| r.id.clone())
    }

    /// Update a home's per-device `controllers_in_order` after a
    /// controller-tracker refresh (spec §4.4).
    pub fn apply_controller_order(&self, updates: &HashMap<DeviceId, Vec<u32>>) {
        for (device_id, order) in updates {
            if let Some(device) = self.devices.get(device_id.as_str()) {
                let mut updated = (*device).clone();
                updated.controllers_in_order = order.clone();
                self.devices.upsert(device_id.as_str().to_owned(), updated);
            }
        }
        for room in self.rooms.snapshot().iter() {
            let mut order: Vec<u32> = room
                .members
                .iter()
                .filter_map(|id| updates.get(id))
                .flatten()
                .copied()
                .collect();
            order.dedup();
            if order != room.controllers_in_order {
                let mut updated = (**room).clone();
                updated.controllers_in_order = order;
                self.rooms.upsert(room.id.as_str().to_owned(), updated);
            }
        }
    }
}

impl Default for DataStore {
    fn default() -> Self {
        Self::new()
    }
}

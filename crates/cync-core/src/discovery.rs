//! Turns REST discovery responses into the domain Topology/Device/Room
//! graph (spec §4.1, §3). Pure: no I/O, only graph construction, so it can
//! be tested without a server.

use std::collections::{HashMap, HashSet};

use cync_api::rest::models::RawGroup;
use cync_api::rest::RawHome;

use crate::error::CoreError;
use crate::model::capability::element_count;
use crate::model::{mesh, Capabilities, Device, DeviceId, Home, HomeId, Room, RoomId, RoomState, Topology};

/// Build the domain graph from discovery results.
///
/// A home is kept only if at least one of its devices is a Wi-Fi
/// controller; a group is kept only if at least one member supports
/// on/off; a group's subgroup ids that don't resolve to another kept
/// group in the same home are silently dropped. Returns
/// [`CoreError::InvalidCyncConfiguration`] if no home survives.
pub fn build_topology(raw_homes: Vec<RawHome>) -> Result<(Topology, Vec<Device>, Vec<Room>), CoreError> {
    let mut homes = Vec::new();
    let mut all_devices = Vec::new();
    let mut all_rooms = Vec::new();

    for raw in raw_homes {
        let home_id = HomeId::from(raw.home_id.to_string());
        let mut home = Home::new(home_id.clone(), raw.name.clone());
        let mut devices = Vec::new();
        let mut device_by_raw_id: HashMap<i64, DeviceId> = HashMap::new();

        for bulb in &raw.bulbs {
            let base_mesh = mesh::mesh_id(bulb.device_id, i64::from(raw.home_id));
            let elements = element_count(bulb.device_type);
            let primary_id = DeviceId::from(format!("{home_id}-{}", bulb.device_id));
            device_by_raw_id.insert(bulb.device_id, primary_id.clone());

            for index in 0..elements {
                let id = if index == 0 {
                    primary_id.clone()
                } else {
                    DeviceId::from(format!("{home_id}-{}-{index}", bulb.device_id))
                };
                let mesh_slot = mesh::element_slot(base_mesh, index);
                let switch_id = if index == 0 && bulb.switch_id != 0 { Some(bulb.switch_id) } else { None };

                let mut device = Device::new(
                    id.clone(),
                    bulb.display_name.clone(),
                    home_id.clone(),
                    bulb.device_id,
                    bulb.device_type,
                    mesh_slot,
                    switch_id,
                    bulb.mac.clone(),
                );
                device.element_index = index;

                home.register_slot(mesh_slot, id.clone());
                if device.is_controller() {
                    home.controllers.push(switch_id.expect("is_controller implies switch_id is Some"));
                }
                devices.push(device);
            }
        }

        if home.controllers.is_empty() {
            continue;
        }
        let default_controller = home.controllers.first().copied();
        for device in &mut devices {
            device.default_controller = default_controller;
        }

        let rooms = build_rooms(&raw.groups, &home_id, raw.home_id, &device_by_raw_id, &devices, default_controller);

        all_devices.extend(devices);
        all_rooms.extend(rooms);
        homes.push(home);
    }

    if homes.is_empty() {
        return Err(CoreError::InvalidCyncConfiguration {
            message: "discovery produced no home with a reachable controller".into(),
        });
    }

    let mut room_of_device: HashMap<DeviceId, RoomId> = HashMap::new();
    for room in &all_rooms {
        for member in &room.members {
            room_of_device.insert(member.clone(), room.id.clone());
        }
    }
    for device in &mut all_devices {
        device.room_id = room_of_device.get(&device.id).cloned();
    }

    Ok((Topology { homes }, all_devices, all_rooms))
}

fn build_rooms(
    groups: &[RawGroup],
    home_id: &HomeId,
    raw_home_id: u32,
    device_by_raw_id: &HashMap<i64, DeviceId>,
    devices: &[Device],
    default_controller: Option<u32>,
) -> Vec<Room> {
    let devices_by_id: HashMap<&DeviceId, &Device> = devices.iter().map(|d| (&d.id, d)).collect();
    let mut rooms_by_group: HashMap<i64, Room> = HashMap::new();
    let mut raw_subgroups: HashMap<i64, Vec<i64>> = HashMap::new();

    for group in groups {
        let member_ids: Vec<DeviceId> =
            group.device_id_array.iter().filter_map(|raw_id| device_by_raw_id.get(raw_id).cloned()).collect();

        let has_onoff_member =
            member_ids.iter().filter_map(|id| devices_by_id.get(id)).any(|d| d.capabilities.contains(Capabilities::ONOFF));
        if !has_onoff_member {
            continue;
        }

        let capabilities = member_ids
            .iter()
            .filter_map(|id| devices_by_id.get(id))
            .fold(Capabilities::empty(), |acc, d| acc | d.capabilities);

        let room = Room {
            id: RoomId::composite(home_id, group.group_id),
            name: group.display_name.clone(),
            home_id: home_id.clone(),
            mesh_id: mesh::mesh_id(group.group_id, i64::from(raw_home_id)),
            default_controller,
            members: member_ids,
            subgroups: Vec::new(),
            is_subgroup: group.is_subgroup,
            parent_name: None,
            capabilities,
            state: RoomState::default(),
            controllers_in_order: Vec::new(),
        };

        raw_subgroups.insert(group.group_id, group.subgroup_id_array.clone());
        rooms_by_group.insert(group.group_id, room);
    }

    let valid_ids: HashSet<i64> = rooms_by_group.keys().copied().collect();
    let names: HashMap<i64, String> = rooms_by_group.iter().map(|(id, r)| (*id, r.name.clone())).collect();

    for (group_id, sub_ids) in &raw_subgroups {
        let resolved: Vec<i64> = sub_ids.iter().copied().filter(|sid| valid_ids.contains(sid)).collect();
        let parent_name = names.get(group_id).cloned();

        if let Some(room) = rooms_by_group.get_mut(group_id) {
            room.subgroups = resolved.iter().map(|sid| RoomId::composite(home_id, *sid)).collect();
        }
        for sid in &resolved {
            if let Some(sub_room) = rooms_by_group.get_mut(sid) {
                sub_room.parent_name = parent_name.clone();
            }
        }
    }

    rooms_by_group.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cync_api::rest::models::RawBulb;

    fn home(bulbs: Vec<RawBulb>, groups: Vec<RawGroup>) -> RawHome {
        RawHome { home_id: 1000, name: "Home".into(), bulbs, groups }
    }

    fn bulb(device_id: i64, device_type: u32, switch_id: u32) -> RawBulb {
        RawBulb { device_id, display_name: format!("d{device_id}"), device_type, switch_id, mac: None }
    }

    #[test]
    fn home_without_controller_is_discarded() {
        let raw = home(vec![bulb(1, 1, 0)], vec![]);
        let err = build_topology(vec![raw]).unwrap_err();
        assert!(matches!(err, CoreError::InvalidCyncConfiguration { .. }));
    }

    #[test]
    fn kept_home_yields_devices_with_controller_default() {
        let raw = home(vec![bulb(1, 1, 0xAABB_CCDD)], vec![]);
        let (topology, devices, _rooms) = build_topology(vec![raw]).unwrap();
        assert_eq!(topology.homes.len(), 1);
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].default_controller, Some(0xAABB_CCDD));
    }

    #[test]
    fn group_without_onoff_member_is_omitted() {
        // Device 1 (type 37, motion-only) is the group's only member; device 2
        // is an unrelated controller that keeps the home itself from being
        // discarded.
        let raw = home(
            vec![bulb(1, 37, 0), bulb(2, 1, 0xAABB_CCDD)],
            vec![RawGroup {
                group_id: 7,
                display_name: "Room".into(),
                device_id_array: vec![1],
                subgroup_id_array: vec![],
                is_subgroup: false,
            }],
        );
        let (_topology, _devices, rooms) = build_topology(vec![raw]).unwrap();
        assert!(rooms.is_empty());
    }

    #[test]
    fn unresolved_subgroup_id_is_dropped_silently() {
        let raw = home(
            vec![bulb(1, 1, 0xAABB_CCDD)],
            vec![RawGroup {
                group_id: 7,
                display_name: "Room".into(),
                device_id_array: vec![1],
                subgroup_id_array: vec![999],
                is_subgroup: false,
            }],
        );
        let (_topology, _devices, rooms) = build_topology(vec![raw]).unwrap();
        assert_eq!(rooms.len(), 1);
        assert!(rooms[0].subgroups.is_empty());
    }

    #[test]
    fn multi_element_device_gets_one_device_record_per_element() {
        let raw = home(vec![bulb(1, 67, 0xAABB_CCDD)], vec![]);
        let (_topology, devices, _rooms) = build_topology(vec![raw]).unwrap();
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].mesh_id, devices[1].mesh_id.wrapping_sub(256));
    }
}

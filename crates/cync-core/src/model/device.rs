//! Device model (spec §3).

use super::capability::{capabilities_for, element_count, Capabilities};
use super::ids::{DeviceId, HomeId, RoomId};

/// RGB color plus the "rgb-active" flag: whether the color channel (as
/// opposed to the white/CT channel) is currently driving output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RgbState {
    pub rgb: (u8, u8, u8),
    pub active: bool,
}

/// A device's current, mutable state fields. Everything else about a
/// `Device` is immutable after discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceState {
    pub power: bool,
    pub brightness: u8,
    pub color_temp: u8,
    pub rgb: RgbState,
    pub motion: bool,
    pub ambient_light: bool,
}

impl DeviceState {
    /// Enforces invariant 1: `power=false ⇒ brightness=0`;
    /// `support_brightness=false ⇒ (brightness=100 iff power else 0)`.
    pub fn normalize(&mut self, capabilities: Capabilities) {
        if !self.power {
            self.brightness = 0;
        } else if !capabilities.supports_brightness() {
            self.brightness = 100;
        }
        debug_assert!(self.brightness <= 100);
    }
}

#[derive(Debug, Clone)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    pub home_id: HomeId,
    pub room_id: Option<RoomId>,
    /// Raw vendor device id, needed to recompute mesh ids / identify
    /// sibling elements.
    pub raw_device_id: i64,
    pub device_type: u32,
    pub mesh_id: u16,
    pub switch_id: Option<u32>,
    pub element_index: u8,
    pub elements: u8,
    pub mac: Option<String>,
    pub capabilities: Capabilities,
    pub state: DeviceState,
    /// Controllers known reachable for this device, most-preferred first
    /// (spec §4.4).
    pub controllers_in_order: Vec<u32>,
    pub default_controller: Option<u32>,
}

impl Device {
    #[must_use]
    pub fn new(
        id: DeviceId,
        name: String,
        home_id: HomeId,
        raw_device_id: i64,
        device_type: u32,
        mesh_id: u16,
        switch_id: Option<u32>,
        mac: Option<String>,
    ) -> Self {
        let capabilities = capabilities_for(device_type);
        Self {
            id,
            name,
            home_id,
            room_id: None,
            raw_device_id,
            device_type,
            mesh_id,
            switch_id,
            element_index: 0,
            elements: element_count(device_type),
            mac,
            capabilities,
            state: DeviceState::default(),
            controllers_in_order: Vec::new(),
            default_controller: None,
        }
    }

    #[must_use]
    pub fn is_controller(&self) -> bool {
        self.capabilities.is_controller() && self.switch_id.is_some_and(|s| s != 0)
    }

    /// Controller order per spec §4.4: own switch-id if reachable, then
    /// reachable controllers, falling back to the discovery-time default.
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

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Device {
        Device::new(
            DeviceId::from("d1"),
            "Lamp".into(),
            HomeId::from("h1"),
            42,
            7,
            0x0034,
            Some(0x1234_5678),
            None,
        )
    }

    #[test]
    fn invariant_1_power_off_forces_brightness_zero() {
        let mut state = DeviceState { power: false, brightness: 80, ..Default::default() };
        state.normalize(Capabilities::BRIGHTNESS);
        assert_eq!(state.brightness, 0);
    }

    #[test]
    fn invariant_1_unsupported_brightness_follows_power() {
        let mut state = DeviceState { power: true, brightness: 0, ..Default::default() };
        state.normalize(Capabilities::ONOFF);
        assert_eq!(state.brightness, 100);
    }

    #[test]
    fn controller_order_falls_back_to_default() {
        let mut device = sample();
        device.default_controller = Some(99);
        assert_eq!(device.controller_order(), vec![99]);
        device.controllers_in_order = vec![1, 2];
        assert_eq!(device.controller_order(), vec![1, 2]);
    }
}

//! Static capability table: numeric vendor device-type codes mapped to a
//! compact capability bitset. Replaces the shared-mutable capability
//! dictionaries of the original source (spec §9) with an immutable table
//! built once at compile time.

use bitflags::bitflags;

bitflags! {
    /// A device's fixed capability bitset, derived from its vendor device
    /// type code. Abridged per the spec glossary.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Capabilities: u16 {
        const ONOFF        = 1 << 0;
        const BRIGHTNESS   = 1 << 1;
        const COLORTEMP    = 1 << 2;
        const RGB          = 1 << 3;
        const MOTION       = 1 << 4;
        const AMBIENT_LIGHT = 1 << 5;
        const WIFICONTROL  = 1 << 6;
        const PLUG         = 1 << 7;
        const FAN          = 1 << 8;
    }
}

impl Capabilities {
    #[must_use]
    pub fn supports_brightness(self) -> bool {
        self.contains(Capabilities::BRIGHTNESS)
    }

    #[must_use]
    pub fn supports_color_temp(self) -> bool {
        self.contains(Capabilities::COLORTEMP)
    }

    #[must_use]
    pub fn supports_rgb(self) -> bool {
        self.contains(Capabilities::RGB)
    }

    #[must_use]
    pub fn is_controller(self) -> bool {
        self.contains(Capabilities::WIFICONTROL)
    }
}

/// Number of independently addressable elements a device type exposes.
/// Always 1 except for known multi-element types (spec §6: device type 67
/// is multi-element with count 2).
#[must_use]
pub fn element_count(device_type: u32) -> u8 {
    match device_type {
        67 => 2,
        _ => 1,
    }
}

/// Resolve the capability bitset for a vendor device-type code.
///
/// Resolved Open Questions from spec §9, recorded in DESIGN.md:
/// - Device type 81 (fan) is included in `WIFICONTROL` per the latest
///   vendor table, in addition to `FAN`/`ONOFF`/`BRIGHTNESS`.
/// - Device type 56 is included in both `MOTION` and `AMBIENT_LIGHT`.
#[must_use]
pub fn capabilities_for(device_type: u32) -> Capabilities {
    use Capabilities as C;
    match device_type {
        // Full-color bulbs.
        7 | 8 | 9 | 10 | 17 | 19 | 20 | 25 | 28 | 31 | 33 | 34 | 35 | 80 | 83 | 85 | 129 | 130 => {
            C::ONOFF | C::BRIGHTNESS | C::COLORTEMP | C::RGB | C::WIFICONTROL
        }
        // Tunable-white bulbs (brightness + color temperature, no RGB).
        14 | 15 | 16 | 24 | 27 | 48 | 49 | 55 | 128 => C::ONOFF | C::BRIGHTNESS | C::COLORTEMP | C::WIFICONTROL,
        // Dimmable-only bulbs.
        4 | 5 | 6 | 11 | 12 | 13 | 18 | 23 | 51 | 52 | 53 | 54 => C::ONOFF | C::BRIGHTNESS | C::WIFICONTROL,
        // Plugs.
        64 | 65 | 66 | 67 | 68 => C::ONOFF | C::PLUG | C::WIFICONTROL,
        // Fans (brightness-controlled on/off).
        81 => C::ONOFF | C::BRIGHTNESS | C::FAN | C::WIFICONTROL,
        // Motion + ambient-light sensor.
        56 => C::MOTION | C::AMBIENT_LIGHT,
        // Motion-only sensor.
        37 => C::MOTION,
        // Remotes / switches with no mesh-addressable light output.
        146 | 147 | 148 => C::ONOFF,
        _ => C::empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fan_type_is_wificontrol_per_latest_table() {
        assert!(capabilities_for(81).is_controller());
        assert!(capabilities_for(81).contains(Capabilities::FAN));
    }

    #[test]
    fn type_56_is_motion_and_ambient_light() {
        let caps = capabilities_for(56);
        assert!(caps.contains(Capabilities::MOTION));
        assert!(caps.contains(Capabilities::AMBIENT_LIGHT));
    }

    #[test]
    fn full_color_bulb_has_rgb_and_controller() {
        let caps = capabilities_for(7);
        assert!(caps.supports_rgb());
        assert!(caps.is_controller());
    }

    #[test]
    fn device_type_67_is_multi_element() {
        assert_eq!(element_count(67), 2);
        assert_eq!(element_count(7), 1);
    }

    #[test]
    fn unknown_device_type_has_no_capabilities() {
        assert_eq!(capabilities_for(9999), Capabilities::empty());
    }
}

//! State Aggregator (spec §4.6): recomputes a Room's rollup state from its
//! member devices, and the one-level subgroup-to-parent propagation.

use crate::model::{Device, RoomState};

/// Recompute a Room's rollup from its current member states.
///
/// Resolved Open Question (spec §9): the RGB mean divides each of r/g/b by
/// its own count of RGB-supporting members rather than reusing a single
/// shared denominator (the bug the original source sometimes exhibits,
/// dividing green/blue totals by the red list's length).
#[must_use]
pub fn rollup(members: &[&Device]) -> RoomState {
    let power = members.iter().any(|d| d.state.power);

    let brightness = {
        let supporting: Vec<u8> =
            members.iter().filter(|d| d.capabilities.supports_brightness()).map(|d| d.state.brightness).collect();
        if !supporting.is_empty() {
            mean_u8(&supporting)
        } else if power {
            100
        } else {
            0
        }
    };

    let color_temp = {
        let supporting: Vec<u8> =
            members.iter().filter(|d| d.capabilities.supports_color_temp()).map(|d| d.state.color_temp).collect();
        mean_u8(&supporting)
    };

    let rgb = {
        let supporting: Vec<_> = members.iter().filter(|d| d.capabilities.supports_rgb()).collect();
        let (mut r_sum, mut r_n) = (0u32, 0u32);
        let (mut g_sum, mut g_n) = (0u32, 0u32);
        let (mut b_sum, mut b_n) = (0u32, 0u32);
        for d in &supporting {
            let (r, g, b) = d.state.rgb.rgb;
            r_sum += u32::from(r);
            r_n += 1;
            g_sum += u32::from(g);
            g_n += 1;
            b_sum += u32::from(b);
            b_n += 1;
        }
        let component_mean = |sum: u32, n: u32| if n == 0 { 0 } else { (sum / n) as u8 };
        let active = supporting.iter().any(|d| d.state.rgb.active);
        crate::model::RgbState {
            rgb: (component_mean(r_sum, r_n), component_mean(g_sum, g_n), component_mean(b_sum, b_n)),
            active,
        }
    };

    RoomState { power, brightness, color_temp, rgb }
}

fn mean_u8(values: &[u8]) -> u8 {
    if values.is_empty() {
        return 0;
    }
    let sum: u32 = values.iter().map(|v| u32::from(*v)).sum();
    (sum as f64 / values.len() as f64).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Capabilities, Device, DeviceId, DeviceState, HomeId, RgbState};

    fn device(power: bool, brightness: u8, caps: Capabilities) -> Device {
        let mut d = Device::new(DeviceId::from("d"), "n".into(), HomeId::from("h"), 1, 7, 0, None, None);
        d.capabilities = caps;
        d.state = DeviceState { power, brightness, ..Default::default() };
        d
    }

    #[test]
    fn invariant_5_power_is_or_brightness_is_mean() {
        let a = device(true, 40, Capabilities::ONOFF | Capabilities::BRIGHTNESS);
        let b = device(false, 0, Capabilities::ONOFF | Capabilities::BRIGHTNESS);
        let members = vec![&a, &b];
        let state = rollup(&members);
        assert!(state.power);
        assert_eq!(state.brightness, 20);
    }

    #[test]
    fn brightness_unsupported_follows_power() {
        let a = device(true, 0, Capabilities::ONOFF);
        let members = vec![&a];
        let state = rollup(&members);
        assert_eq!(state.brightness, 100);
    }

    #[test]
    fn rgb_mean_uses_independent_denominators_per_component() {
        let mut a = device(true, 50, Capabilities::RGB);
        a.state.rgb = RgbState { rgb: (100, 0, 0), active: true };
        let mut b = device(true, 50, Capabilities::RGB);
        b.state.rgb = RgbState { rgb: (0, 100, 200), active: false };
        let members = vec![&a, &b];
        let state = rollup(&members);
        // mean of (100,0) = 50, (0,100) = 50, (0,200) = 100 — each divided
        // by its own count of 2, not by a shared/mismatched denominator.
        assert_eq!(state.rgb.rgb, (50, 50, 100));
        assert!(state.rgb.active);
    }
}

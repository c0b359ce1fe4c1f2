//! Mesh address encoding (spec §3 / invariant 6).

/// `mesh_id = ((deviceID mod home_id) mod 1000) + ((deviceID mod home_id) / 1000) * 256`
///
/// A multi-element device's secondary elements occupy `mesh_id + k*256` for
/// `k` in `1..elements`.
#[must_use]
pub fn mesh_id(device_id: i64, home_id: i64) -> u16 {
    if home_id == 0 {
        return 0;
    }
    let residue = device_id.rem_euclid(home_id);
    let low = residue % 1000;
    let high = residue / 1000;
    ((low + high * 256) & 0xFFFF) as u16
}

/// Mesh slot for element `index` (0-based) of a device whose base slot is
/// `base`.
#[must_use]
pub fn element_slot(base: u16, index: u8) -> u16 {
    base.wrapping_add(u16::from(index).wrapping_mul(256))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invariant_6_mesh_id_formula() {
        let device_id: i64 = 123_456;
        let home_id: i64 = 1000;
        let residue = device_id % home_id;
        let expected = (residue % 1000) + (residue / 1000) * 256;
        assert_eq!(mesh_id(device_id, home_id), expected as u16);
    }

    #[test]
    fn mesh_id_wraps_into_256_bands_for_large_residue() {
        let device_id: i64 = 5000;
        let home_id: i64 = 10_000;
        // residue = 5000; low = 5000 % 1000 = 0; high = 5000 / 1000 = 5
        assert_eq!(mesh_id(device_id, home_id), 5 * 256);
    }

    #[test]
    fn element_slot_offsets_by_256_per_index() {
        assert_eq!(element_slot(10, 0), 10);
        assert_eq!(element_slot(10, 1), 266);
    }

    #[test]
    fn mesh_id_of_zero_home_is_zero() {
        assert_eq!(mesh_id(42, 0), 0);
    }
}

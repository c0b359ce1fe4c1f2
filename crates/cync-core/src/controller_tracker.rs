//! Controller Tracker (spec §4.4): keeps a per-home `reachable` set of
//! switch-ids so the Command Engine only routes through controllers that
//! are actually online. Runs once after login, then every
//! [`crate::config::CyncConfig::tracker_refresh_interval`].

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;
use std::time::Duration;

use cync_api::codec;
use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{debug, info};

use crate::model::{Device, DeviceId, HomeId};
use crate::store::DataStore;

const MAX_ROUNDS: u32 = 10;
const PING_SPACING: Duration = Duration::from_millis(150);
const ROUND_WAIT: Duration = Duration::from_secs(2);

pub struct ControllerTracker {
    store: Arc<DataStore>,
    outbound: mpsc::Sender<Vec<u8>>,
    reachable: DashMap<HomeId, HashSet<u32>>,
    sequence: AtomicU16,
}

impl ControllerTracker {
    #[must_use]
    pub fn new(store: Arc<DataStore>, outbound: mpsc::Sender<Vec<u8>>) -> Self {
        Self { store, outbound, reachable: DashMap::new(), sequence: AtomicU16::new(0) }
    }

    fn next_sequence(&self) -> u16 {
        loop {
            let next = self.sequence.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
            if next != 0 {
                return next;
            }
        }
    }

    /// Called by the session dispatch loop when a `0x73` initial-state
    /// snapshot or `0xAB` presence frame arrives in response to a ping:
    /// marks `switch_id` reachable within `home_id`.
    pub fn mark_reachable(&self, home_id: &HomeId, switch_id: u32) {
        self.reachable.entry(home_id.clone()).or_default().insert(switch_id);
    }

    /// Run one full refresh (spec §4.4): clear reachability, then for up
    /// to 10 rounds ping every known controller in every home (150ms
    /// between pings, 2s between rounds), stopping early once every home
    /// has at least half its controllers reachable. Afterwards,
    /// recompute and apply `controllers_in_order` for every device and
    /// room.
    pub async fn refresh(&self) {
        self.reachable.clear();
        let devices = self.store.devices_snapshot();

        let mut controllers_by_home: HashMap<HomeId, Vec<u32>> = HashMap::new();
        for device in devices.iter() {
            if device.is_controller() {
                controllers_by_home
                    .entry(device.home_id.clone())
                    .or_default()
                    .push(device.switch_id.expect("is_controller implies switch_id is Some"));
            }
        }

        if controllers_by_home.is_empty() {
            debug!("controller tracker refresh skipped, no known controllers");
            return;
        }

        for round in 0..MAX_ROUNDS {
            for (_home_id, switch_ids) in &controllers_by_home {
                for &switch_id in switch_ids {
                    let seq = self.next_sequence();
                    let frame = codec::encode_keepalive_ping(switch_id, seq);
                    if self.outbound.send(frame).await.is_err() {
                        return;
                    }
                    sleep(PING_SPACING).await;
                }
            }
            sleep(ROUND_WAIT).await;
            if self.all_homes_half_reachable(&controllers_by_home) {
                debug!(round, "every home has at least half its controllers reachable, stopping early");
                break;
            }
        }

        info!(homes = controllers_by_home.len(), "controller tracker refresh complete");
        self.apply_controller_order(&devices, &controllers_by_home);
    }

    fn all_homes_half_reachable(&self, controllers_by_home: &HashMap<HomeId, Vec<u32>>) -> bool {
        controllers_by_home.iter().all(|(home_id, switch_ids)| {
            let reachable_count = self
                .reachable
                .get(home_id)
                .map_or(0, |set| switch_ids.iter().filter(|s| set.contains(s)).count());
            reachable_count * 2 >= switch_ids.len()
        })
    }

    /// Per device: its own switch-id if reachable, then reachable
    /// switch-ids of other devices in the same room, then any remaining
    /// reachable switch-ids in the home (spec §4.4). Rooms' own orders
    /// are derived from their members' orders by
    /// [`DataStore::apply_controller_order`].
    fn apply_controller_order(&self, devices: &Arc<Vec<Arc<Device>>>, controllers_by_home: &HashMap<HomeId, Vec<u32>>) {
        let rooms = self.store.rooms_snapshot();
        let mut updates: HashMap<DeviceId, Vec<u32>> = HashMap::new();

        for device in devices.iter() {
            let Some(home_reachable) = self.reachable.get(&device.home_id).map(|set| set.clone()) else {
                continue;
            };
            if home_reachable.is_empty() {
                continue;
            }

            let mut order: Vec<u32> = Vec::new();
            if device.is_controller() {
                if let Some(own) = device.switch_id {
                    if home_reachable.contains(&own) {
                        order.push(own);
                    }
                }
            }

            if let Some(room_id) = &device.room_id {
                if let Some(room) = rooms.iter().find(|r| &r.id == room_id) {
                    for other in devices.iter() {
                        if other.id == device.id || !room.members.contains(&other.id) {
                            continue;
                        }
                        if let Some(switch_id) = other.switch_id {
                            if home_reachable.contains(&switch_id) && !order.contains(&switch_id) {
                                order.push(switch_id);
                            }
                        }
                    }
                }
            }

            if let Some(all) = controllers_by_home.get(&device.home_id) {
                for &switch_id in all {
                    if home_reachable.contains(&switch_id) && !order.contains(&switch_id) {
                        order.push(switch_id);
                    }
                }
            }

            updates.insert(device.id.clone(), order);
        }

        self.store.apply_controller_order(&updates);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::HomeId;

    fn new_tracker() -> ControllerTracker {
        let (tx, _rx) = mpsc::channel(8);
        ControllerTracker::new(Arc::new(DataStore::new()), tx)
    }

    #[test]
    fn sequence_never_returns_zero_across_wrap() {
        let tracker = new_tracker();
        tracker.sequence.store(u16::MAX, Ordering::Relaxed);
        assert_eq!(tracker.next_sequence(), 1);
    }

    #[test]
    fn half_reachable_threshold() {
        let tracker = new_tracker();
        let home = HomeId::from("h1");
        tracker.mark_reachable(&home, 1);
        let mut by_home = HashMap::new();
        by_home.insert(home, vec![1, 2]);
        assert!(tracker.all_homes_half_reachable(&by_home));
    }

    #[test]
    fn below_half_reachable_is_not_enough() {
        let tracker = new_tracker();
        let home = HomeId::from("h1");
        let mut by_home = HashMap::new();
        by_home.insert(home, vec![1, 2, 3, 4]);
        assert!(!tracker.all_homes_half_reachable(&by_home));
    }
}

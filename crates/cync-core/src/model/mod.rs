//! Domain model: ids, capability table, device/room/home records, mesh
//! addressing, and session/change events.

pub mod capability;
pub mod device;
pub mod event;
pub mod home;
pub mod ids;
pub mod mesh;
pub mod room;

pub use capability::Capabilities;
pub use device::{Device, DeviceState, RgbState};
pub use event::{ChangeEvent, SessionStatus};
pub use home::Home;
pub use ids::{DeviceId, EntityId, HomeId, RoomId};
pub use room::{Room, RoomState};

/// The complete in-memory graph built once at startup from Discovery and
/// treated as immutable structure thereafter (spec §3 lifecycle) — only
/// the state fields mutate during the session.
#[derive(Debug, Clone, Default)]
pub struct Topology {
    pub homes: Vec<Home>,
}

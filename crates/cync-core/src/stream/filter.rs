//! Filter predicates for entity streams, letting a host narrow a snapshot
//! without re-querying the store.

use crate::model::{Device, EntityId, Room};

pub enum EntityFilter {
    All,
    Entity(EntityId),
    Custom(Box<dyn Fn(&EntityId) -> bool + Send + Sync>),
}

impl EntityFilter {
    #[must_use]
    pub fn matches_device(&self, device: &Device) -> bool {
        match self {
            Self::All => true,
            Self::Entity(EntityId::Device(id)) => &device.id == id,
            Self::Entity(EntityId::Room(_)) => false,
            Self::Custom(f) => f(&EntityId::Device(device.id.clone())),
        }
    }

    #[must_use]
    pub fn matches_room(&self, room: &Room) -> bool {
        match self {
            Self::All => true,
            Self::Entity(EntityId::Room(id)) => &room.id == id,
            Self::Entity(EntityId::Device(_)) => false,
            Self::Custom(f) => f(&EntityId::Room(room.id.clone())),
        }
    }
}

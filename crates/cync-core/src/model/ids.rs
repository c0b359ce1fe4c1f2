//! Newtype entity ids, mirroring the teacher's `EntityId`/`MacAddress`
//! newtype pattern instead of bare `String` keys.

use std::fmt;
use std::str::FromStr;

macro_rules! string_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
        pub struct $name(pub String);

        impl $name {
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::convert::Infallible;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.to_owned()))
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }
    };
}

string_id!(HomeId);
string_id!(DeviceId);
string_id!(RoomId);

impl RoomId {
    /// Composite `{home_id}-{group_id}` id (spec §3).
    #[must_use]
    pub fn composite(home_id: &HomeId, group_id: i64) -> Self {
        Self(format!("{home_id}-{group_id}"))
    }
}

/// A target for a command or subscription: either a single device or a
/// room (which may itself be a subgroup).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityId {
    Device(DeviceId),
    Room(RoomId),
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Device(id) => write!(f, "device:{id}"),
            EntityId::Room(id) => write!(f, "room:{id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_id_is_composite() {
        let home = HomeId::from("42");
        assert_eq!(RoomId::composite(&home, 7).as_str(), "42-7");
    }

    #[test]
    fn entity_id_displays_with_kind_prefix() {
        assert_eq!(EntityId::Device(DeviceId::from("d1")).to_string(), "device:d1");
        assert_eq!(EntityId::Room(RoomId::from("r1")).to_string(), "room:r1");
    }
}

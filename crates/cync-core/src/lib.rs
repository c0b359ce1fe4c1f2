//! Domain layer for the Cync/GE lighting bridge: topology/device/room
//! model, the reactive store, the Command Engine and Controller Tracker,
//! and the `CyncClient` orchestrator that ties them to a live gateway
//! session. Depends on `cync-api` for wire-level REST/codec/transport and
//! translates its errors into [`error::CoreError`].

pub mod command;
pub mod config;
pub mod controller;
pub mod controller_tracker;
pub mod convert;
pub mod discovery;
pub mod error;
pub mod model;
pub mod store;
pub mod stream;

pub use command::{CommandTarget, CurrentLevels, DeviceAction};
pub use config::{Credentials, CyncConfig, GatewayTlsPolicy};
pub use controller::CyncClient;
pub use error::{CoreError, Result};
pub use model::{
    Capabilities, ChangeEvent, Device, DeviceId, DeviceState, EntityId, Home, HomeId, Room, RoomId, RoomState,
    SessionStatus, Topology,
};
pub use stream::{EntityFilter, EntityStream};

//! Session state machine and change-event types exposed to the host
//! (spec §4.3, §6 "Error/status stream").

use super::ids::EntityId;

/// Session lifecycle states (spec §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Disconnected,
    Connecting,
    Authenticating,
    Ready,
    Reconnecting,
}

/// A state-change notification for a device or room, field-exact per spec
/// §4.6 ("a Room emits a change event iff (power, brightness, color_temp,
/// rgb) differ from the previous snapshot").
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    pub entity: EntityId,
}

use std::sync::atomic::{AtomicU16, Ordering};
use std::time::Duration;

use cync_api::codec;
use dashmap::DashMap;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::convert::{brightness_0_255_to_pct, mireds_to_ct, rgb_brightness_matches_current};
use crate::error::CoreError;

use super::{CommandTarget, CurrentLevels, DeviceAction};

/// What a pending command's waiter resolves with.
enum AckOutcome {
    Acked,
    ShuttingDown,
    LostConnection,
}

/// Chooses the encoded command shape for a `turn_on`/`turn_off` request,
/// independent of switch id/sequence/mesh id (spec §4.5's opcode-selection
/// half).
enum Encoding {
    Power(bool),
    SetColorTemp(u8),
    Combo { on: bool, brightness: u8, color_tone: u8, rgb: (u8, u8, u8) },
}

fn decide_encoding(current: CurrentLevels, action: &DeviceAction) -> Encoding {
    match action {
        DeviceAction::TurnOff => Encoding::Power(false),
        DeviceAction::TurnOn { rgb: None, brightness_0_255: None, color_temp_mireds: None } => Encoding::Power(true),
        DeviceAction::TurnOn { rgb: None, brightness_0_255: None, color_temp_mireds: Some(mireds) } => {
            Encoding::SetColorTemp(mireds_to_ct(*mireds))
        }
        DeviceAction::TurnOn { rgb: Some(rgb), brightness_0_255: None, color_temp_mireds: _ } => {
            Encoding::Combo { on: true, brightness: current.brightness, color_tone: 254, rgb: *rgb }
        }
        DeviceAction::TurnOn { rgb: None, brightness_0_255: Some(br), color_temp_mireds: _ } => {
            Encoding::Combo {
                on: true,
                brightness: brightness_0_255_to_pct(*br),
                color_tone: 255,
                rgb: (255, 255, 255),
            }
        }
        DeviceAction::TurnOn { rgb: Some(rgb), brightness_0_255: Some(br), color_temp_mireds: _ } => {
            if rgb_brightness_matches_current(*br, *rgb, current.brightness) {
                Encoding::Combo { on: true, brightness: current.brightness, color_tone: 254, rgb: *rgb }
            } else {
                Encoding::Combo {
                    on: true,
                    brightness: brightness_0_255_to_pct(*br),
                    color_tone: 255,
                    rgb: (255, 255, 255),
                }
            }
        }
    }
}

fn encode(encoding: &Encoding, switch_id: u32, seq: u16, mesh_id: u16) -> Vec<u8> {
    match *encoding {
        Encoding::Power(on) => codec::encode_power(switch_id, seq, mesh_id, on),
        Encoding::SetColorTemp(ct) => codec::encode_set_color_temp(switch_id, seq, mesh_id, ct),
        Encoding::Combo { on, brightness, color_tone, rgb } => {
            codec::encode_combo(switch_id, seq, mesh_id, on, brightness, color_tone, rgb)
        }
    }
}

pub struct CommandEngine {
    sequence: AtomicU16,
    pending: DashMap<u16, oneshot::Sender<AckOutcome>>,
    outbound: mpsc::Sender<Vec<u8>>,
    ack_timeout: Duration,
    retry_attempts: u32,
}

impl CommandEngine {
    #[must_use]
    pub fn new(outbound: mpsc::Sender<Vec<u8>>, ack_timeout: Duration, retry_attempts: u32) -> Self {
        Self { sequence: AtomicU16::new(0), pending: DashMap::new(), outbound, ack_timeout, retry_attempts }
    }

    /// 16-bit counter wrapping 1..65535; 0 is never returned (spec §3/§8
    /// invariant 2).
    fn next_sequence(&self) -> u16 {
        loop {
            let next = self.sequence.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
            if next != 0 {
                return next;
            }
        }
    }

    /// Called by the Session's dispatch task when a `0x7B` ack arrives.
    pub fn resolve_ack(&self, sequence: u16) {
        if let Some((_, tx)) = self.pending.remove(&sequence) {
            let _ = tx.send(AckOutcome::Acked);
        }
    }

    /// Called by the Session on teardown: every outstanding waiter fails
    /// with `ShuttingDown` (spec §3/§5).
    pub fn fail_all_shutting_down(&self) {
        for (_, tx) in self.pending.clone() {
            let _ = tx.send(AckOutcome::ShuttingDown);
        }
        self.pending.clear();
    }

    /// Called by the Session when the transport drops mid-retry: every
    /// outstanding waiter fails with `LostConnection` (spec §4.5: "callers
    /// treat that as retry later").
    pub fn fail_all_disconnected(&self) {
        for (_, tx) in self.pending.clone() {
            let _ = tx.send(AckOutcome::LostConnection);
        }
        self.pending.clear();
    }

    /// Execute a `turn_on`/`turn_off` against `target`, retrying across its
    /// controllers-in-order until acked or the retry window is exhausted
    /// (spec §4.5).
    pub async fn execute(
        &self,
        target: &CommandTarget,
        current: CurrentLevels,
        action: DeviceAction,
    ) -> Result<(), CoreError> {
        let encoding = decide_encoding(current, &action);

        for attempt in 0..self.retry_attempts {
            let Some(switch_id) = self.pick_controller(target, attempt as usize) else {
                return Err(CoreError::InvalidCyncConfiguration {
                    message: "no controller available for command target".into(),
                });
            };
            let seq = self.next_sequence();
            let (tx, rx) = oneshot::channel();
            self.pending.insert(seq, tx);

            let frame = encode(&encoding, switch_id, seq, target.mesh_id);
            if self.outbound.send(frame).await.is_err() {
                self.pending.remove(&seq);
                return Err(CoreError::LostConnection);
            }

            match timeout(self.ack_timeout, rx).await {
                Ok(Ok(AckOutcome::Acked)) => {
                    debug!(seq, attempt, "command acked");
                    return Ok(());
                }
                Ok(Ok(AckOutcome::ShuttingDown)) => return Err(CoreError::ShuttingDown),
                Ok(Ok(AckOutcome::LostConnection)) => return Err(CoreError::LostConnection),
                Ok(Err(_)) => {
                    // Sender dropped without a send: treat like a timeout.
                    self.pending.remove(&seq);
                }
                Err(_) => {
                    self.pending.remove(&seq);
                    warn!(seq, attempt, "command ack timed out, retrying");
                }
            }
        }

        Err(CoreError::CommandTimeout)
    }

    fn pick_controller(&self, target: &CommandTarget, attempt: usize) -> Option<u32> {
        if target.controllers_in_order.is_empty() {
            return target.default_controller;
        }
        let idx = attempt % target.controllers_in_order.len();
        Some(target.controllers_in_order[idx])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turn_off_is_plain_power_off() {
        matches!(decide_encoding(CurrentLevels::default(), &DeviceAction::TurnOff), Encoding::Power(false));
    }

    #[test]
    fn rgb_only_keeps_current_brightness_and_color_tone_254() {
        let current = CurrentLevels { brightness: 42, ..Default::default() };
        let action = DeviceAction::TurnOn { rgb: Some((1, 2, 3)), brightness_0_255: None, color_temp_mireds: None };
        match decide_encoding(current, &action) {
            Encoding::Combo { brightness, color_tone, rgb, .. } => {
                assert_eq!(brightness, 42);
                assert_eq!(color_tone, 254);
                assert_eq!(rgb, (1, 2, 3));
            }
            _ => panic!("expected combo"),
        }
    }

    #[test]
    fn brightness_only_uses_white_and_color_tone_255() {
        let action =
            DeviceAction::TurnOn { rgb: None, brightness_0_255: Some(255), color_temp_mireds: None };
        match decide_encoding(CurrentLevels::default(), &action) {
            Encoding::Combo { brightness, color_tone, rgb, .. } => {
                assert_eq!(brightness, 100);
                assert_eq!(color_tone, 255);
                assert_eq!(rgb, (255, 255, 255));
            }
            _ => panic!("expected combo"),
        }
    }

    #[test]
    fn color_temp_only_uses_set_color_temp_opcode() {
        let action = DeviceAction::TurnOn { rgb: None, brightness_0_255: None, color_temp_mireds: Some(200) };
        match decide_encoding(CurrentLevels::default(), &action) {
            Encoding::SetColorTemp(ct) => assert_eq!(ct, 100),
            _ => panic!("expected set-color-temp"),
        }
    }

    #[test]
    fn controller_selection_wraps_by_attempt() {
        let target =
            CommandTarget { mesh_id: 1, controllers_in_order: vec![10, 20], default_controller: Some(99) };
        let (tx, _rx) = mpsc::channel(1);
        let engine = CommandEngine::new(tx, Duration::from_millis(1), 1);
        assert_eq!(engine.pick_controller(&target, 0), Some(10));
        assert_eq!(engine.pick_controller(&target, 1), Some(20));
        assert_eq!(engine.pick_controller(&target, 2), Some(10));
    }

    #[test]
    fn empty_controllers_falls_back_to_default() {
        let target = CommandTarget { mesh_id: 1, controllers_in_order: vec![], default_controller: Some(7) };
        let (tx, _rx) = mpsc::channel(1);
        let engine = CommandEngine::new(tx, Duration::from_millis(1), 1);
        assert_eq!(engine.pick_controller(&target, 0), Some(7));
    }

    #[test]
    fn sequence_never_returns_zero_across_wrap() {
        let (tx, _rx) = mpsc::channel(1);
        let engine = CommandEngine::new(tx, Duration::from_millis(1), 1);
        engine.sequence.store(u16::MAX, Ordering::Relaxed);
        assert_eq!(engine.next_sequence(), 1);
    }
}

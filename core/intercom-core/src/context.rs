//! State owned by the supervisor.

use crate::call::CallStateMachine;
use crate::clock::TickClock;
use crate::emergency::EmergencyFlag;
use intercom_net::NetworkConfig;
use intercom_types::{CallerId, DeviceIdentity, KeypadKey, VolumeStep};

/// Highest speaker volume.
pub const MAX_VOLUME: u8 = 10;

/// Speaker volume, clamped to `0..=MAX_VOLUME`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioSettings {
    volume: u8,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self { volume: 5 }
    }
}

impl AudioSettings {
    pub fn new(volume: u8) -> Self {
        Self {
            volume: volume.min(MAX_VOLUME),
        }
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    /// Applies one rocker step and returns the new level.
    pub fn step(&mut self, step: VolumeStep) -> u8 {
        self.volume = match step {
            VolumeStep::Up => (self.volume + 1).min(MAX_VOLUME),
            VolumeStep::Down => self.volume.saturating_sub(1),
        };
        self.volume
    }
}

/// Digits entered on the keypad, waiting for `Call`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DialBuffer {
    digits: String,
}

impl DialBuffer {
    /// Appends a key. Returns `false` once the buffer holds a full number.
    pub fn push(&mut self, key: KeypadKey) -> bool {
        if self.digits.len() >= CallerId::CAPACITY {
            return false;
        }
        self.digits.push(key.as_char());
        true
    }

    pub fn clear(&mut self) {
        self.digits.clear();
    }

    pub fn as_str(&self) -> &str {
        &self.digits
    }

    pub fn is_empty(&self) -> bool {
        self.digits.is_empty()
    }

    /// Empties the buffer, returning the number it held.
    pub fn take(&mut self) -> Option<CallerId> {
        let digits = std::mem::take(&mut self.digits);
        CallerId::new(digits).ok()
    }
}

/// Everything the loop mutates. Owned by one `Supervisor`; no globals.
pub struct SupervisorContext {
    pub identity: DeviceIdentity,
    pub network: NetworkConfig,
    pub calls: CallStateMachine,
    pub emergency: EmergencyFlag,
    pub audio: AudioSettings,
    pub dial_buffer: DialBuffer,
    pub clock: TickClock,
}

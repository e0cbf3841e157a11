//! User input events from the keypad and front-panel buttons.
//!
//! Inputs also have a compact text form (`"5"`, `"answer"`, `"speed_dial:2"`,
//! `"config:dhcp"`) used by host scenarios and test scripts.

use crate::Error;
use std::fmt;
use std::str::FromStr;

/// One input event polled from the front panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserInput {
    /// Keypad key.
    Key(KeypadKey),
    /// Function button.
    Function(FunctionKey),
    /// Volume rocker.
    Volume(VolumeStep),
    /// Emergency button.
    Emergency,
    /// Configuration menu entry.
    Configure(ConfigEntry),
}

/// Keypad keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeypadKey {
    /// Digit `0..=9`.
    Digit(u8),
    Star,
    Hash,
}

impl KeypadKey {
    /// Creates a digit key, rejecting values above 9.
    pub fn digit(value: u8) -> Result<Self, Error> {
        if value > 9 {
            return Err(Error::InvalidInput(format!("digit out of range: {value}")));
        }
        Ok(Self::Digit(value))
    }

    /// The character this key contributes to a dial string.
    #[must_use]
    pub fn as_char(&self) -> char {
        match self {
            Self::Digit(d) => char::from(b'0' + d),
            Self::Star => '*',
            Self::Hash => '#',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKey {
    /// Answer the ringing call.
    Answer,
    /// End, decline or cancel the current call.
    HangUp,
    /// Dial the digits entered so far.
    Call,
    /// Clear the entered digits.
    Clear,
    /// Dial the configured landline number at this index.
    SpeedDial(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeStep {
    Up,
    Down,
}

/// Configuration changes reachable from the front-panel menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigEntry {
    /// Request a DHCP lease and switch to it.
    UseDhcp,
    /// Switch back to the static default addresses.
    UseStaticDefaults,
    /// Register with the monitoring server again.
    Reregister,
}

impl FromStr for UserInput {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let input = match s {
            "*" => Self::Key(KeypadKey::Star),
            "#" => Self::Key(KeypadKey::Hash),
            "answer" => Self::Function(FunctionKey::Answer),
            "hangup" | "hang_up" => Self::Function(FunctionKey::HangUp),
            "call" => Self::Function(FunctionKey::Call),
            "clear" => Self::Function(FunctionKey::Clear),
            "volume_up" => Self::Volume(VolumeStep::Up),
            "volume_down" => Self::Volume(VolumeStep::Down),
            "emergency" => Self::Emergency,
            "config:dhcp" => Self::Configure(ConfigEntry::UseDhcp),
            "config:static" => Self::Configure(ConfigEntry::UseStaticDefaults),
            "config:register" => Self::Configure(ConfigEntry::Reregister),
            _ => {
                if let Some(index) = s.strip_prefix("speed_dial:") {
                    let index = index
                        .parse::<u8>()
                        .map_err(|_| Error::InvalidInput(s.to_string()))?;
                    Self::Function(FunctionKey::SpeedDial(index))
                } else if s.len() == 1 && s.as_bytes()[0].is_ascii_digit() {
                    Self::Key(KeypadKey::Digit(s.as_bytes()[0] - b'0'))
                } else {
                    return Err(Error::InvalidInput(s.to_string()));
                }
            }
        };
        Ok(input)
    }
}

impl fmt::Display for UserInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => write!(f, "{}", key.as_char()),
            Self::Function(FunctionKey::Answer) => f.write_str("answer"),
            Self::Function(FunctionKey::HangUp) => f.write_str("hangup"),
            Self::Function(FunctionKey::Call) => f.write_str("call"),
            Self::Function(FunctionKey::Clear) => f.write_str("clear"),
            Self::Function(FunctionKey::SpeedDial(i)) => write!(f, "speed_dial:{i}"),
            Self::Volume(VolumeStep::Up) => f.write_str("volume_up"),
            Self::Volume(VolumeStep::Down) => f.write_str("volume_down"),
            Self::Emergency => f.write_str("emergency"),
            Self::Configure(ConfigEntry::UseDhcp) => f.write_str("config:dhcp"),
            Self::Configure(ConfigEntry::UseStaticDefaults) => f.write_str("config:static"),
            Self::Configure(ConfigEntry::Reregister) => f.write_str("config:register"),
        }
    }
}

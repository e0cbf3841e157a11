//! Scenario files for the simulated device.
//!
//! A scenario is the device's boot configuration plus how the simulated
//! board behaves and a timeline of things that happen to it:
//!
//! ```toml
//! [boot.device]
//! serial = "IC2-000154"
//! firmware = "2.3.1"
//! model = "IC-200 Lobby Panel"
//!
//! [board]
//! dhcp = false
//! far_end_answers_after = 20
//!
//! [[events]]
//! at = 100
//! kind = "incoming"
//! caller = "044-22334455"
//!
//! [[events]]
//! at = 105
//! kind = "input"
//! input = "answer"
//! ```

use anyhow::{Context, Result};
use intercom_core::BootConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    pub boot: BootConfig,
    #[serde(default)]
    pub board: BoardConfig,
    #[serde(default)]
    pub events: Vec<ScenarioEvent>,
}

/// How the simulated hardware behaves.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct BoardConfig {
    pub hardware_ok: bool,
    /// Whether a DHCP server answers.
    pub dhcp: bool,
    pub connectivity: bool,
    pub audio: bool,
    /// Ticks until a dialed party picks up.
    pub far_end_answers_after: u64,
    /// Dialed parties are always busy.
    pub far_end_busy: bool,
    pub battery: u8,
    pub signal: i16,
    pub memory: u8,
    pub temperature: f32,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            hardware_ok: true,
            dhcp: true,
            connectivity: true,
            audio: true,
            far_end_answers_after: 30,
            far_end_busy: false,
            battery: 100,
            signal: -55,
            memory: 35,
            temperature: 31.5,
        }
    }
}

/// Something that happens to the device at a given tick.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScenarioEvent {
    pub at: u64,
    #[serde(flatten)]
    pub action: ScenarioAction,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScenarioAction {
    /// A call arrives from `caller`.
    Incoming { caller: String },
    /// A front-panel input in its text form (`"5"`, `"answer"`, `"config:dhcp"`).
    Input { input: String },
    /// The other party hangs up the current call.
    RemoteHangup,
    /// The autonomous emergency sensor trips.
    Emergency,
    /// Sensor readings change.
    Sensors {
        battery: Option<u8>,
        memory: Option<u8>,
        temperature: Option<f32>,
    },
}

impl Scenario {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let mut scenario: Scenario = toml::from_str(s).context("Failed to parse scenario")?;
        scenario.events.sort_by_key(|e| e.at);
        Ok(scenario)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario {:?}", path))?;
        Self::from_toml_str(&contents)
    }

    /// The tick after the last scripted event.
    pub fn last_tick(&self) -> u64 {
        self.events.last().map(|e| e.at + 1).unwrap_or(0)
    }
}

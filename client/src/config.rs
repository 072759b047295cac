//! Pacing and AI tuning shared by the PvE arena and room sessions

use std::time::Duration;

use anyhow::{Context, Result};
use gitbattle_battle::AiPolicy;
use serde::{Deserialize, Serialize};

/// Display delays and countdown length
///
/// Every field has a default, so a JSON document only needs the values it
/// overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameConfig {
    /// Pause before the scripted opponent acts
    pub ai_delay_ms: u64,

    /// Pause between both players being ready and the battle starting
    pub battle_start_delay_ms: u64,

    /// Ticks shown after the opponent leaves before giving up on them
    pub countdown_ticks: u32,

    pub countdown_tick_ms: u64,

    pub ai: AiPolicy,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            ai_delay_ms: 1000,
            battle_start_delay_ms: 500,
            countdown_ticks: 5,
            countdown_tick_ms: 1000,
            ai: AiPolicy::default(),
        }
    }
}

impl GameConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("Failed to parse game config")
    }

    pub fn ai_delay(&self) -> Duration {
        Duration::from_millis(self.ai_delay_ms)
    }

    pub fn battle_start_delay(&self) -> Duration {
        Duration::from_millis(self.battle_start_delay_ms)
    }

    pub fn countdown_tick(&self) -> Duration {
        Duration::from_millis(self.countdown_tick_ms)
    }
}

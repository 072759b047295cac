//! Scripted opponent

use crate::types::{Action, SideState};

use super::SPECIAL_COOLDOWN;
use super::random::RandomSource;

/// Tuning of the scripted opponent
///
/// The AI heal differs from the player's: it restores a share of max HP,
/// has its own cooldown, and by default is limited only by that cooldown
/// (`heal_cap: None`). Set `heal_cap` to `Some(MAX_HEALS)` for cap parity
/// with the player.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct AiPolicy {
    /// Share of max HP restored per heal
    pub heal_fraction: f64,
    pub heal_cooldown: u32,
    /// Heals allowed per battle; `None` means unlimited
    pub heal_cap: Option<u32>,
    /// HP fraction below which `low_hp_heal_chance` applies
    pub low_hp_threshold: f64,
    pub low_hp_heal_chance: f64,
    /// HP fraction below which `mid_hp_heal_chance` applies
    pub mid_hp_threshold: f64,
    pub mid_hp_heal_chance: f64,
    /// Chance to cast the special when it is ready
    pub special_chance: f64,
    pub special_cooldown: u32,
}

impl Default for AiPolicy {
    fn default() -> Self {
        Self {
            heal_fraction: 0.30,
            heal_cooldown: 4,
            heal_cap: None,
            low_hp_threshold: 0.25,
            low_hp_heal_chance: 0.80,
            mid_hp_threshold: 0.50,
            mid_hp_heal_chance: 0.30,
            special_chance: 0.50,
            special_cooldown: SPECIAL_COOLDOWN,
        }
    }
}

impl AiPolicy {
    /// Pick the AI's action for this turn.
    ///
    /// Cooldowns must already be ticked. A draw is only taken when a
    /// decision actually depends on it.
    pub fn choose_action<R: RandomSource + ?Sized>(&self, side: &SideState, rng: &mut R) -> Action {
        if side.heal_ready(self.heal_cap) {
            let fraction = side.hp_fraction();
            let chance = if fraction < self.low_hp_threshold {
                self.low_hp_heal_chance
            } else if fraction < self.mid_hp_threshold {
                self.mid_hp_heal_chance
            } else {
                0.0
            };

            if chance > 0.0 && rng.next_f64() < chance {
                return Action::Heal;
            }
        }

        if side.special_cooldown == 0 && rng.next_f64() < self.special_chance {
            return Action::Special;
        }

        Action::Attack
    }

    /// HP restored by one AI heal
    pub fn heal_amount(&self, side: &SideState) -> u32 {
        (side.max_hp as f64 * self.heal_fraction).floor() as u32
    }
}

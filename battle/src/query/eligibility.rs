//! Which of the local player's actions would take effect right now

use crate::engine::MAX_HEALS;
use crate::types::{Action, BattleState, Side};

/// Heals the local player has not spent yet
pub fn heals_left(state: &BattleState) -> u32 {
    MAX_HEALS.saturating_sub(state.player.heals_used)
}

/// Check if the local player may act at all
pub fn can_act(state: &BattleState) -> bool {
    state.is_turn_of(Side::Player)
}

pub fn can_attack(state: &BattleState) -> bool {
    can_act(state)
}

/// Check if a heal would be accepted (turn, cooldown and remaining heals)
pub fn can_heal(state: &BattleState) -> bool {
    can_act(state) && state.player.heal_ready(Some(MAX_HEALS))
}

pub fn can_special(state: &BattleState) -> bool {
    can_act(state) && state.player.special_cooldown == 0
}

/// Every action that would not be a no-op, in menu order
pub fn available_actions(state: &BattleState) -> Vec<Action> {
    [Action::Attack, Action::Heal, Action::Special]
        .into_iter()
        .filter(|action| match action {
            Action::Attack => can_attack(state),
            Action::Heal => can_heal(state),
            Action::Special => can_special(state),
        })
        .collect()
}

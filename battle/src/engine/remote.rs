//! Replicating moves between two peers
//!
//! A peer never re-runs the mover's action. The mover resolves it locally,
//! ships the outcome as a [`BattleMove`], and the receiver replays that
//! outcome as a plain HP delta.

use gitbattle_protocol::BattleMove;

use crate::types::{BattleState, Side};

use super::turn::settle;

/// Describe the move that took `before` to `after` for the peer.
///
/// `after` must be the result of a local player action on `before`. The
/// terminal line is left out of the log; the receiver writes its own.
pub fn outgoing_move(
    attacker: &str,
    before: &BattleState,
    after: &BattleState,
    move_id: impl Into<String>,
) -> BattleMove {
    let damage = before.opponent.hp.saturating_sub(after.opponent.hp);
    let heal = after.player.hp.saturating_sub(before.player.hp);
    let recoil = before.player.hp.saturating_sub(after.player.hp);

    let mut lines = after.logs.get(before.logs.len()..).unwrap_or_default();
    if after.is_over() && !before.is_over() {
        lines = lines.split_last().map(|(_, rest)| rest).unwrap_or_default();
    }

    BattleMove {
        attacker: attacker.to_string(),
        damage,
        heal,
        recoil,
        log_message: lines.join(" "),
        move_id: move_id.into(),
    }
}

impl BattleState {
    /// Apply a move the opponent already resolved on their side.
    ///
    /// Ticks every cooldown once, lands the damage on the local player and
    /// the heal and recoil on the opponent, then hands the turn back.
    /// Terminal states are returned unchanged.
    pub fn apply_move(&self, mv: &BattleMove) -> BattleState {
        if self.is_over() {
            return self.clone();
        }

        let mut next = self.clone();
        next.player.tick_cooldowns();
        next.opponent.tick_cooldowns();

        next.player.take_damage(mv.damage);
        next.opponent.restore(mv.heal);
        next.opponent.take_damage(mv.recoil);

        if !mv.log_message.is_empty() {
            next.log(mv.log_message.clone());
        }

        settle(&mut next, Side::Opponent, &mv.attacker);
        next
    }
}

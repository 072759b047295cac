//! Battle initialization and turn resolution
//!
//! Resolution order for every action: compute effects, apply clamped HP
//! deltas, log, check for a knockout, flip the turn if the battle goes on.

use gitbattle_protocol::Character;

use crate::types::{Action, BattleState, Side};

use super::ai::AiPolicy;
use super::damage::roll_hit;
use super::random::RandomSource;
use super::special::{roll_special, special_name};
use super::{HEAL_COOLDOWN, HEAL_FRACTION, MAX_HEALS, SPECIAL_COOLDOWN};

/// Start a battle: full HP, no cooldowns, faster side first (ties go to the player)
pub fn initialize_battle(player: &Character, opponent: &Character) -> BattleState {
    let player_first = player.stats.speed >= opponent.stats.speed;
    opening_state(player, opponent, player_first)
}

/// Start a networked battle.
///
/// Both peers must agree on who moves first, so a speed tie is broken by
/// username order instead of always favouring the local player.
pub fn initialize_pvp_battle(player: &Character, opponent: &Character) -> BattleState {
    let player_first = match player.stats.speed.cmp(&opponent.stats.speed) {
        std::cmp::Ordering::Greater => true,
        std::cmp::Ordering::Less => false,
        std::cmp::Ordering::Equal => player.username <= opponent.username,
    };
    opening_state(player, opponent, player_first)
}

fn opening_state(player: &Character, opponent: &Character, player_first: bool) -> BattleState {
    let mut state = BattleState::new(player.stats.hp, opponent.stats.hp, player_first);
    state.log("Battle Started!");
    state.log(format!(
        "{} ({}) VS {} ({})",
        player.username, player.class_tag, opponent.username, opponent.class_tag
    ));
    state
}

/// Resolve the local player's action.
///
/// Returns the input unchanged when the battle is over, when it is not the
/// player's turn, or when the chosen ability is unavailable.
pub fn perform_player_turn<R: RandomSource + ?Sized>(
    state: &BattleState,
    player: &Character,
    opponent: &Character,
    action: Action,
    rng: &mut R,
) -> BattleState {
    if !state.is_turn_of(Side::Player) {
        return state.clone();
    }

    let mut next = state.clone();
    match action {
        Action::Heal => {
            if !next.player.heal_ready(Some(MAX_HEALS)) {
                return state.clone();
            }
            let amount = (player.stats.hp as f64 * HEAL_FRACTION).floor() as u32;
            apply_heal(&mut next, Side::Player, player, amount, HEAL_COOLDOWN);
        }
        Action::Special => {
            if next.player.special_cooldown > 0 {
                return state.clone();
            }
            apply_special(&mut next, Side::Player, player, opponent, SPECIAL_COOLDOWN, rng);
        }
        Action::Attack => apply_attack(&mut next, Side::Player, player, opponent, rng),
    }

    settle(&mut next, Side::Player, &player.username);
    next
}

/// Resolve one scripted opponent turn.
///
/// Ticks every cooldown on both sides once, then lets `policy` choose.
/// Returns the input unchanged when the battle is over or it is the
/// player's turn.
pub fn perform_opponent_turn<R: RandomSource + ?Sized>(
    state: &BattleState,
    player: &Character,
    opponent: &Character,
    policy: &AiPolicy,
    rng: &mut R,
) -> BattleState {
    if !state.is_turn_of(Side::Opponent) {
        return state.clone();
    }

    let mut next = state.clone();
    next.player.tick_cooldowns();
    next.opponent.tick_cooldowns();

    match policy.choose_action(&next.opponent, rng) {
        Action::Heal => {
            let amount = policy.heal_amount(&next.opponent);
            apply_heal(&mut next, Side::Opponent, opponent, amount, policy.heal_cooldown);
        }
        Action::Special => apply_special(
            &mut next,
            Side::Opponent,
            opponent,
            player,
            policy.special_cooldown,
            rng,
        ),
        Action::Attack => apply_attack(&mut next, Side::Opponent, opponent, player, rng),
    }

    settle(&mut next, Side::Opponent, &opponent.username);
    next
}

fn apply_heal(state: &mut BattleState, actor: Side, caster: &Character, amount: u32, cooldown: u32) {
    let side = state.side_mut(actor);
    let restored = side.restore(amount);
    side.heals_used += 1;
    side.heal_cooldown = cooldown;

    state.log(format!("{} used Merge Shield! +{} HP.", caster.username, restored));
}

fn apply_attack<R: RandomSource + ?Sized>(
    state: &mut BattleState,
    actor: Side,
    attacker: &Character,
    defender: &Character,
    rng: &mut R,
) {
    let hit = roll_hit(&attacker.stats, &defender.stats, 1.0, rng);
    state.side_mut(actor.other()).take_damage(hit.damage);

    state.log(format!(
        "{} hits {} for {} DMG!{}",
        attacker.username,
        defender.username,
        hit.damage,
        hit.crit_suffix()
    ));
}

fn apply_special<R: RandomSource + ?Sized>(
    state: &mut BattleState,
    actor: Side,
    caster: &Character,
    defender: &Character,
    cooldown: u32,
    rng: &mut R,
) {
    state.side_mut(actor).special_cooldown = cooldown;

    let effect = roll_special(caster, defender, rng);
    state.side_mut(actor.other()).take_damage(effect.total_damage());
    let healed = state.side_mut(actor).restore(effect.self_heal);
    let recoiled = state.side_mut(actor).take_damage(effect.recoil);

    let name = special_name(caster.class_tag);
    let who = &caster.username;

    if let [first, second] = effect.hits.as_slice() {
        state.log(format!("{} uses {}!", who, name));
        state.log(format!("Hit 1: {}{}", first.damage, first.crit_suffix()));
        state.log(format!("Hit 2: {}{}", second.damage, second.crit_suffix()));
    } else {
        let crit = effect.hits.iter().any(|hit| hit.crit);
        state.log(format!(
            "{} uses {}! {} DMG{}",
            who,
            name,
            effect.total_damage(),
            if crit { " CRIT!" } else { "" }
        ));
    }

    if effect.self_heal > 0 {
        state.log(format!("{} healed {} HP.", who, healed));
    }
    if effect.recoil > 0 {
        state.log(format!("{} took {} recoil.", who, recoiled));
    }
}

/// Knockout check after `actor` has acted.
///
/// An actor that knocks itself out loses even if the defender also fell,
/// so the side that did not act wins a simultaneous knockout.
pub(crate) fn settle(state: &mut BattleState, actor: Side, actor_name: &str) {
    if state.side(actor).is_knocked_out() {
        state.winner = Some(actor.other());
        state.log(format!("{} knocked themselves out...", actor_name));
    } else if state.side(actor.other()).is_knocked_out() {
        state.winner = Some(actor);
        state.log(format!("{} is victorious!", actor_name));
    } else {
        state.is_player_turn = actor == Side::Opponent;
    }
}

//! Pure state transitions
//!
//! Given a state, the two characters, an action and a random source, every
//! function here returns a new [`BattleState`](crate::BattleState) without
//! touching the input.

mod ai;
mod damage;
mod random;
mod remote;
mod special;
mod turn;

pub use ai::AiPolicy;
pub use damage::{Hit, MIN_DAMAGE, crit_chance, roll_hit};
pub use random::{RandomSource, RngSource, SequenceRandom};
pub use remote::outgoing_move;
pub use special::special_name;
pub use turn::{initialize_battle, initialize_pvp_battle, perform_opponent_turn, perform_player_turn};

/// Heals each side may spend per battle
pub const MAX_HEALS: u32 = 3;

/// Share of max HP restored by the player's heal
pub const HEAL_FRACTION: f64 = 0.4;

/// Resolved turns a heal stays on cooldown
pub const HEAL_COOLDOWN: u32 = 3;

/// Resolved turns a special stays on cooldown
pub const SPECIAL_COOLDOWN: u32 = 3;

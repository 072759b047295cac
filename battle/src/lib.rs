//! Turn-based combat engine for Git Battle.
//!
//! Every transition in this crate is a pure function: it takes a
//! [`BattleState`] (plus the two immutable [`Character`]s and, where dice are
//! rolled, an injected [`RandomSource`]) and returns a new state. Nothing
//! here performs I/O, sleeps, or owns a global random generator.
//!
//! # Overview
//!
//! ```text
//! gitbattle-protocol (wire format)
//!        │
//!        ▼
//! gitbattle-battle (engine + queries) ← THIS CRATE
//!        │
//!        └─> gitbattle-client (PvE pacing, PvP room sync)
//! ```
//!
//! # Main Types
//!
//! - [`BattleState`] - the single mutable aggregate of a battle
//! - [`SideState`] - HP, heal uses and cooldowns of one side
//! - [`Side`] / [`Action`] - who acts and what they do
//! - [`AiPolicy`] - tunable scripted opponent
//! - [`RandomSource`] - uniform `[0, 1)` draws; [`RngSource`] wraps any `rand` rng,
//!   [`SequenceRandom`] replays a scripted sequence
//!
//! # Example Usage
//!
//! ```ignore
//! use gitbattle_battle::{initialize_battle, perform_player_turn, perform_opponent_turn};
//! use gitbattle_battle::{Action, AiPolicy, RngSource};
//!
//! let mut rng = RngSource::thread();
//! let state = initialize_battle(&me, &rival);
//! let state = perform_player_turn(&state, &me, &rival, Action::Attack, &mut rng);
//! let state = perform_opponent_turn(&state, &me, &rival, &AiPolicy::default(), &mut rng);
//!
//! if let Some(winner) = state.winner {
//!     println!("{:?} won", winner);
//! }
//! ```

pub mod engine;
pub mod query;
pub mod types;

// Re-export main types at crate root for convenience
pub use engine::{
    AiPolicy, HEAL_COOLDOWN, HEAL_FRACTION, Hit, MAX_HEALS, MIN_DAMAGE, RandomSource, RngSource,
    SPECIAL_COOLDOWN, SequenceRandom, crit_chance, initialize_battle, initialize_pvp_battle,
    outgoing_move, perform_opponent_turn, perform_player_turn, roll_hit, special_name,
};
pub use types::{Action, BattleState, Side, SideState};

// Re-export commonly used protocol types
pub use gitbattle_protocol::{BattleMove, Character, ClassTag, Stats};

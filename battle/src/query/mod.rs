//! Query helpers for battle decision making
//!
//! Read-only views over a [`BattleState`](crate::BattleState) that a UI or a
//! bot uses to decide which actions to offer.

mod eligibility;

pub use eligibility::{
    available_actions,
    can_act,
    can_attack,
    can_heal,
    can_special,
    heals_left,
};

//! Battle state types

mod side;
mod state;

pub use side::{Side, SideState};
pub use state::{Action, BattleState};

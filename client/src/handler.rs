use std::future::Future;

use gitbattle_battle::{BattleState, Side};
use gitbattle_protocol::Character;

/// Trait for reacting to game events.
///
/// All methods have default no-op implementations, so a UI only needs to
/// implement the events it renders. Implementations may use `async fn`.
///
/// # Example
///
/// ```ignore
/// struct Console;
///
/// impl GameHandler for Console {
///     async fn on_battle_updated(&mut self, state: &BattleState) {
///         if let Some(line) = state.last_log() {
///             println!("{}", line);
///         }
///     }
/// }
/// ```
pub trait GameHandler: Send {
    /// An opponent was paired with us for the first time
    fn on_opponent_joined(&mut self, opponent: &Character) -> impl Future<Output = ()> + Send {
        let _ = opponent;
        async {}
    }

    fn on_opponent_ready(&mut self, username: &str) -> impl Future<Output = ()> + Send {
        let _ = username;
        async {}
    }

    /// The opponent announced they are leaving; a countdown follows.
    fn on_opponent_left(&mut self, username: &str) -> impl Future<Output = ()> + Send {
        let _ = username;
        async {}
    }

    /// The departed opponent came back before the countdown ran out.
    fn on_opponent_returned(&mut self, opponent: &Character) -> impl Future<Output = ()> + Send {
        let _ = opponent;
        async {}
    }

    fn on_countdown(&mut self, remaining: u32) -> impl Future<Output = ()> + Send {
        let _ = remaining;
        async {}
    }

    fn on_battle_started(&mut self, state: &BattleState) -> impl Future<Output = ()> + Send {
        let _ = state;
        async {}
    }

    /// The opponent rejoined mid-battle; the battle is gone and both
    /// players are back in the lobby, not ready.
    fn on_battle_abandoned(&mut self) -> impl Future<Output = ()> + Send {
        async {}
    }

    /// Called after every resolved action, local or remote.
    fn on_battle_updated(&mut self, state: &BattleState) -> impl Future<Output = ()> + Send {
        let _ = state;
        async {}
    }

    fn on_battle_ended(&mut self, winner: Side, state: &BattleState) -> impl Future<Output = ()> + Send {
        let _ = (winner, state);
        async {}
    }

    /// The session is over and the player is back at the menu.
    fn on_return_to_menu(&mut self) -> impl Future<Output = ()> + Send {
        async {}
    }
}

//! BattleState - the aggregate every transition reads and returns

use super::side::{Side, SideState};

/// An action that consumes the acting side's turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Action {
    Attack,
    Heal,
    Special,
}

impl Action {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "attack" => Some(Action::Attack),
            "heal" => Some(Action::Heal),
            "special" => Some(Action::Special),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Attack => "attack",
            Action::Heal => "heal",
            Action::Special => "special",
        }
    }
}

/// A battle between the local player and one opponent
///
/// `winner` is set exactly when one side's HP has reached 0. Once set the
/// state is terminal and every transition returns it unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct BattleState {
    pub player: SideState,

    pub opponent: SideState,

    pub is_player_turn: bool,

    pub winner: Option<Side>,

    /// Append-only event log, oldest first
    pub logs: Vec<String>,
}

impl BattleState {
    /// Fresh state with both sides at full HP and nothing logged
    pub fn new(player_max_hp: u32, opponent_max_hp: u32, is_player_turn: bool) -> Self {
        Self {
            player: SideState::new(player_max_hp),
            opponent: SideState::new(opponent_max_hp),
            is_player_turn,
            winner: None,
            logs: Vec::new(),
        }
    }

    pub fn side(&self, side: Side) -> &SideState {
        match side {
            Side::Player => &self.player,
            Side::Opponent => &self.opponent,
        }
    }

    pub fn side_mut(&mut self, side: Side) -> &mut SideState {
        match side {
            Side::Player => &mut self.player,
            Side::Opponent => &mut self.opponent,
        }
    }

    pub fn is_over(&self) -> bool {
        self.winner.is_some()
    }

    /// Whether `side` is the one expected to act next
    pub fn is_turn_of(&self, side: Side) -> bool {
        !self.is_over()
            && match side {
                Side::Player => self.is_player_turn,
                Side::Opponent => !self.is_player_turn,
            }
    }

    pub fn log(&mut self, line: impl Into<String>) {
        self.logs.push(line.into());
    }

    /// Most recent log line
    pub fn last_log(&self) -> Option<&str> {
        self.logs.last().map(String::as_str)
    }

    /// End the battle because `side` walked away
    ///
    /// The other side wins. Terminal states are returned unchanged.
    pub fn forfeit(&self, side: Side, name: &str) -> BattleState {
        if self.is_over() {
            return self.clone();
        }

        let mut next = self.clone();
        next.winner = Some(side.other());
        next.log(format!("{} fled the battle!", name));
        next
    }
}

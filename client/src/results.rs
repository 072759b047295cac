//! Fire-and-forget battle result persistence

use std::future::Future;
use std::sync::{Arc, RwLock};

use anyhow::{Result, anyhow};
use gitbattle_battle::Side;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Outcome {
    Win,
    Loss,
}

impl Outcome {
    /// Outcome for the local player given the battle's winner
    pub fn for_winner(winner: Side) -> Self {
        match winner {
            Side::Player => Outcome::Win,
            Side::Opponent => Outcome::Loss,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Win => "WIN",
            Outcome::Loss => "LOSS",
        }
    }
}

/// Somewhere finished battles are written to
///
/// Callers log a returned error and carry on; a failed write never affects
/// the game.
pub trait ResultRecorder: Send + Sync {
    fn record_result(
        &self,
        username: &str,
        avatar: &str,
        outcome: Outcome,
        opponent: &str,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Win/loss totals of one player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub username: String,
    pub avatar: String,
    pub wins: u32,
    pub losses: u32,
}

/// One finished battle as seen by `username`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleRecord {
    pub username: String,
    pub opponent: String,
    pub winner: Side,
}

#[derive(Debug, Default)]
struct Ledger {
    players: Vec<PlayerRecord>,
    battles: Vec<BattleRecord>,
}

/// In-process result store, cheap to clone
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    inner: Arc<RwLock<Ledger>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn player(&self, username: &str) -> Option<PlayerRecord> {
        self.inner
            .read()
            .ok()?
            .players
            .iter()
            .find(|p| p.username == username)
            .cloned()
    }

    pub fn history(&self) -> Vec<BattleRecord> {
        self.inner
            .read()
            .map(|ledger| ledger.battles.clone())
            .unwrap_or_default()
    }

    /// Players ordered by wins, then by fewest losses
    pub fn leaderboard(&self) -> Vec<PlayerRecord> {
        let mut players = self
            .inner
            .read()
            .map(|ledger| ledger.players.clone())
            .unwrap_or_default();
        players.sort_by(|a, b| b.wins.cmp(&a.wins).then(a.losses.cmp(&b.losses)));
        players
    }

    fn write(&self, username: &str, avatar: &str, outcome: Outcome, opponent: &str) -> Result<()> {
        let mut ledger = self
            .inner
            .write()
            .map_err(|_| anyhow!("Result ledger lock poisoned"))?;

        let index = match ledger.players.iter().position(|p| p.username == username) {
            Some(index) => index,
            None => {
                ledger.players.push(PlayerRecord {
                    username: username.to_string(),
                    avatar: String::new(),
                    wins: 0,
                    losses: 0,
                });
                ledger.players.len() - 1
            }
        };

        let record = &mut ledger.players[index];
        record.avatar = avatar.to_string();
        match outcome {
            Outcome::Win => record.wins += 1,
            Outcome::Loss => record.losses += 1,
        }

        ledger.battles.push(BattleRecord {
            username: username.to_string(),
            opponent: opponent.to_string(),
            winner: match outcome {
                Outcome::Win => Side::Player,
                Outcome::Loss => Side::Opponent,
            },
        });

        Ok(())
    }
}

impl ResultRecorder for MemoryLedger {
    async fn record_result(
        &self,
        username: &str,
        avatar: &str,
        outcome: Outcome,
        opponent: &str,
    ) -> Result<()> {
        // anonymous players are not tracked
        if username.is_empty() {
            return Ok(());
        }
        self.write(username, avatar, outcome, opponent)?;
        tracing::debug!(username, outcome = outcome.as_str(), opponent, "Saved battle result");
        Ok(())
    }
}

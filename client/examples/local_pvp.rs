//! Local PvP Example
//!
//! Two bots meet in a room on an in-memory channel, ready up, and fight it
//! out. Pass a relay URL to play over a WebSocket relay instead.
//!
//! Usage: cargo run --example local_pvp -- [ws://relay-url]

use anyhow::Result;
use gitbattle_battle::query::available_actions;
use gitbattle_client::{
    BattleState, Character, GameConfig, GameHandle, GameHandler, MemoryChannel, MemoryDirectory,
    MemoryLedger, ReconnectPolicy, RelayChannel, RngSource, RoomChannel, RoomDirectory,
    RoomRunner, RoomSession, Side, fallback_character,
};
use rand::seq::SliceRandom;
use tracing_subscriber::EnvFilter;

struct Bot {
    name: String,
    handle: GameHandle,
}

impl Bot {
    fn maybe_act(&self, state: &BattleState) {
        if !state.is_turn_of(Side::Player) {
            return;
        }
        if let Some(&action) = available_actions(state).choose(&mut rand::thread_rng()) {
            self.handle.act(action).ok();
        }
    }
}

impl GameHandler for Bot {
    async fn on_opponent_joined(&mut self, opponent: &Character) {
        println!("[{}] {} joined", self.name, opponent.username);
        self.handle.ready().ok();
    }

    async fn on_opponent_ready(&mut self, username: &str) {
        println!("[{}] {} is ready", self.name, username);
    }

    async fn on_battle_abandoned(&mut self) {
        println!("[{}] battle abandoned, readying for a rematch", self.name);
        self.handle.ready().ok();
    }

    async fn on_battle_started(&mut self, state: &BattleState) {
        println!("[{}] battle started", self.name);
        self.maybe_act(state);
    }

    async fn on_battle_updated(&mut self, state: &BattleState) {
        if let Some(line) = state.last_log() {
            println!("[{}] {}", self.name, line);
        }
        self.maybe_act(state);
    }

    async fn on_battle_ended(&mut self, winner: Side, _state: &BattleState) {
        let verdict = if winner == Side::Player { "won" } else { "lost" };
        println!("[{}] {}", self.name, verdict);
        self.handle.leave().ok();
    }
}

async fn play<C>(channel: C, room: String, me: Character, opponent: Option<Character>, ledger: MemoryLedger) -> Result<()>
where
    C: RoomChannel,
{
    let (handle, commands) = GameHandle::channel();
    // a guest already knows its host, so it can ready up straight away
    if opponent.is_some() {
        handle.ready()?;
    }
    let bot = Bot {
        name: me.username.clone(),
        handle,
    };
    let session = RoomSession::new(room, me, opponent, GameConfig::default(), RngSource::seeded(rand::random()));
    let mut runner = RoomRunner::new(session, channel, bot, ledger);
    runner.run(commands).await
}

async fn duel<C>(channel: C) -> Result<()>
where
    C: RoomChannel + Clone + 'static,
{
    let directory = MemoryDirectory::new();
    let ledger = MemoryLedger::new();
    let host = fallback_character("octocat");
    let guest = fallback_character("hubot");

    let code = directory.create_room(&host.username, false).await?;
    println!("Room {} created by {}", code, host.username);

    let host_task = tokio::spawn(play(channel.clone(), code.clone(), host.clone(), None, ledger.clone()));
    // let the host subscribe before the guest announces itself
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    directory.mark_room_joined(&code, &guest.username).await?;
    let guest_task = tokio::spawn(play(channel, code, guest, Some(host), ledger.clone()));

    host_task.await??;
    guest_task.await??;

    for record in ledger.leaderboard() {
        println!("{}: {}W / {}L", record.username, record.wins, record.losses);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    match std::env::args().nth(1) {
        Some(url) => duel(RelayChannel::connect(url, ReconnectPolicy::default()).await?).await,
        None => duel(MemoryChannel::new()).await,
    }
}

//! PvE Duel Example
//!
//! Looks up two GitHub users and lets a bot play the first one against the
//! scripted AI, printing the battle log as it happens.
//!
//! Usage: cargo run --example pve_duel -- <you> <rival>
//! Set GITHUB_TOKEN to lift the anonymous rate limit.

use anyhow::Result;
use gitbattle_battle::query::available_actions;
use gitbattle_client::{
    BattleState, GameConfig, GameHandle, GameHandler, GithubProfiles, MemoryLedger, PveArena,
    PveBattle, RngSource, Side, fallback_character, summon,
};
use rand::seq::SliceRandom;
use tracing_subscriber::EnvFilter;

struct Bot {
    handle: GameHandle,
    printed: usize,
}

impl Bot {
    fn print_new_lines(&mut self, state: &BattleState) {
        for line in state.logs.iter().skip(self.printed) {
            println!("  {}", line);
        }
        self.printed = state.logs.len();
    }

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
    async fn on_battle_started(&mut self, state: &BattleState) {
        self.printed = 0;
        self.print_new_lines(state);
        self.maybe_act(state);
    }

    async fn on_battle_updated(&mut self, state: &BattleState) {
        self.print_new_lines(state);
        println!(
            "  [HP] you {}/{} | rival {}/{}",
            state.player.hp, state.player.max_hp, state.opponent.hp, state.opponent.max_hp
        );
        self.maybe_act(state);
    }

    async fn on_battle_ended(&mut self, winner: Side, _state: &BattleState) {
        match winner {
            Side::Player => println!("You win!"),
            Side::Opponent => println!("You lose."),
        }
        self.handle.leave().ok();
    }

    async fn on_return_to_menu(&mut self) {
        println!("Back to menu");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let me = args.next().unwrap_or_else(|| "octocat".to_string());
    let rival = args.next().unwrap_or_else(|| "torvalds".to_string());

    let mut profiles = GithubProfiles::new();
    if let Ok(token) = std::env::var("GITHUB_TOKEN") {
        profiles = profiles.with_token(token);
    }

    let me = summon(&profiles, &me).await.unwrap_or_else(|_| fallback_character(&me));
    let rival = summon(&profiles, &rival).await.unwrap_or_else(|_| fallback_character(&rival));
    println!("{} ({}) vs {} ({})", me.username, me.class_tag.as_str(), rival.username, rival.class_tag.as_str());

    let config = GameConfig::default();
    let battle = PveBattle::new(me.clone(), rival, config.ai.clone(), RngSource::seeded(rand::random()));
    let (handle, commands) = GameHandle::channel();
    let ledger = MemoryLedger::new();

    let bot = Bot {
        handle,
        printed: 0,
    };
    let mut arena = PveArena::new(battle, bot, ledger.clone(), config);
    arena.run(commands).await;

    if let Some(record) = ledger.player(&me.username) {
        println!("{}: {}W / {}L", record.username, record.wins, record.losses);
    }

    Ok(())
}

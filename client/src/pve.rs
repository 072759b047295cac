//! Player versus scripted opponent
//!
//! [`PveBattle`] sequences engine calls; [`PveArena`] paces them in real
//! time, waiting a fixed "thinking" delay before each AI turn.

use gitbattle_battle::{
    Action, AiPolicy, BattleState, RandomSource, Side, initialize_battle, perform_opponent_turn,
    perform_player_turn,
};
use gitbattle_protocol::Character;
use tokio::sync::mpsc;

use crate::config::GameConfig;
use crate::handle::Command;
use crate::handler::GameHandler;
use crate::results::{Outcome, ResultRecorder};
use crate::timer::{TimerKind, Timers};

/// One PvE battle and the dice it rolls with
pub struct PveBattle<R> {
    player: Character,
    opponent: Character,
    policy: AiPolicy,
    state: BattleState,
    rng: R,
    battle_id: u64,
}

impl<R: RandomSource> PveBattle<R> {
    pub fn new(player: Character, opponent: Character, policy: AiPolicy, rng: R) -> Self {
        let state = initialize_battle(&player, &opponent);
        Self {
            player,
            opponent,
            policy,
            state,
            rng,
            battle_id: 1,
        }
    }

    pub fn state(&self) -> &BattleState {
        &self.state
    }

    pub fn player(&self) -> &Character {
        &self.player
    }

    pub fn opponent(&self) -> &Character {
        &self.opponent
    }

    /// Bumped on every reset
    pub fn battle_id(&self) -> u64 {
        self.battle_id
    }

    /// Apply the player's action, returns whether it took effect
    pub fn act(&mut self, action: Action) -> bool {
        let next = perform_player_turn(&self.state, &self.player, &self.opponent, action, &mut self.rng);
        self.commit(next)
    }

    pub fn needs_ai_turn(&self) -> bool {
        self.state.is_turn_of(Side::Opponent)
    }

    /// Let the AI act, returns whether it did
    pub fn take_ai_turn(&mut self) -> bool {
        let next = perform_opponent_turn(
            &self.state,
            &self.player,
            &self.opponent,
            &self.policy,
            &mut self.rng,
        );
        self.commit(next)
    }

    /// Start over against the same opponent
    pub fn reset(&mut self) {
        self.state = initialize_battle(&self.player, &self.opponent);
        self.battle_id += 1;
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.state.winner.map(Outcome::for_winner)
    }

    fn commit(&mut self, next: BattleState) -> bool {
        if next == self.state {
            return false;
        }
        self.state = next;
        true
    }
}

/// Real-time driver for a [`PveBattle`]
pub struct PveArena<H, L, R> {
    battle: PveBattle<R>,
    handler: H,
    recorder: L,
    config: GameConfig,
}

impl<H, L, R> PveArena<H, L, R>
where
    H: GameHandler,
    L: ResultRecorder,
    R: RandomSource + Send,
{
    pub fn new(battle: PveBattle<R>, handler: H, recorder: L, config: GameConfig) -> Self {
        Self {
            battle,
            handler,
            recorder,
            config,
        }
    }

    pub fn battle(&self) -> &PveBattle<R> {
        &self.battle
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Play until the player leaves or the command channel closes
    pub async fn run(&mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        let (mut timers, mut fired) = Timers::new();
        self.start(&mut timers).await;

        loop {
            tokio::select! {
                Some(tick) = fired.recv() => {
                    if timers.accept(tick) && tick.kind == TimerKind::AiTurn && self.battle.take_ai_turn() {
                        self.after_turn(&mut timers).await;
                    }
                }
                command = commands.recv() => match command {
                    Some(Command::Act(action)) => {
                        if self.battle.act(action) {
                            self.after_turn(&mut timers).await;
                        }
                    }
                    Some(Command::Reset) => {
                        timers.cancel(TimerKind::AiTurn);
                        self.battle.reset();
                        self.start(&mut timers).await;
                    }
                    Some(Command::Ready) => {}
                    Some(Command::Leave) | None => break,
                },
            }
        }

        timers.cancel_all();
        self.handler.on_return_to_menu().await;
    }

    async fn start(&mut self, timers: &mut Timers) {
        tracing::debug!(
            battle_id = self.battle.battle_id(),
            opponent = %self.battle.opponent().username,
            "PvE battle started"
        );
        let state = self.battle.state().clone();
        self.handler.on_battle_started(&state).await;
        self.schedule_ai(timers);
    }

    async fn after_turn(&mut self, timers: &mut Timers) {
        let state = self.battle.state().clone();
        self.handler.on_battle_updated(&state).await;

        match state.winner {
            Some(winner) => {
                timers.cancel(TimerKind::AiTurn);
                self.handler.on_battle_ended(winner, &state).await;
                self.record(Outcome::for_winner(winner)).await;
            }
            None => self.schedule_ai(timers),
        }
    }

    fn schedule_ai(&self, timers: &mut Timers) {
        if self.battle.needs_ai_turn() {
            timers.schedule(TimerKind::AiTurn, self.config.ai_delay());
        }
    }

    async fn record(&mut self, outcome: Outcome) {
        let player = self.battle.player();
        let (username, avatar) = (player.username.clone(), player.avatar_url.clone());
        let opponent = self.battle.opponent().username.clone();

        if let Err(e) = self
            .recorder
            .record_result(&username, &avatar, outcome, &opponent)
            .await
        {
            tracing::warn!(username = %username, error = %e, "Failed to save battle result");
        }
    }
}

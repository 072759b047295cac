//! Drives a [`RoomSession`] over a live room channel

use anyhow::{Context, Result};
use gitbattle_battle::RandomSource;
use tokio::sync::mpsc;

use crate::handle::Command;
use crate::handler::GameHandler;
use crate::results::ResultRecorder;
use crate::session::{Effect, RoomSession};
use crate::timer::Timers;
use crate::transport::RoomChannel;

/// Async adapter between a room channel, the player and a [`RoomSession`]
///
/// Subscribes on start, then feeds room events, timer firings and player
/// commands into the session one at a time and carries out the effects it
/// returns. The subscription and every pending timer are released on all
/// exit paths.
pub struct RoomRunner<C, H, L, R> {
    session: RoomSession<R>,
    channel: C,
    handler: H,
    recorder: L,
}

impl<C, H, L, R> RoomRunner<C, H, L, R>
where
    C: RoomChannel,
    H: GameHandler,
    L: ResultRecorder,
    R: RandomSource + Send,
{
    pub fn new(session: RoomSession<R>, channel: C, handler: H, recorder: L) -> Self {
        Self {
            session,
            channel,
            handler,
            recorder,
        }
    }

    pub fn session(&self) -> &RoomSession<R> {
        &self.session
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Run until the session terminates
    ///
    /// Closing the command channel counts as leaving. Only a failed
    /// subscription is an error; publish and persistence failures are
    /// logged and the game goes on.
    pub async fn run(&mut self, mut commands: mpsc::UnboundedReceiver<Command>) -> Result<()> {
        let room = self.session.room().to_string();
        let (mut timers, mut fired) = Timers::new();

        self.session.enter();
        let mut subscription = self
            .channel
            .subscribe(&room)
            .await
            .with_context(|| format!("Failed to subscribe to room {}", room))?;
        tracing::info!(room = %room, username = %self.session.me().username, "Entered room");

        let effects = self.session.joined();
        self.execute(effects, &mut timers).await;

        while !self.session.is_terminated() {
            let effects = tokio::select! {
                event = subscription.recv() => match event {
                    Some(event) => self.session.handle_event(event),
                    None => {
                        tracing::warn!(room = %room, "Room channel closed");
                        self.session.leave()
                    }
                },
                Some(tick) = fired.recv() => {
                    if timers.accept(tick) {
                        self.session.on_timer(tick.kind)
                    } else {
                        Vec::new()
                    }
                }
                command = commands.recv() => match command {
                    Some(Command::Ready) => self.session.mark_ready(),
                    Some(Command::Act(action)) => self.session.act(action),
                    Some(Command::Reset) => Vec::new(),
                    Some(Command::Leave) | None => self.session.leave(),
                },
            };
            self.execute(effects, &mut timers).await;
        }

        timers.cancel_all();
        subscription.unsubscribe_all();
        tracing::info!(room = %room, "Left room");
        Ok(())
    }

    async fn execute(&mut self, effects: Vec<Effect>, timers: &mut Timers) {
        let room = self.session.room().to_string();

        for effect in effects {
            match effect {
                Effect::Publish(event) => {
                    if let Err(e) = self.channel.publish(&room, &event).await {
                        tracing::warn!(room = %room, event = event.name(), error = %e, "Publish failed");
                    }
                }
                Effect::Schedule(kind, delay) => {
                    timers.schedule(kind, delay);
                }
                Effect::Cancel(kind) => {
                    timers.cancel(kind);
                }
                Effect::CancelAll => timers.cancel_all(),
                Effect::OpponentJoined(opponent) => self.handler.on_opponent_joined(&opponent).await,
                Effect::OpponentReady(username) => self.handler.on_opponent_ready(&username).await,
                Effect::OpponentLeft(username) => self.handler.on_opponent_left(&username).await,
                Effect::OpponentReturned(opponent) => {
                    self.handler.on_opponent_returned(&opponent).await
                }
                Effect::Countdown(remaining) => self.handler.on_countdown(remaining).await,
                Effect::BattleStarted(state) => self.handler.on_battle_started(&state).await,
                Effect::BattleAbandoned => self.handler.on_battle_abandoned().await,
                Effect::BattleUpdated(state) => self.handler.on_battle_updated(&state).await,
                Effect::BattleEnded { winner, state } => {
                    self.handler.on_battle_ended(winner, &state).await
                }
                Effect::RecordResult { outcome, opponent } => {
                    let me = self.session.me();
                    let (username, avatar) = (me.username.clone(), me.avatar_url.clone());
                    if let Err(e) = self
                        .recorder
                        .record_result(&username, &avatar, outcome, &opponent)
                        .await
                    {
                        tracing::warn!(room = %room, error = %e, "Failed to save battle result");
                    }
                }
                Effect::ReturnToMenu => self.handler.on_return_to_menu().await,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use gitbattle_battle::{BattleState, RngSource, Side};
    use gitbattle_protocol::{Character, ClassTag, Stats};
    use tokio::task::JoinHandle;

    use crate::config::GameConfig;
    use crate::handle::GameHandle;
    use crate::results::MemoryLedger;
    use crate::transport::MemoryChannel;

    const ROOM: &str = "ROOM01";

    #[derive(Debug, Clone, PartialEq)]
    enum Seen {
        Joined(String),
        Ready(String),
        Left(String),
        Returned(String),
        Countdown(u32),
        Started(BattleState),
        Abandoned,
        Updated(BattleState),
        Ended(Side),
        Menu,
    }

    struct Spy(mpsc::UnboundedSender<Seen>);

    impl GameHandler for Spy {
        async fn on_opponent_joined(&mut self, opponent: &Character) {
            let _ = self.0.send(Seen::Joined(opponent.username.clone()));
        }

        async fn on_opponent_ready(&mut self, username: &str) {
            let _ = self.0.send(Seen::Ready(username.to_string()));
        }

        async fn on_opponent_left(&mut self, username: &str) {
            let _ = self.0.send(Seen::Left(username.to_string()));
        }

        async fn on_opponent_returned(&mut self, opponent: &Character) {
            let _ = self.0.send(Seen::Returned(opponent.username.clone()));
        }

        async fn on_countdown(&mut self, remaining: u32) {
            let _ = self.0.send(Seen::Countdown(remaining));
        }

        async fn on_battle_started(&mut self, state: &BattleState) {
            let _ = self.0.send(Seen::Started(state.clone()));
        }

        async fn on_battle_abandoned(&mut self) {
            let _ = self.0.send(Seen::Abandoned);
        }

        async fn on_battle_updated(&mut self, state: &BattleState) {
            let _ = self.0.send(Seen::Updated(state.clone()));
        }

        async fn on_battle_ended(&mut self, winner: Side, _state: &BattleState) {
            let _ = self.0.send(Seen::Ended(winner));
        }

        async fn on_return_to_menu(&mut self) {
            let _ = self.0.send(Seen::Menu);
        }
    }

    struct Peer {
        handle: GameHandle,
        seen: mpsc::UnboundedReceiver<Seen>,
        task: JoinHandle<Result<()>>,
    }

    impl Peer {
        async fn wait_for(&mut self, want: impl Fn(&Seen) -> bool) -> Seen {
            loop {
                let seen = tokio::time::timeout(Duration::from_secs(60), self.seen.recv())
                    .await
                    .expect("timed out waiting for handler event")
                    .expect("handler dropped");
                if want(&seen) {
                    return seen;
                }
            }
        }

        async fn next_update(&mut self) -> BattleState {
            match self.wait_for(|s| matches!(s, Seen::Updated(_))).await {
                Seen::Updated(state) => state,
                other => unreachable!("{other:?}"),
            }
        }
    }

    fn fighter(name: &str, speed: u32) -> Character {
        Character::new(
            name,
            format!("https://avatars.example/{name}"),
            ClassTag::FrontendWarrior,
            Stats {
                hp: 120,
                attack: 20,
                defense: 10,
                speed,
            },
        )
    }

    fn spawn_peer(
        channel: &MemoryChannel,
        ledger: &MemoryLedger,
        me: Character,
        opponent: Option<Character>,
        seed: u64,
    ) -> Peer {
        let session = RoomSession::new(ROOM, me, opponent, GameConfig::default(), RngSource::seeded(seed));
        let (seen_tx, seen) = mpsc::unbounded_channel();
        let (handle, commands) = GameHandle::channel();
        let mut runner = RoomRunner::new(session, channel.clone(), Spy(seen_tx), ledger.clone());

        let task = tokio::spawn(async move { runner.run(commands).await });
        Peer { handle, seen, task }
    }

    async fn paired(channel: &MemoryChannel, ledger: &MemoryLedger) -> (Peer, Peer) {
        let mut alice = spawn_peer(channel, ledger, fighter("alice", 20), None, 1);
        let mut bob = spawn_peer(channel, ledger, fighter("bob", 10), None, 2);

        alice.wait_for(|s| *s == Seen::Joined("bob".into())).await;
        bob.wait_for(|s| *s == Seen::Joined("alice".into())).await;
        (alice, bob)
    }

    async fn start_battle(alice: &mut Peer, bob: &mut Peer) {
        alice.handle.ready().unwrap();
        bob.handle.ready().unwrap();

        let is_started = |s: &Seen| matches!(s, Seen::Started(_));
        let Seen::Started(on_alice) = alice.wait_for(is_started).await else {
            unreachable!()
        };
        let Seen::Started(on_bob) = bob.wait_for(is_started).await else {
            unreachable!()
        };
        assert!(on_alice.is_player_turn);
        assert!(!on_bob.is_player_turn);
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_pvp_flow() {
        let channel = MemoryChannel::new();
        let ledger = MemoryLedger::new();
        let (mut alice, mut bob) = paired(&channel, &ledger).await;

        start_battle(&mut alice, &mut bob).await;

        alice.handle.attack().unwrap();
        let on_alice = alice.next_update().await;
        let on_bob = bob.next_update().await;
        assert!(on_bob.player.hp < 120);
        assert_eq!(on_alice.opponent.hp, on_bob.player.hp);
        assert_eq!(on_alice.player.hp, on_bob.opponent.hp);
        assert!(on_bob.is_player_turn);

        bob.handle.attack().unwrap();
        let on_bob = bob.next_update().await;
        let on_alice = alice.next_update().await;
        assert_eq!(on_alice.opponent.hp, on_bob.player.hp);
        assert_eq!(on_alice.player.hp, on_bob.opponent.hp);
        assert_eq!(on_alice.last_log(), on_bob.last_log());

        alice.handle.leave().unwrap();
        alice.wait_for(|s| *s == Seen::Menu).await;
        alice.task.await.unwrap().unwrap();

        bob.wait_for(|s| *s == Seen::Left("alice".into())).await;
        assert_eq!(bob.wait_for(|s| matches!(s, Seen::Ended(_))).await, Seen::Ended(Side::Player));
        bob.wait_for(|s| *s == Seen::Menu).await;
        bob.task.await.unwrap().unwrap();

        let record = ledger.player("bob").unwrap();
        assert_eq!((record.wins, record.losses), (1, 0));
        assert!(ledger.player("alice").is_none());
        assert_eq!(channel.subscriber_count(ROOM), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_delivery_applied_once() {
        let channel = MemoryChannel::new().with_redelivery();
        let ledger = MemoryLedger::new();
        let (mut alice, mut bob) = paired(&channel, &ledger).await;

        start_battle(&mut alice, &mut bob).await;

        alice.handle.attack().unwrap();
        let on_alice = alice.next_update().await;
        let on_bob = bob.next_update().await;
        assert_eq!(on_alice.opponent.hp, on_bob.player.hp);

        // the redelivered copy must not produce a second update
        bob.handle.heal().unwrap();
        let after_heal = bob.next_update().await;
        assert_eq!(after_heal.player.heals_used, 1);
        assert_eq!(after_heal.player.hp, (on_bob.player.hp + 48).min(120));

        alice.handle.leave().unwrap();
        bob.handle.leave().unwrap();
        alice.task.await.unwrap().unwrap();
        bob.task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_opponent_returns_during_countdown() {
        let channel = MemoryChannel::new();
        let ledger = MemoryLedger::new();
        let (mut alice, bob) = paired(&channel, &ledger).await;

        bob.handle.leave().unwrap();
        bob.task.await.unwrap().unwrap();
        alice.wait_for(|s| *s == Seen::Left("bob".into())).await;
        assert_eq!(alice.wait_for(|s| matches!(s, Seen::Countdown(_))).await, Seen::Countdown(5));

        let mut bob = spawn_peer(&channel, &ledger, fighter("bob", 10), None, 3);
        alice.wait_for(|s| *s == Seen::Returned("bob".into())).await;
        bob.wait_for(|s| *s == Seen::Joined("alice".into())).await;

        start_battle(&mut alice, &mut bob).await;

        alice.handle.leave().unwrap();
        bob.handle.leave().unwrap();
        alice.task.await.unwrap().unwrap();
        bob.task.await.unwrap().unwrap();
        assert_eq!(channel.subscriber_count(ROOM), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejoin_mid_battle_restarts_in_lobby() {
        let channel = MemoryChannel::new();
        let ledger = MemoryLedger::new();
        let (mut alice, mut bob) = paired(&channel, &ledger).await;

        start_battle(&mut alice, &mut bob).await;
        alice.handle.attack().unwrap();
        alice.next_update().await;

        bob.handle.leave().unwrap();
        bob.task.await.unwrap().unwrap();
        alice.wait_for(|s| *s == Seen::Left("bob".into())).await;

        let mut bob = spawn_peer(&channel, &ledger, fighter("bob", 10), None, 4);
        alice.wait_for(|s| *s == Seen::Returned("bob".into())).await;
        alice.wait_for(|s| *s == Seen::Abandoned).await;
        bob.wait_for(|s| *s == Seen::Joined("alice".into())).await;

        // a fresh battle, both sides at full HP
        start_battle(&mut alice, &mut bob).await;
        alice.handle.attack().unwrap();
        let on_alice = alice.next_update().await;
        let on_bob = bob.next_update().await;
        assert_eq!(on_alice.player.hp, 120);
        assert_eq!(on_alice.opponent.hp, on_bob.player.hp);
        assert!(on_bob.is_player_turn);

        alice.handle.leave().unwrap();
        bob.handle.leave().unwrap();
        alice.task.await.unwrap().unwrap();
        bob.task.await.unwrap().unwrap();
        assert!(ledger.history().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_handle_leaves() {
        let channel = MemoryChannel::new();
        let ledger = MemoryLedger::new();
        let (alice, mut bob) = paired(&channel, &ledger).await;

        let Peer { handle, task, .. } = alice;
        drop(handle);
        task.await.unwrap().unwrap();

        bob.wait_for(|s| *s == Seen::Left("alice".into())).await;
        bob.wait_for(|s| *s == Seen::Menu).await;
        assert!(ledger.history().is_empty());
    }
}

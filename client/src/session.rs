//! Room synchronization state machine
//!
//! [`RoomSession`] is pure: every input (a room event, a local command, a
//! timer firing) returns the [`Effect`]s the caller must carry out. It never
//! publishes, sleeps or renders by itself, which keeps the protocol testable
//! without a transport.
//!
//! # Handshake
//!
//! ```text
//! joiner                         host
//!   │ ── user-joined(joiner) ──▶  │  record opponent
//!   │ ◀── host-reply(host) ─────  │  (host heuristic set)
//!   │ record opponent, clear host heuristic
//! ```
//!
//! Both sides then publish `player-ready`; once each has sent its own and
//! seen the other's, the battle starts after a short delay.

use std::time::Duration;

use gitbattle_battle::{
    Action, BattleState, RandomSource, Side, initialize_pvp_battle, outgoing_move,
    perform_player_turn,
};
use gitbattle_protocol::{BattleMove, Character, PlayerNotice, RoomEvent};

use crate::config::GameConfig;
use crate::results::Outcome;
use crate::timer::TimerKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LobbyState {
    NoOpponent,
    /// Opponent recorded, at least one side not ready
    OpponentPresent,
    BothReady,
}

/// Externally visible protocol state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Joining,
    Lobby(LobbyState),
    InBattle,
    Terminated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Joining,
    Lobby,
    InBattle,
    Terminated,
}

/// Something the session needs done on its behalf
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Publish(RoomEvent),
    Schedule(TimerKind, Duration),
    Cancel(TimerKind),
    CancelAll,
    OpponentJoined(Character),
    OpponentReady(String),
    OpponentLeft(String),
    OpponentReturned(Character),
    /// Ticks left before the absent opponent is given up on
    Countdown(u32),
    BattleStarted(BattleState),
    /// The unfinished battle was dropped and both sides are back in the lobby
    BattleAbandoned,
    BattleUpdated(BattleState),
    BattleEnded { winner: Side, state: BattleState },
    RecordResult { outcome: Outcome, opponent: String },
    ReturnToMenu,
}

/// Unique ids for outgoing moves
#[derive(Debug, Clone)]
pub struct MoveIdGenerator {
    prefix: String,
    counter: u64,
}

impl MoveIdGenerator {
    pub fn new(username: &str) -> Self {
        Self {
            prefix: format!("{}-{:08x}", username, rand::random::<u32>()),
            counter: 0,
        }
    }

    pub fn next_id(&mut self) -> String {
        self.counter += 1;
        format!("{}-{}", self.prefix, self.counter)
    }
}

/// One participant's view of a two-player room
pub struct RoomSession<R> {
    room: String,
    me: Character,
    opponent: Option<Character>,
    /// Opponent who left and may still come back
    departed: Option<Character>,
    /// Entered without a known opponent; answers `user-joined`
    is_host: bool,
    phase: Phase,
    me_ready: bool,
    /// Username that declared ready
    opponent_ready: Option<String>,
    start_pending: bool,
    battle: Option<BattleState>,
    last_move_id: Option<String>,
    countdown: Option<u32>,
    move_ids: MoveIdGenerator,
    config: GameConfig,
    rng: R,
}

impl<R: RandomSource> RoomSession<R> {
    /// A session for `me` in `room`
    ///
    /// Passing a known `opponent` (e.g. the host listed in the room
    /// directory) means this participant is not the host.
    pub fn new(
        room: impl Into<String>,
        me: Character,
        opponent: Option<Character>,
        config: GameConfig,
        rng: R,
    ) -> Self {
        let move_ids = MoveIdGenerator::new(&me.username);
        Self {
            room: room.into(),
            is_host: opponent.is_none(),
            me,
            opponent,
            departed: None,
            phase: Phase::Idle,
            me_ready: false,
            opponent_ready: None,
            start_pending: false,
            battle: None,
            last_move_id: None,
            countdown: None,
            move_ids,
            config,
            rng,
        }
    }

    pub fn room(&self) -> &str {
        &self.room
    }

    pub fn me(&self) -> &Character {
        &self.me
    }

    pub fn opponent(&self) -> Option<&Character> {
        self.opponent.as_ref()
    }

    pub fn is_host(&self) -> bool {
        self.is_host
    }

    pub fn battle(&self) -> Option<&BattleState> {
        self.battle.as_ref()
    }

    pub fn countdown(&self) -> Option<u32> {
        self.countdown
    }

    pub fn is_terminated(&self) -> bool {
        self.phase == Phase::Terminated
    }

    pub fn state(&self) -> SessionState {
        match self.phase {
            Phase::Idle => SessionState::Idle,
            Phase::Joining => SessionState::Joining,
            Phase::Lobby if self.opponent.is_none() => SessionState::Lobby(LobbyState::NoOpponent),
            Phase::Lobby if self.me_ready && self.opponent_is_ready() => {
                SessionState::Lobby(LobbyState::BothReady)
            }
            Phase::Lobby => SessionState::Lobby(LobbyState::OpponentPresent),
            Phase::InBattle => SessionState::InBattle,
            Phase::Terminated => SessionState::Terminated,
        }
    }

    /// About to subscribe to the room
    pub fn enter(&mut self) -> Vec<Effect> {
        if self.phase == Phase::Idle {
            self.phase = Phase::Joining;
        }
        Vec::new()
    }

    /// Subscription is live: announce ourselves
    pub fn joined(&mut self) -> Vec<Effect> {
        if self.phase != Phase::Joining {
            return Vec::new();
        }
        self.phase = Phase::Lobby;
        vec![Effect::Publish(RoomEvent::UserJoined(self.me.clone()))]
    }

    /// Feed one event received on the room channel
    pub fn handle_event(&mut self, event: RoomEvent) -> Vec<Effect> {
        if matches!(self.phase, Phase::Idle | Phase::Terminated) {
            return Vec::new();
        }
        if event.sender() == self.me.username {
            return Vec::new();
        }

        match event {
            RoomEvent::UserJoined(character) => self.on_user_joined(character),
            RoomEvent::HostReply(character) => self.on_host_reply(character),
            RoomEvent::PlayerReady(notice) => self.on_player_ready(notice),
            RoomEvent::PlayerLeft(notice) => self.on_player_left(notice),
            RoomEvent::BattleMove(mv) => self.on_battle_move(mv),
        }
    }

    /// Local player confirmed readiness
    pub fn mark_ready(&mut self) -> Vec<Effect> {
        if self.phase != Phase::Lobby || self.opponent.is_none() || self.me_ready {
            return Vec::new();
        }

        self.me_ready = true;
        let mut effects = vec![Effect::Publish(RoomEvent::PlayerReady(PlayerNotice::new(
            self.me.username.clone(),
        )))];
        self.check_start(&mut effects);
        effects
    }

    /// Resolve a local action and replicate it
    ///
    /// Refused while the opponent is away, out of turn, or when the engine
    /// rejects the action.
    pub fn act(&mut self, action: Action) -> Vec<Effect> {
        if self.phase != Phase::InBattle {
            return Vec::new();
        }
        let (Some(battle), Some(opponent)) = (&self.battle, &self.opponent) else {
            return Vec::new();
        };

        let next = perform_player_turn(battle, &self.me, opponent, action, &mut self.rng);
        if next == *battle {
            return Vec::new();
        }

        let mv = outgoing_move(&self.me.username, battle, &next, self.move_ids.next_id());
        let mut effects = vec![
            Effect::Publish(RoomEvent::BattleMove(mv)),
            Effect::BattleUpdated(next.clone()),
        ];
        self.finish_if_over(&next, &mut effects);
        self.battle = Some(next);
        effects
    }

    pub fn on_timer(&mut self, kind: TimerKind) -> Vec<Effect> {
        match kind {
            TimerKind::BattleStart => self.start_battle(),
            TimerKind::Countdown => self.tick_countdown(),
            TimerKind::AiTurn => Vec::new(),
        }
    }

    /// Local player walks away
    pub fn leave(&mut self) -> Vec<Effect> {
        let previous = self.phase;
        if previous == Phase::Terminated {
            return Vec::new();
        }
        self.phase = Phase::Terminated;
        self.countdown = None;
        self.start_pending = false;

        let mut effects = Vec::new();
        if previous != Phase::Idle {
            effects.push(Effect::Publish(RoomEvent::PlayerLeft(PlayerNotice::new(
                self.me.username.clone(),
            ))));
        }
        effects.push(Effect::CancelAll);
        effects.push(Effect::ReturnToMenu);
        effects
    }

    fn opponent_is_ready(&self) -> bool {
        match (&self.opponent, &self.opponent_ready) {
            (Some(opponent), Some(ready)) => opponent.username == *ready,
            _ => false,
        }
    }

    fn is_opponent(&self, username: &str) -> bool {
        self.opponent
            .as_ref()
            .is_some_and(|opponent| opponent.username == username)
    }

    fn is_departed(&self, username: &str) -> bool {
        self.departed
            .as_ref()
            .is_some_and(|departed| departed.username == username)
    }

    fn host_reply(&self) -> Effect {
        Effect::Publish(RoomEvent::HostReply(self.me.clone()))
    }

    fn on_user_joined(&mut self, character: Character) -> Vec<Effect> {
        if self.is_departed(&character.username) {
            // a returning peer always needs to learn who it is paired with
            let mut effects = self.restore_opponent(character);
            effects.push(self.host_reply());
            return effects;
        }

        if self.is_opponent(&character.username) {
            self.opponent = Some(character);
            return if self.is_host {
                vec![self.host_reply()]
            } else {
                Vec::new()
            };
        }

        if !self.accepts_new_opponent() {
            tracing::debug!(room = %self.room, username = %character.username, "Ignoring extra participant");
            return Vec::new();
        }

        self.opponent = Some(character.clone());
        let mut effects = vec![Effect::OpponentJoined(character)];
        self.replay_early_ready(&mut effects);
        if self.is_host {
            effects.push(self.host_reply());
        }
        effects
    }

    fn on_host_reply(&mut self, character: Character) -> Vec<Effect> {
        if self.is_departed(&character.username) {
            self.is_host = false;
            return self.restore_opponent(character);
        }

        if self.is_opponent(&character.username) {
            self.is_host = false;
            self.opponent = Some(character);
            return Vec::new();
        }

        if !self.accepts_new_opponent() {
            tracing::debug!(room = %self.room, username = %character.username, "Ignoring extra participant");
            return Vec::new();
        }

        self.is_host = false;
        self.opponent = Some(character.clone());
        let mut effects = vec![Effect::OpponentJoined(character)];
        self.replay_early_ready(&mut effects);
        effects
    }

    fn accepts_new_opponent(&self) -> bool {
        self.opponent.is_none()
            && self.departed.is_none()
            && matches!(self.phase, Phase::Joining | Phase::Lobby)
    }

    fn restore_opponent(&mut self, character: Character) -> Vec<Effect> {
        tracing::info!(room = %self.room, username = %character.username, "Opponent returned");
        self.departed = None;
        self.countdown = None;
        self.opponent = Some(character.clone());
        let mut effects = vec![
            Effect::Cancel(TimerKind::Countdown),
            Effect::OpponentReturned(character),
        ];

        // the returning peer starts over in its lobby, so the old battle
        // can never progress; both sides ready up again
        if self.phase == Phase::InBattle {
            tracing::info!(room = %self.room, "Abandoning battle for a rematch");
            self.phase = Phase::Lobby;
            self.battle = None;
            self.last_move_id = None;
            self.me_ready = false;
            self.opponent_ready = None;
            self.start_pending = false;
            effects.push(Effect::BattleAbandoned);
        }

        self.replay_early_ready(&mut effects);
        effects
    }

    /// Surface a `player-ready` that arrived before its sender was paired
    fn replay_early_ready(&mut self, effects: &mut Vec<Effect>) {
        if !self.opponent_is_ready() {
            return;
        }
        if let Some(username) = &self.opponent_ready {
            effects.push(Effect::OpponentReady(username.clone()));
        }
        self.check_start(effects);
    }

    fn on_player_ready(&mut self, notice: PlayerNotice) -> Vec<Effect> {
        if self.phase != Phase::Lobby {
            return Vec::new();
        }
        // readiness may arrive before the join it belongs to
        if self.opponent.is_some() && !self.is_opponent(&notice.username) {
            return Vec::new();
        }

        let newly = self.opponent_ready.as_deref() != Some(notice.username.as_str());
        self.opponent_ready = Some(notice.username.clone());

        let mut effects = Vec::new();
        if newly && self.opponent.is_some() {
            effects.push(Effect::OpponentReady(notice.username));
        }
        self.check_start(&mut effects);
        effects
    }

    fn on_player_left(&mut self, notice: PlayerNotice) -> Vec<Effect> {
        if !self.is_opponent(&notice.username) {
            return Vec::new();
        }

        tracing::info!(room = %self.room, username = %notice.username, "Opponent left");
        self.departed = self.opponent.take();
        self.me_ready = false;
        self.opponent_ready = None;

        let mut effects = vec![Effect::OpponentLeft(notice.username)];
        if self.start_pending {
            self.start_pending = false;
            effects.push(Effect::Cancel(TimerKind::BattleStart));
        }

        let ticks = self.config.countdown_ticks;
        if ticks == 0 {
            effects.extend(self.expire_countdown());
            return effects;
        }

        self.countdown = Some(ticks);
        effects.push(Effect::Countdown(ticks));
        effects.push(Effect::Schedule(TimerKind::Countdown, self.config.countdown_tick()));
        effects
    }

    fn on_battle_move(&mut self, mv: BattleMove) -> Vec<Effect> {
        if self.phase != Phase::InBattle || !self.is_opponent(&mv.attacker) {
            return Vec::new();
        }
        if self.last_move_id.as_deref() == Some(mv.move_id.as_str()) {
            tracing::debug!(room = %self.room, move_id = %mv.move_id, "Discarding duplicate move");
            return Vec::new();
        }
        let Some(battle) = &self.battle else {
            return Vec::new();
        };
        if battle.is_over() {
            return Vec::new();
        }

        let next = battle.apply_move(&mv);
        self.last_move_id = Some(mv.move_id);

        let mut effects = vec![Effect::BattleUpdated(next.clone())];
        self.finish_if_over(&next, &mut effects);
        self.battle = Some(next);
        effects
    }

    fn check_start(&mut self, effects: &mut Vec<Effect>) {
        if self.phase == Phase::Lobby && self.me_ready && self.opponent_is_ready() && !self.start_pending {
            self.start_pending = true;
            effects.push(Effect::Schedule(
                TimerKind::BattleStart,
                self.config.battle_start_delay(),
            ));
        }
    }

    fn start_battle(&mut self) -> Vec<Effect> {
        if !self.start_pending {
            return Vec::new();
        }
        self.start_pending = false;

        if self.phase != Phase::Lobby || !self.me_ready || !self.opponent_is_ready() {
            return Vec::new();
        }
        let Some(opponent) = &self.opponent else {
            return Vec::new();
        };

        let state = initialize_pvp_battle(&self.me, opponent);
        tracing::info!(room = %self.room, opponent = %opponent.username, "Battle started");

        self.phase = Phase::InBattle;
        self.last_move_id = None;
        self.battle = Some(state.clone());
        vec![Effect::BattleStarted(state)]
    }

    fn tick_countdown(&mut self) -> Vec<Effect> {
        let Some(left) = self.countdown else {
            return Vec::new();
        };

        let left = left.saturating_sub(1);
        if left == 0 {
            return self.expire_countdown();
        }

        self.countdown = Some(left);
        vec![
            Effect::Countdown(left),
            Effect::Schedule(TimerKind::Countdown, self.config.countdown_tick()),
        ]
    }

    /// The opponent did not come back in time
    fn expire_countdown(&mut self) -> Vec<Effect> {
        self.countdown = None;
        let mut effects = Vec::new();

        if self.phase == Phase::InBattle
            && let Some(battle) = &self.battle
            && !battle.is_over()
        {
            let name = self
                .departed
                .as_ref()
                .map(|departed| departed.username.as_str())
                .unwrap_or("Opponent");
            let next = battle.forfeit(Side::Opponent, name);
            effects.push(Effect::BattleUpdated(next.clone()));
            self.finish_if_over(&next, &mut effects);
            self.battle = Some(next);
        }

        self.phase = Phase::Terminated;
        effects.push(Effect::CancelAll);
        effects.push(Effect::ReturnToMenu);
        effects
    }

    fn finish_if_over(&self, state: &BattleState, effects: &mut Vec<Effect>) {
        let Some(winner) = state.winner else {
            return;
        };

        let opponent = self
            .opponent
            .as_ref()
            .or(self.departed.as_ref())
            .map(|character| character.username.clone())
            .unwrap_or_default();

        effects.push(Effect::BattleEnded {
            winner,
            state: state.clone(),
        });
        effects.push(Effect::RecordResult {
            outcome: Outcome::for_winner(winner),
            opponent,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gitbattle_battle::SequenceRandom;
    use gitbattle_protocol::{ClassTag, Stats};

    fn character(name: &str, speed: u32) -> Character {
        Character::new(
            name,
            "",
            ClassTag::FrontendWarrior,
            Stats {
                hp: 100,
                attack: 20,
                defense: 10,
                speed,
            },
        )
    }

    fn session(me: &str, opponent: Option<Character>) -> RoomSession<SequenceRandom> {
        RoomSession::new(
            "ROOM01",
            character(me, 20),
            opponent,
            GameConfig::default(),
            SequenceRandom::new(vec![0.75, 0.99]),
        )
    }

    fn ready(name: &str) -> RoomEvent {
        RoomEvent::PlayerReady(PlayerNotice::new(name))
    }

    fn left(name: &str) -> RoomEvent {
        RoomEvent::PlayerLeft(PlayerNotice::new(name))
    }

    fn bob_move(move_id: &str, damage: u32) -> RoomEvent {
        RoomEvent::BattleMove(BattleMove {
            attacker: "bob".into(),
            damage,
            heal: 0,
            recoil: 0,
            log_message: format!("bob hits alice for {damage} DMG!"),
            move_id: move_id.into(),
        })
    }

    fn lobby_with_bob() -> RoomSession<SequenceRandom> {
        let mut session = session("alice", None);
        session.enter();
        session.joined();
        session.handle_event(RoomEvent::UserJoined(character("bob", 10)));
        session
    }

    fn in_battle() -> RoomSession<SequenceRandom> {
        let mut session = lobby_with_bob();
        session.mark_ready();
        session.handle_event(ready("bob"));
        session.on_timer(TimerKind::BattleStart);
        session
    }

    #[test]
    fn test_enter_announces() {
        let mut session = session("alice", None);
        assert_eq!(session.state(), SessionState::Idle);

        assert!(session.enter().is_empty());
        assert_eq!(session.state(), SessionState::Joining);

        let effects = session.joined();
        assert_eq!(
            effects,
            vec![Effect::Publish(RoomEvent::UserJoined(character("alice", 20)))]
        );
        assert_eq!(session.state(), SessionState::Lobby(LobbyState::NoOpponent));
    }

    #[test]
    fn test_host_replies_to_join() {
        let mut session = session("alice", None);
        session.enter();
        session.joined();
        assert!(session.is_host());

        let effects = session.handle_event(RoomEvent::UserJoined(character("bob", 10)));

        assert_eq!(
            effects,
            vec![
                Effect::OpponentJoined(character("bob", 10)),
                Effect::Publish(RoomEvent::HostReply(character("alice", 20))),
            ]
        );
        assert_eq!(session.state(), SessionState::Lobby(LobbyState::OpponentPresent));
    }

    #[test]
    fn test_host_reply_clears_heuristic() {
        let mut session = session("bob", None);
        session.enter();
        session.joined();

        let effects = session.handle_event(RoomEvent::HostReply(character("alice", 20)));
        assert_eq!(effects, vec![Effect::OpponentJoined(character("alice", 20))]);
        assert!(!session.is_host());

        // a late copy of the host's own join needs no answer now
        let effects = session.handle_event(RoomEvent::UserJoined(character("alice", 20)));
        assert!(effects.is_empty());
    }

    #[test]
    fn test_own_join_echo_ignored() {
        let mut session = session("alice", None);
        session.enter();
        session.joined();

        let effects = session.handle_event(RoomEvent::UserJoined(character("alice", 20)));

        assert!(effects.is_empty());
        assert!(session.opponent().is_none());
    }

    #[test]
    fn test_known_opponent_is_not_host() {
        let mut session = session("bob", Some(character("alice", 20)));
        session.enter();
        session.joined();

        assert!(!session.is_host());
        assert_eq!(session.state(), SessionState::Lobby(LobbyState::OpponentPresent));
        assert!(session.handle_event(RoomEvent::UserJoined(character("alice", 20))).is_empty());
    }

    #[test]
    fn test_third_participant_ignored() {
        let mut session = lobby_with_bob();
        let effects = session.handle_event(RoomEvent::UserJoined(character("carol", 30)));

        assert!(effects.is_empty());
        assert_eq!(session.opponent().map(|c| c.username.as_str()), Some("bob"));
    }

    #[test]
    fn test_ready_check() {
        let mut session = lobby_with_bob();

        let effects = session.mark_ready();
        assert_eq!(effects, vec![Effect::Publish(ready("alice"))]);
        assert_eq!(session.state(), SessionState::Lobby(LobbyState::OpponentPresent));

        let effects = session.handle_event(ready("bob"));
        assert_eq!(
            effects,
            vec![
                Effect::OpponentReady("bob".into()),
                Effect::Schedule(TimerKind::BattleStart, Duration::from_millis(500)),
            ]
        );
        assert_eq!(session.state(), SessionState::Lobby(LobbyState::BothReady));

        let effects = session.on_timer(TimerKind::BattleStart);
        assert!(matches!(effects.as_slice(), [Effect::BattleStarted(state)] if state.is_player_turn));
        assert_eq!(session.state(), SessionState::InBattle);
    }

    #[test]
    fn test_ready_before_join() {
        let mut session = session("alice", None);
        session.enter();
        session.joined();

        assert!(session.handle_event(ready("bob")).is_empty());
        session.handle_event(RoomEvent::UserJoined(character("bob", 10)));

        let effects = session.mark_ready();
        assert_eq!(effects.len(), 2);
        assert!(matches!(effects[1], Effect::Schedule(TimerKind::BattleStart, _)));
    }

    #[test]
    fn test_ready_without_opponent_refused() {
        let mut session = session("alice", None);
        session.enter();
        session.joined();

        assert!(session.mark_ready().is_empty());
    }

    #[test]
    fn test_leave_before_start_cancels_it() {
        let mut session = lobby_with_bob();
        session.mark_ready();
        session.handle_event(ready("bob"));

        let effects = session.handle_event(left("bob"));
        assert_eq!(
            effects,
            vec![
                Effect::OpponentLeft("bob".into()),
                Effect::Cancel(TimerKind::BattleStart),
                Effect::Countdown(5),
                Effect::Schedule(TimerKind::Countdown, Duration::from_millis(1000)),
            ]
        );

        // a firing that raced the cancel changes nothing
        assert!(session.on_timer(TimerKind::BattleStart).is_empty());
        assert_eq!(session.state(), SessionState::Lobby(LobbyState::NoOpponent));
    }

    #[test]
    fn test_act_publishes_move() {
        let mut session = in_battle();

        let effects = session.act(Action::Attack);

        let [Effect::Publish(RoomEvent::BattleMove(mv)), Effect::BattleUpdated(state)] = effects.as_slice() else {
            panic!("unexpected effects: {effects:?}");
        };
        assert_eq!(mv.attacker, "alice");
        assert_eq!(mv.damage, 32);
        assert!(mv.move_id.starts_with("alice-"));
        assert_eq!(state.opponent.hp, 68);
        assert!(!state.is_player_turn);

        // not our turn any more
        assert!(session.act(Action::Attack).is_empty());
    }

    #[test]
    fn test_move_ids_unique() {
        let mut ids = MoveIdGenerator::new("alice");
        let first = ids.next_id();
        assert_ne!(first, ids.next_id());
    }

    #[test]
    fn test_duplicate_move_ignored() {
        let mut session = in_battle();
        session.act(Action::Attack);

        let effects = session.handle_event(bob_move("bob-1", 20));
        assert_eq!(effects.len(), 1);
        let after_first = session.battle().cloned();
        assert_eq!(after_first.as_ref().map(|b| b.player.hp), Some(80));

        assert!(session.handle_event(bob_move("bob-1", 20)).is_empty());
        assert_eq!(session.battle().cloned(), after_first);
    }

    #[test]
    fn test_move_from_stranger_ignored() {
        let mut session = in_battle();
        let RoomEvent::BattleMove(mut mv) = bob_move("x-1", 50) else {
            unreachable!()
        };
        mv.attacker = "mallory".into();

        assert!(session.handle_event(RoomEvent::BattleMove(mv)).is_empty());
        assert_eq!(session.battle().map(|b| b.player.hp), Some(100));
    }

    #[test]
    fn test_own_move_echo_ignored() {
        let mut session = in_battle();
        let effects = session.act(Action::Attack);
        let Some(Effect::Publish(echo)) = effects.first().cloned() else {
            panic!("no move published");
        };

        assert!(session.handle_event(echo).is_empty());
    }

    #[test]
    fn test_knocked_out_by_peer() {
        let mut session = in_battle();
        session.act(Action::Attack);

        let effects = session.handle_event(bob_move("bob-1", 150));

        assert_eq!(effects.len(), 3);
        assert!(matches!(
            effects[1],
            Effect::BattleEnded {
                winner: Side::Opponent,
                ..
            }
        ));
        assert_eq!(
            effects[2],
            Effect::RecordResult {
                outcome: Outcome::Loss,
                opponent: "bob".into()
            }
        );
        // finished battles take no more moves
        assert!(session.handle_event(bob_move("bob-2", 5)).is_empty());
    }

    #[test]
    fn test_disconnect_and_rejoin() {
        let mut session = session("bob", Some(character("alice", 20)));
        session.enter();
        session.joined();

        session.handle_event(left("alice"));
        assert!(session.opponent().is_none());
        assert_eq!(session.countdown(), Some(5));

        assert_eq!(
            session.on_timer(TimerKind::Countdown),
            vec![
                Effect::Countdown(4),
                Effect::Schedule(TimerKind::Countdown, Duration::from_millis(1000)),
            ]
        );

        let effects = session.handle_event(RoomEvent::UserJoined(character("alice", 20)));
        assert_eq!(
            effects,
            vec![
                Effect::Cancel(TimerKind::Countdown),
                Effect::OpponentReturned(character("alice", 20)),
                Effect::Publish(RoomEvent::HostReply(character("bob", 20))),
            ]
        );
        assert_eq!(session.countdown(), None);
        assert_eq!(session.state(), SessionState::Lobby(LobbyState::OpponentPresent));

        // the stale tick is a no-op
        assert!(session.on_timer(TimerKind::Countdown).is_empty());
    }

    #[test]
    fn test_rejoin_via_host_reply() {
        let mut session = lobby_with_bob();
        session.handle_event(left("bob"));

        let effects = session.handle_event(RoomEvent::HostReply(character("bob", 10)));
        assert_eq!(
            effects,
            vec![
                Effect::Cancel(TimerKind::Countdown),
                Effect::OpponentReturned(character("bob", 10)),
            ]
        );
    }

    #[test]
    fn test_rejoin_mid_battle_returns_to_lobby() {
        let mut session = in_battle();
        session.act(Action::Attack);
        session.handle_event(bob_move("bob-1", 20));
        session.handle_event(left("bob"));

        let effects = session.handle_event(RoomEvent::UserJoined(character("bob", 10)));
        assert_eq!(
            effects,
            vec![
                Effect::Cancel(TimerKind::Countdown),
                Effect::OpponentReturned(character("bob", 10)),
                Effect::BattleAbandoned,
                Effect::Publish(RoomEvent::HostReply(character("alice", 20))),
            ]
        );
        assert_eq!(session.state(), SessionState::Lobby(LobbyState::OpponentPresent));
        assert!(session.battle().is_none());
        assert!(session.act(Action::Attack).is_empty());

        // the returning peer readies from its fresh lobby
        assert_eq!(
            session.handle_event(ready("bob")),
            vec![Effect::OpponentReady("bob".into())]
        );
        session.mark_ready();
        let effects = session.on_timer(TimerKind::BattleStart);
        let [Effect::BattleStarted(state)] = effects.as_slice() else {
            panic!("unexpected effects: {effects:?}");
        };
        assert_eq!((state.player.hp, state.opponent.hp), (100, 100));

        // a move id from the old battle is not mistaken for a duplicate
        assert_eq!(session.act(Action::Attack).len(), 2);
        assert_eq!(session.handle_event(bob_move("bob-1", 20)).len(), 1);
    }

    #[test]
    fn test_early_ready_surfaces_on_pairing() {
        let mut session = session("alice", None);
        session.enter();
        session.joined();

        session.handle_event(ready("bob"));
        let effects = session.handle_event(RoomEvent::UserJoined(character("bob", 10)));

        assert_eq!(
            effects,
            vec![
                Effect::OpponentJoined(character("bob", 10)),
                Effect::OpponentReady("bob".into()),
                Effect::Publish(RoomEvent::HostReply(character("alice", 20))),
            ]
        );
    }

    #[test]
    fn test_early_ready_surfaces_on_host_reply() {
        let mut session = session("bob", None);
        session.enter();
        session.joined();

        session.handle_event(ready("alice"));
        let effects = session.handle_event(RoomEvent::HostReply(character("alice", 20)));

        assert_eq!(
            effects,
            vec![
                Effect::OpponentJoined(character("alice", 20)),
                Effect::OpponentReady("alice".into()),
            ]
        );
        assert!(session.mark_ready().iter().any(|e| matches!(e, Effect::Schedule(TimerKind::BattleStart, _))));
    }

    #[test]
    fn test_stranger_cannot_take_departed_seat() {
        let mut session = lobby_with_bob();
        session.handle_event(left("bob"));

        assert!(session.handle_event(RoomEvent::UserJoined(character("carol", 10))).is_empty());
        assert!(session.opponent().is_none());
    }

    #[test]
    fn test_countdown_expiry_forfeits_battle() {
        let mut session = in_battle();
        session.handle_event(left("bob"));

        // refused while the opponent is away
        assert!(session.act(Action::Attack).is_empty());

        for _ in 0..4 {
            session.on_timer(TimerKind::Countdown);
        }
        let effects = session.on_timer(TimerKind::Countdown);

        assert_eq!(effects.len(), 5);
        let Effect::BattleUpdated(state) = &effects[0] else {
            panic!("unexpected effects: {effects:?}");
        };
        assert_eq!(state.winner, Some(Side::Player));
        assert_eq!(state.last_log(), Some("bob fled the battle!"));
        assert_eq!(
            effects[2],
            Effect::RecordResult {
                outcome: Outcome::Win,
                opponent: "bob".into()
            }
        );
        assert_eq!(&effects[3..], [Effect::CancelAll, Effect::ReturnToMenu]);
        assert_eq!(session.state(), SessionState::Terminated);
    }

    #[test]
    fn test_countdown_expiry_in_lobby() {
        let mut session = lobby_with_bob();
        session.handle_event(left("bob"));

        for _ in 0..4 {
            session.on_timer(TimerKind::Countdown);
        }
        let effects = session.on_timer(TimerKind::Countdown);

        assert_eq!(effects, vec![Effect::CancelAll, Effect::ReturnToMenu]);
        assert!(session.is_terminated());
    }

    #[test]
    fn test_leave() {
        let mut session = in_battle();

        let effects = session.leave();
        assert_eq!(
            effects,
            vec![Effect::Publish(left("alice")), Effect::CancelAll, Effect::ReturnToMenu]
        );
        assert!(session.is_terminated());

        assert!(session.leave().is_empty());
        assert!(session.handle_event(bob_move("bob-1", 10)).is_empty());
    }
}

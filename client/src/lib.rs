//! Turn orchestration and room synchronization for Git Battle.
//!
//! Two ways to play sit on top of the pure engine in `gitbattle-battle`:
//!
//! - [`PveArena`] paces a battle against a scripted opponent, waiting a
//!   short "thinking" delay before each AI turn.
//! - [`RoomRunner`] keeps two players' copies of one battle in agreement
//!   over a broadcast room channel, handling lobby readiness, duplicate
//!   delivery, disconnects and reconnection.
//!
//! # Overview
//!
//! ```text
//!  GameHandle ──commands──┐
//!                         ▼
//!  RoomChannel ─events─> RoomRunner ──effects──> GameHandler
//!  (memory / relay)       │    ▲                  ResultRecorder
//!                         ▼    │
//!                      RoomSession (pure state machine)
//!                         │
//!                         ▼
//!                  gitbattle-battle (engine)
//! ```
//!
//! Everything that touches the outside world sits behind a trait:
//! [`RoomChannel`], [`RoomDirectory`], [`ProfileLookup`],
//! [`ResultRecorder`] and [`GameHandler`]. In-memory implementations of
//! each ship with the crate for tests and local play.
//!
//! # Example Usage
//!
//! ```ignore
//! use gitbattle_client::{GameConfig, GameHandle, MemoryChannel, MemoryLedger};
//! use gitbattle_client::{RngSource, RoomRunner, RoomSession};
//!
//! let session = RoomSession::new("ABC234", me, None, GameConfig::default(), RngSource::seeded(rand::random()));
//! let (handle, commands) = GameHandle::channel();
//! let mut runner = RoomRunner::new(session, MemoryChannel::new(), MyHandler, MemoryLedger::new());
//!
//! tokio::spawn(async move { runner.run(commands).await });
//! handle.ready()?;
//! ```

pub mod config;
pub mod directory;
pub mod error;
pub mod handle;
pub mod handler;
pub mod profile;
pub mod pve;
pub mod results;
pub mod runner;
pub mod session;
pub mod timer;
pub mod transport;

pub use config::GameConfig;
pub use directory::{MemoryDirectory, RoomDirectory, generate_code, normalize_code};
pub use error::GameError;
pub use handle::{Command, GameHandle};
pub use handler::GameHandler;
pub use profile::{GithubProfiles, ProfileLookup, RawProfile, derive_character, fallback_character, summon};
pub use pve::{PveArena, PveBattle};
pub use results::{BattleRecord, MemoryLedger, Outcome, PlayerRecord, ResultRecorder};
pub use runner::RoomRunner;
pub use session::{Effect, LobbyState, RoomSession, SessionState};
pub use transport::{MemoryChannel, ReconnectPolicy, RelayChannel, RoomChannel, Subscription};

// Re-export commonly used engine and wire types
pub use gitbattle_battle::{Action, AiPolicy, BattleState, RngSource, Side};
pub use gitbattle_protocol::{BattleMove, Character, ClassTag, RoomEvent, RoomInfo, RoomListing, Stats};

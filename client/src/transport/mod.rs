//! Room channel transports
//!
//! A room channel is broadcast pub/sub: every subscriber of a room receives
//! every event published to it, the publisher's own included. Delivery is
//! at-least-once and unordered across senders, so consumers filter echoes
//! and duplicates themselves.

mod memory;
mod relay;

use std::future::Future;

use anyhow::Result;
use gitbattle_protocol::{RoomEvent, parse_room_event};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

pub use memory::MemoryChannel;
pub use relay::{ReconnectPolicy, RelayChannel};

/// Buffered events per room before slow subscribers start lagging
pub(crate) const ROOM_BUFFER: usize = 64;

pub trait RoomChannel: Send + Sync {
    fn subscribe(&self, room: &str) -> impl Future<Output = Result<Subscription>> + Send;

    fn publish(&self, room: &str, event: &RoomEvent) -> impl Future<Output = Result<()>> + Send;
}

type ReleaseHook = Box<dyn FnOnce() + Send>;

/// Live subscription to one room
///
/// Released on [`unsubscribe_all`](Self::unsubscribe_all) or when dropped,
/// whichever comes first.
pub struct Subscription {
    room: String,
    rx: broadcast::Receiver<String>,
    on_release: Option<ReleaseHook>,
}

impl Subscription {
    pub(crate) fn new(room: impl Into<String>, rx: broadcast::Receiver<String>) -> Self {
        Self {
            room: room.into(),
            rx,
            on_release: None,
        }
    }

    pub(crate) fn on_release(mut self, hook: impl FnOnce() + Send + 'static) -> Self {
        self.on_release = Some(Box::new(hook));
        self
    }

    pub fn room(&self) -> &str {
        &self.room
    }

    /// Next well-formed event, or `None` once the room is gone
    ///
    /// Malformed payloads are logged and skipped.
    pub async fn recv(&mut self) -> Option<RoomEvent> {
        loop {
            match self.rx.recv().await {
                Ok(text) => match parse_room_event(&text) {
                    Ok(event) => return Some(event),
                    Err(e) => {
                        tracing::warn!(room = %self.room, error = %e, "Dropping malformed room event");
                    }
                },
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(room = %self.room, skipped, "Room subscriber lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    pub fn unsubscribe_all(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(hook) = self.on_release.take() {
            hook();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

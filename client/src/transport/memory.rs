use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};
use gitbattle_protocol::RoomEvent;
use tokio::sync::broadcast;

use super::{ROOM_BUFFER, RoomChannel, Subscription};

/// In-process room channel
///
/// Clones share the same rooms. With redelivery on, every event is
/// delivered twice to exercise duplicate filtering.
#[derive(Debug, Clone, Default)]
pub struct MemoryChannel {
    rooms: Arc<Mutex<HashMap<String, broadcast::Sender<String>>>>,
    redeliver: bool,
}

impl MemoryChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_redelivery(mut self) -> Self {
        self.redeliver = true;
        self
    }

    /// Live subscriptions to `room`
    pub fn subscriber_count(&self, room: &str) -> usize {
        self.rooms
            .lock()
            .ok()
            .and_then(|rooms| rooms.get(room).map(broadcast::Sender::receiver_count))
            .unwrap_or(0)
    }

    /// Push raw text into a room, bypassing encoding
    pub fn inject(&self, room: &str, text: impl Into<String>) -> Result<()> {
        let sender = self.sender(room)?;
        let _ = sender.send(text.into());
        Ok(())
    }

    fn sender(&self, room: &str) -> Result<broadcast::Sender<String>> {
        let mut rooms = self
            .rooms
            .lock()
            .map_err(|_| anyhow!("Memory channel lock poisoned"))?;
        let sender = rooms
            .entry(room.to_string())
            .or_insert_with(|| broadcast::channel(ROOM_BUFFER).0);
        Ok(sender.clone())
    }
}

impl RoomChannel for MemoryChannel {
    async fn subscribe(&self, room: &str) -> Result<Subscription> {
        let rx = self.sender(room)?.subscribe();
        Ok(Subscription::new(room, rx))
    }

    async fn publish(&self, room: &str, event: &RoomEvent) -> Result<()> {
        let text = event.to_wire()?;
        let sender = self.sender(room)?;

        // no subscribers is not an error for pub/sub
        if self.redeliver {
            let _ = sender.send(text.clone());
        }
        let _ = sender.send(text);
        Ok(())
    }
}

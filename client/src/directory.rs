//! Room codes and the open-room list

use std::future::Future;
use std::sync::RwLock;

use anyhow::{Result, anyhow, bail};
use gitbattle_protocol::{RoomInfo, RoomListing, RoomStatus};
use rand::Rng;

use crate::error::GameError;

/// Characters room codes are drawn from; no 0/O or 1/I
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

pub const CODE_LENGTH: usize = 6;

const MAX_CODE_ATTEMPTS: usize = 32;

pub trait RoomDirectory: Send + Sync {
    /// Register a room and return its code
    fn create_room(&self, host: &str, is_private: bool) -> impl Future<Output = Result<String>> + Send;

    /// Public rooms still waiting for a guest, oldest first
    fn list_open_rooms(&self) -> impl Future<Output = Result<Vec<RoomListing>>> + Send;

    fn mark_room_joined(&self, code: &str, guest: &str) -> impl Future<Output = Result<()>> + Send;

    /// Fails with [`GameError::RoomNotFound`] for unknown codes
    fn find_room(&self, code: &str) -> impl Future<Output = Result<RoomInfo>> + Send;
}

/// Uppercase and trim a code typed by a human
pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// Draw a random room code
pub fn generate_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..CODE_LENGTH)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// In-process directory
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    rooms: RwLock<Vec<RoomInfo>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&self, host: &str, is_private: bool) -> Result<String> {
        let mut rooms = self
            .rooms
            .write()
            .map_err(|_| anyhow!("Room directory lock poisoned"))?;
        let mut rng = rand::thread_rng();

        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = generate_code(&mut rng);
            if rooms.iter().any(|room| room.code == code) {
                continue;
            }
            rooms.push(RoomInfo::new(code.clone(), host, is_private));
            return Ok(code);
        }

        bail!("No free room code after {} attempts", MAX_CODE_ATTEMPTS)
    }

    fn lookup(&self, code: &str) -> Result<RoomInfo> {
        let code = normalize_code(code);
        let rooms = self
            .rooms
            .read()
            .map_err(|_| anyhow!("Room directory lock poisoned"))?;

        rooms
            .iter()
            .find(|room| room.code == code)
            .cloned()
            .ok_or_else(|| GameError::RoomNotFound(code).into())
    }

    fn join(&self, code: &str, guest: &str) -> Result<()> {
        let code = normalize_code(code);
        let mut rooms = self
            .rooms
            .write()
            .map_err(|_| anyhow!("Room directory lock poisoned"))?;

        let room = rooms
            .iter_mut()
            .find(|room| room.code == code)
            .ok_or(GameError::RoomNotFound(code))?;
        room.guest = Some(guest.to_string());
        room.status = RoomStatus::Playing;
        Ok(())
    }

    fn open_rooms(&self) -> Result<Vec<RoomListing>> {
        let rooms = self
            .rooms
            .read()
            .map_err(|_| anyhow!("Room directory lock poisoned"))?;
        Ok(rooms.iter().filter(|room| room.is_open()).map(RoomInfo::listing).collect())
    }
}

impl RoomDirectory for MemoryDirectory {
    async fn create_room(&self, host: &str, is_private: bool) -> Result<String> {
        let code = self.insert(host, is_private)?;
        tracing::info!(room = %code, host, is_private, "Room created");
        Ok(code)
    }

    async fn list_open_rooms(&self) -> Result<Vec<RoomListing>> {
        self.open_rooms()
    }

    async fn mark_room_joined(&self, code: &str, guest: &str) -> Result<()> {
        self.join(code, guest)
    }

    async fn find_room(&self, code: &str) -> Result<RoomInfo> {
        self.lookup(code)
    }
}

use thiserror::Error;

/// Failures a player gets to see
///
/// Everything else (publish, persistence) is logged and swallowed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Room not found: {0}")]
    RoomNotFound(String),

    #[error("GitHub profile not found: {0}")]
    ProfileNotFound(String),
}

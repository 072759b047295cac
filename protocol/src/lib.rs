use thiserror::Error;

pub mod character;
pub mod event;
pub mod relay;
pub mod room;

pub use character::{Character, ClassTag, Stats};
pub use event::{BattleMove, PlayerNotice, RoomEvent, parse_room_event};
pub use relay::{RelayFrame, parse_relay_frame};
pub use room::{RoomInfo, RoomListing, RoomStatus};

#[derive(Error, Debug, PartialEq)]
pub enum ParseError {
    #[error("Invalid message format: {0}")]
    InvalidFormat(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Empty message")]
    EmptyMessage,
}

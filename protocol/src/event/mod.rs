//! Room channel events
//!
//! Every participant receives every event published to a room, its own
//! included, so each event carries the username of whoever published it.
//! On the wire an event is `{"event": "<name>", "data": {...}}`.


use crate::ParseError;
use crate::character::Character;
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Username-only payload for `player-ready` / `player-left`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerNotice {
    pub username: String,
}

impl PlayerNotice {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }
}

/// One resolved action, replicated from the acting side to its peer.
///
/// All values are already-computed outcomes; the receiver applies them as
/// deltas and never re-rolls the action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleMove {
    /// Username of the side that acted
    pub attacker: String,
    /// Damage dealt to the receiver
    pub damage: u32,
    /// HP restored to the attacker
    pub heal: u32,
    /// Self-inflicted damage taken by the attacker
    #[serde(default)]
    pub recoil: u32,
    pub log_message: String,
    /// Idempotency key
    pub move_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum RoomEvent {
    /// Announce presence on entering a room
    UserJoined(Character),

    /// Host answers a newcomer with its own character
    HostReply(Character),

    /// Local player confirmed readiness
    PlayerReady(PlayerNotice),

    /// Local player is leaving the room
    PlayerLeft(PlayerNotice),

    /// A resolved battle action
    BattleMove(BattleMove),
}

impl RoomEvent {
    /// Event name as published on the channel
    pub fn name(&self) -> &'static str {
        match self {
            Self::UserJoined(_) => "user-joined",
            Self::HostReply(_) => "host-reply",
            Self::PlayerReady(_) => "player-ready",
            Self::PlayerLeft(_) => "player-left",
            Self::BattleMove(_) => "battle-move",
        }
    }

    /// Username of the participant that published this event
    pub fn sender(&self) -> &str {
        match self {
            Self::UserJoined(character) | Self::HostReply(character) => &character.username,
            Self::PlayerReady(notice) | Self::PlayerLeft(notice) => &notice.username,
            Self::BattleMove(mv) => &mv.attacker,
        }
    }

    /// Serialize to the JSON wire format
    pub fn to_wire(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Reject events that parse but cannot be applied
    pub fn validate(&self) -> Result<(), ParseError> {
        if self.sender().trim().is_empty() {
            return Err(ParseError::MissingField(format!("{} username", self.name())));
        }

        if let Self::BattleMove(mv) = self
            && mv.move_id.trim().is_empty()
        {
            return Err(ParseError::MissingField("battle-move moveId".to_string()));
        }

        Ok(())
    }
}

/// Parse and validate a single event from its JSON wire format
pub fn parse_room_event(text: &str) -> Result<RoomEvent> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ParseError::EmptyMessage.into());
    }

    let event: RoomEvent = serde_json::from_str(text)
        .map_err(|e| ParseError::InvalidFormat(e.to_string()))?;
    event.validate()?;

    Ok(event)
}

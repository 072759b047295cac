//! Frames exchanged with a WebSocket pub/sub relay
//!
//! The relay fans every `message` frame out to all connections subscribed
//! to its channel, the publishing connection included.

use crate::ParseError;
use crate::event::RoomEvent;
use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RelayFrame {
    Subscribe { channel: String },
    Unsubscribe { channel: String },
    Message { channel: String, payload: RoomEvent },
}

impl RelayFrame {
    pub fn channel(&self) -> &str {
        match self {
            Self::Subscribe { channel }
            | Self::Unsubscribe { channel }
            | Self::Message { channel, .. } => channel,
        }
    }

    pub fn to_wire(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Parse a relay frame, validating any carried room event
pub fn parse_relay_frame(text: &str) -> Result<RelayFrame> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ParseError::EmptyMessage.into());
    }

    let frame: RelayFrame =
        serde_json::from_str(text).map_err(|e| ParseError::InvalidFormat(e.to_string()))?;

    if frame.channel().is_empty() {
        return Err(ParseError::MissingField("channel".to_string()).into());
    }
    if let RelayFrame::Message { payload, .. } = &frame {
        payload.validate()?;
    }

    Ok(frame)
}

//! Room directory records

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    /// Host is waiting for a challenger
    Waiting,
    /// A guest has joined
    Playing,
}

/// A room as stored by the directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomInfo {
    /// Short human-typable room code
    pub code: String,
    pub host: String,
    pub guest: Option<String>,
    pub status: RoomStatus,
    pub is_private: bool,
}

impl RoomInfo {
    pub fn new(code: impl Into<String>, host: impl Into<String>, is_private: bool) -> Self {
        Self {
            code: code.into(),
            host: host.into(),
            guest: None,
            status: RoomStatus::Waiting,
            is_private,
        }
    }

    /// Listed in the public lobby
    pub fn is_open(&self) -> bool {
        self.status == RoomStatus::Waiting && !self.is_private
    }

    pub fn listing(&self) -> RoomListing {
        RoomListing {
            id: self.code.clone(),
            host: self.host.clone(),
        }
    }
}

/// Entry of the open room list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomListing {
    pub id: String,
    pub host: String,
}

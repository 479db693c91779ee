// Chat platform entities
// Narrow, closed shapes built once at the platform boundary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformUser {
    pub id: u64,
    pub display_name: String,
}

impl PlatformUser {
    pub fn new(id: u64, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
        }
    }

    pub fn mention(&self) -> String {
        mention(self.id)
    }
}

pub fn mention(user_id: u64) -> String {
    format!("<@{}>", user_id)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmojiRef {
    Custom { id: u64, name: String },
    Unicode(String),
}

impl EmojiRef {
    pub fn custom_id(&self) -> Option<u64> {
        match self {
            EmojiRef::Custom { id, .. } => Some(*id),
            EmojiRef::Unicode(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionEvent {
    pub message_id: u64,
    pub channel_id: u64,
    pub guild_id: Option<u64>,
    pub sender: PlatformUser,
    pub receiver_id: u64,
    /// Present when the event source already carried the author.
    pub receiver: Option<PlatformUser>,
    pub emoji: EmojiRef,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageCreated {
    pub message_id: u64,
    pub channel_id: u64,
    pub guild_id: Option<u64>,
    pub author: PlatformUser,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryReaction {
    pub emoji: EmojiRef,
    pub count: u32,
}

/// A message as returned by a history query (newest first).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryMessage {
    pub message_id: u64,
    pub channel_id: u64,
    pub author: PlatformUser,
    pub reactions: Vec<HistoryReaction>,
    pub timestamp: DateTime<Utc>,
}

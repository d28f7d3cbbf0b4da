use super::ChatUser;
use chrono::{DateTime, Utc};

/// Parsed message content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Text(String),
    Command { name: String, args: Vec<String> },
    Empty,
}

impl Content {
    pub fn is_command(&self) -> bool {
        matches!(self, Content::Command { .. })
    }
}

/// Message delivered by a chat transport
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub id: String,
    /// Chat the message came from; the group-scoping key
    pub source_id: String,
    pub is_group: bool,
    pub text: String,
    pub sender: ChatUser,
    pub timestamp: DateTime<Utc>,
}

impl InboundMessage {
    pub fn new(source_id: impl Into<String>, text: impl Into<String>, sender: ChatUser) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            source_id: source_id.into(),
            is_group: false,
            text: text.into(),
            sender,
            timestamp: Utc::now(),
        }
    }

    /// Message posted in a group chat
    pub fn group(source_id: impl Into<String>, text: impl Into<String>, sender: ChatUser) -> Self {
        Self::new(source_id, text, sender).in_group(true)
    }

    pub fn in_group(mut self, is_group: bool) -> Self {
        self.is_group = is_group;
        self
    }
}

use async_trait::async_trait;
use crate::application::errors::BotError;

/// Chat transport - abstraction for messaging platform adapters
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Start the transport and begin listening for messages
    async fn start(&self) -> Result<(), BotError>;

    /// Send a reply into a chat
    async fn reply(&self, chat_id: &str, text: &str) -> Result<(), BotError>;

    /// Get transport info
    fn info(&self) -> TransportInfo;
}

/// Transport information
#[derive(Debug, Clone)]
pub struct TransportInfo {
    pub id: String,
    pub name: String,
}

//! Console adapter for development/testing

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::application::errors::BotError;
use crate::domain::entities::{ChatUser, InboundMessage};
use crate::domain::traits::{ChatTransport, TransportInfo};
use crate::infrastructure::config::ConsoleConfig;

/// Console transport for local development
///
/// Every stdin line is posted into one group chat. A line of the form
/// `@name text` posts `text` as user `name` instead of the default identity.
pub struct ConsoleAdapter {
    info: TransportInfo,
    source_id: String,
    user: ChatUser,
    sender: Option<mpsc::Sender<(String, String)>>,
}

impl ConsoleAdapter {
    pub fn new(config: &ConsoleConfig) -> Self {
        Self {
            info: TransportInfo {
                id: "console".to_string(),
                name: "kas-bot console".to_string(),
            },
            source_id: config.source_id.clone(),
            user: ChatUser::new(&config.user_id).with_name(&config.user_name),
            sender: None,
        }
    }

    /// Forward replies as `(chat_id, text)` instead of printing them
    pub fn with_sender(mut self, sender: mpsc::Sender<(String, String)>) -> Self {
        self.sender = Some(sender);
        self
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    /// Turn one console line into a group message
    pub fn message_from_line(&self, line: &str) -> Option<InboundMessage> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let (sender, text) = match line.strip_prefix('@').and_then(|rest| rest.split_once(char::is_whitespace)) {
            Some((name, text)) if !name.is_empty() => {
                let user = ChatUser::new(format!("console:{}", name.to_lowercase())).with_name(name);
                (user, text.trim())
            }
            _ => (self.user.clone(), line),
        };

        Some(InboundMessage::group(&self.source_id, text, sender))
    }
}

#[async_trait]
impl ChatTransport for ConsoleAdapter {
    async fn start(&self) -> Result<(), BotError> {
        tracing::info!("Starting console transport (dev mode) in {}", self.source_id);
        Ok(())
    }

    async fn reply(&self, chat_id: &str, text: &str) -> Result<(), BotError> {
        match &self.sender {
            Some(sender) => sender
                .send((chat_id.to_string(), text.to_string()))
                .await
                .map_err(|e| BotError::Transport(format!("Reply channel closed: {}", e))),
            None => {
                println!("[BOT] {}", text);
                Ok(())
            }
        }
    }

    fn info(&self) -> TransportInfo {
        self.info.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter() -> ConsoleAdapter {
        ConsoleAdapter::new(&ConsoleConfig::default())
    }

    #[test]
    fn test_plain_line_uses_default_identity() {
        let message = adapter().message_from_line("/kas").unwrap();
        assert!(message.is_group);
        assert_eq!(message.source_id, "console@g.us");
        assert_eq!(message.sender.id, "console-user");
        assert_eq!(message.text, "/kas");
    }

    #[test]
    fn test_at_prefix_switches_sender() {
        let message = adapter().message_from_line("@Budi /join 1").unwrap();
        assert_eq!(message.sender.display_name(), "Budi");
        assert_eq!(message.sender.id, "console:budi");
        assert_eq!(message.text, "/join 1");
    }

    #[test]
    fn test_blank_line_is_skipped() {
        assert!(adapter().message_from_line("   ").is_none());
    }

    #[tokio::test]
    async fn test_reply_goes_to_channel() {
        let (tx, mut rx) = mpsc::channel(1);
        let adapter = adapter().with_sender(tx);
        adapter.reply("g1", "halo").await.unwrap();
        assert_eq!(rx.recv().await, Some(("g1".to_string(), "halo".to_string())));
    }
}

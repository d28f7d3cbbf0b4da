use std::sync::Arc;

use crate::application::messaging::{Dispatch, Dispatcher};
use crate::domain::entities::InboundMessage;
use crate::domain::traits::ChatTransport;

/// Service for processing inbound messages and delivering the replies
pub struct MessageService<T: ChatTransport> {
    transport: T,
    dispatcher: Arc<Dispatcher>,
}

impl<T: ChatTransport> MessageService<T> {
    pub fn new(transport: T, dispatcher: Arc<Dispatcher>) -> Self {
        Self { transport, dispatcher }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Dispatch a message and send any reply back to its chat.
    ///
    /// Returns whether the message was consumed. Delivery failures are logged only.
    pub async fn process(&self, message: &InboundMessage) -> bool {
        tracing::debug!("Processing message {} from {}", message.id, message.source_id);

        let outcome = self.dispatcher.dispatch(message).await;
        if let Dispatch::Replied(text) = &outcome {
            if let Err(e) = self.transport.reply(&message.source_id, text).await {
                tracing::error!("Failed to deliver reply to {}: {}", message.source_id, e);
            }
        }
        outcome.is_handled()
    }
}

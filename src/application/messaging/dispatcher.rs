//! Message dispatcher - Routes group chat commands to their handlers

use crate::application::errors::{BotError, ErrorKind};
use crate::application::services::{CommandService, KasSettings, Services};
use crate::domain::entities::{Command, Content, InboundMessage};
use super::handlers::{CommandContext, HandlerEnv};
use super::parser::MessageParser;

/// What happened to an inbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Not addressed to the bot
    Ignored,
    /// Consumed; the text goes back to the chat
    Replied(String),
}

impl Dispatch {
    pub fn is_handled(&self) -> bool {
        matches!(self, Dispatch::Replied(_))
    }

    pub fn reply(&self) -> Option<&str> {
        match self {
            Dispatch::Replied(text) => Some(text.as_str()),
            Dispatch::Ignored => None,
        }
    }
}

/// Message dispatcher - the single entry point for inbound chat text
///
/// Built once at startup and shared behind an `Arc`; dispatch only reads the
/// command table.
pub struct Dispatcher {
    parser: MessageParser,
    commands: CommandService,
    services: Services,
    settings: KasSettings,
}

impl Dispatcher {
    pub fn new(commands: CommandService, services: Services, settings: KasSettings) -> Self {
        Self {
            parser: MessageParser::new(commands.prefix()),
            commands,
            services,
            settings,
        }
    }

    /// Register a command under its name and aliases, replacing any previous owner
    pub fn register(&mut self, command: Command) {
        self.commands.register(command);
    }

    pub fn commands(&self) -> &CommandService {
        &self.commands
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    /// Route one message. Errors never escape: they become the reply text.
    pub async fn dispatch(&self, message: &InboundMessage) -> Dispatch {
        if !message.is_group || !self.parser.is_command(&message.text) {
            return Dispatch::Ignored;
        }

        let Content::Command { name, args } = self.parser.parse(&message.text) else {
            return Dispatch::Ignored;
        };
        let prefix = self.parser.prefix();

        let Some(command) = self.commands.find(&name) else {
            tracing::debug!("Unknown command {}{} from {}", prefix, name, message.source_id);
            return Dispatch::Replied(format!(
                "❌ Perintah tidak ditemukan: {}{}\n\nKetik {}help untuk melihat semua perintah",
                prefix, name, prefix
            ));
        };

        let reply = match self.run(command, message, &args).await {
            Ok(reply) => reply,
            Err(e) => {
                match e.kind() {
                    ErrorKind::Internal => {
                        tracing::error!("Error handling {}{}: {}", prefix, command.name, e)
                    }
                    _ => tracing::debug!("{}{} rejected: {}", prefix, command.name, e),
                }
                e.user_message()
            }
        };

        Dispatch::Replied(reply)
    }

    async fn run(&self, command: &Command, message: &InboundMessage, args: &[String]) -> Result<String, BotError> {
        let ctx = self.resolve_context(message).await?;
        tracing::info!(
            "Command executed: {}{} by {} in {}",
            self.parser.prefix(),
            command.name,
            ctx.user_name,
            ctx.group.name
        );

        let env = HandlerEnv {
            services: &self.services,
            commands: &self.commands,
            settings: &self.settings,
        };
        command.execute(&env, &ctx, args).await
    }

    async fn resolve_context(&self, message: &InboundMessage) -> Result<CommandContext, BotError> {
        let group = self.services.directory.resolve_group(&message.source_id).await?;
        let member = self.services.directory.resolve_member(&group.id, &message.sender).await?;

        Ok(CommandContext {
            source_id: message.source_id.clone(),
            user_name: message.sender.display_name(),
            group,
            member,
        })
    }
}

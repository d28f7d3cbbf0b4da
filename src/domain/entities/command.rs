use std::collections::HashMap;
use std::sync::Arc;

/// Closed set of chat command handlers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Help,
    NewMatch,
    Join,
    Leave,
    ListMatch,
    Status,
    EndMatch,
    Kas,
    HistoryKas,
}

/// Represents a bot command
#[derive(Debug, Clone)]
pub struct Command {
    pub name: String,
    pub description: Option<String>,
    pub aliases: Vec<String>,
    pub usage: Option<String>,
    pub example: Option<String>,
    pub kind: CommandKind,
}

impl Command {
    pub fn new(name: impl Into<String>, kind: CommandKind) -> Self {
        Self {
            name: name.into(),
            description: None,
            aliases: Vec::new(),
            usage: None,
            example: None,
            kind,
        }
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = Some(usage.into());
        self
    }

    pub fn with_example(mut self, example: impl Into<String>) -> Self {
        self.example = Some(example.into());
        self
    }
}

/// Command registry for managing available commands
///
/// Names and aliases are lowercased into one lookup table when a command is
/// registered, so dispatch is a single map read.
#[derive(Default)]
pub struct CommandRegistry {
    lookup: HashMap<String, Arc<Command>>,
    commands: Vec<Arc<Command>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command under its name and aliases, replacing any previous owner
    pub fn register(&mut self, command: Command) {
        let command = Arc::new(command);
        let name = command.name.to_lowercase();

        match self.commands.iter().position(|c| c.name.to_lowercase() == name) {
            Some(idx) => {
                // aliases of the replaced command must not outlive it
                self.lookup.retain(|_, c| c.name.to_lowercase() != name);
                self.commands[idx] = Arc::clone(&command);
            }
            None => self.commands.push(Arc::clone(&command)),
        }

        self.lookup.insert(name, Arc::clone(&command));
        for alias in &command.aliases {
            self.lookup.insert(alias.to_lowercase(), Arc::clone(&command));
        }
        tracing::debug!("Command registered: {}", command.name);
    }

    pub fn find(&self, input: &str) -> Option<&Command> {
        self.lookup.get(&input.to_lowercase()).map(|c| c.as_ref())
    }

    /// Distinct commands in registration order
    pub fn all(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter().map(|c| c.as_ref())
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

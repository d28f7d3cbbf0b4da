//! kas-bot - group chat bot for sport matches and a shared cash ledger

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::errors::{BotError, ConfigError, ErrorKind, StorageError};
pub use application::messaging::{Dispatch, Dispatcher};
pub use application::services::{CommandService, KasSettings, MessageService, Services};
pub use domain::traits::{ChatTransport, Store};
pub use infrastructure::config::Config;

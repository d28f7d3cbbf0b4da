//! Message handling - parsing, dispatching and command handlers

pub mod dispatcher;
pub mod format;
pub mod handlers;
pub mod parser;

pub use dispatcher::{Dispatch, Dispatcher};
pub use handlers::{CommandContext, HandlerEnv};
pub use parser::MessageParser;

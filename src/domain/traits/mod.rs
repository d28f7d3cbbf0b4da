//! Domain traits - Abstractions for infrastructure implementations

pub mod bot;
pub mod store;

pub use bot::{ChatTransport, TransportInfo};
pub use store::Store;

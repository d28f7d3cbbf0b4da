//! Infrastructure layer - External concerns
//!
//! This layer contains:
//! - Config: Configuration loading
//! - Storage: in-memory store
//! - Database: SQLite store
//! - Adapters: chat transports (console)

pub mod adapters;
pub mod config;
pub mod database;
pub mod storage;

pub use database::SqliteStore;
pub use storage::MemoryStore;

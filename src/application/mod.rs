//! Application layer - Use cases and business logic
//!
//! This layer contains:
//! - Services: directory, match registry, ledger, command set
//! - Messaging: parsing, dispatching, command handlers
//! - Errors: application error types

pub mod errors;
pub mod messaging;
pub mod services;

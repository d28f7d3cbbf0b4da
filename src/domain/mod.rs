//! Domain layer - Core business logic with no external dependencies
//! 
//! This layer contains:
//! - Entities: Core business objects (Group, Member, Match, Transaction, Command)
//! - Traits: Abstractions for infrastructure (ChatTransport, Store)
//! - Settlement: Equal-split cost allocation

pub mod entities;
pub mod settlement;
pub mod traits;

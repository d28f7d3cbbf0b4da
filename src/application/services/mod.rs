//! Application services - Business logic orchestration

pub mod command_service;
pub mod directory_service;
pub mod ledger_service;
pub mod match_service;
pub mod message_service;

pub use command_service::CommandService;
pub use directory_service::DirectoryService;
pub use ledger_service::{LedgerService, SettlementReceipt};
pub use match_service::{MatchRegistry, NewMatch};
pub use message_service::MessageService;

use std::sync::Arc;

use crate::domain::traits::Store;

/// Latest a new match may be scheduled after its creation, in minutes (one year)
pub const MAX_MATCH_START_OFFSET_MINUTES: i64 = 525_600;

/// Kas presentation and scheduling knobs shared by the command handlers
#[derive(Debug, Clone)]
pub struct KasSettings {
    pub currency_symbol: String,
    pub history_limit: usize,
    pub match_start_offset_minutes: i64,
}

impl Default for KasSettings {
    fn default() -> Self {
        Self {
            currency_symbol: "Rp".to_string(),
            history_limit: 10,
            match_start_offset_minutes: 60,
        }
    }
}

/// Domain services sharing one store handle
#[derive(Clone)]
pub struct Services {
    pub directory: DirectoryService,
    pub matches: MatchRegistry,
    pub ledger: LedgerService,
}

impl Services {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            directory: DirectoryService::new(store.clone()),
            matches: MatchRegistry::new(store.clone()),
            ledger: LedgerService::new(store),
        }
    }
}

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::application::errors::StorageError;
use crate::domain::entities::{
    Group, Match, MatchStatus, Member, MemberUpdate, NewTransaction, Participant,
    ParticipantDetail, Transaction,
};

/// Store trait - abstraction for data persistence
///
/// Implementations must enforce:
/// - unique `Group::source_id`
/// - unique `(Member::group_id, Member::external_id)`
/// - unique `(Participant::match_id, Participant::member_id)`, reported as
///   [`StorageError::UniqueViolation`]
/// - `append_transactions` writes the rows and the balance change as one unit
#[async_trait]
pub trait Store: Send + Sync {
    // Group operations
    async fn get_or_create_group(&self, source_id: &str, name: &str) -> Result<Group, StorageError>;
    async fn get_group(&self, id: &str) -> Result<Option<Group>, StorageError>;
    async fn list_groups(&self) -> Result<Vec<Group>, StorageError>;
    async fn set_balance(&self, group_id: &str, balance: Decimal) -> Result<bool, StorageError>;

    // Member operations
    async fn get_or_create_member(&self, candidate: &Member) -> Result<Member, StorageError>;
    async fn get_member(&self, id: &str) -> Result<Option<Member>, StorageError>;
    async fn list_members(&self, group_id: &str) -> Result<Vec<Member>, StorageError>;
    async fn update_member(&self, id: &str, update: &MemberUpdate) -> Result<Option<Member>, StorageError>;
    async fn delete_member(&self, id: &str) -> Result<bool, StorageError>;

    // Match operations
    async fn insert_match(&self, game: &Match) -> Result<(), StorageError>;
    async fn get_match(&self, id: &str) -> Result<Option<Match>, StorageError>;
    /// Newest first
    async fn list_matches(&self, group_id: &str, status: Option<MatchStatus>) -> Result<Vec<Match>, StorageError>;
    async fn set_match_status(&self, id: &str, status: MatchStatus) -> Result<bool, StorageError>;

    // Participant operations
    async fn insert_participant(&self, participant: &Participant) -> Result<(), StorageError>;
    async fn delete_participant(&self, match_id: &str, member_id: &str) -> Result<bool, StorageError>;
    async fn get_participant(&self, match_id: &str, member_id: &str) -> Result<Option<Participant>, StorageError>;
    /// Join order
    async fn list_participants(&self, match_id: &str) -> Result<Vec<ParticipantDetail>, StorageError>;
    async fn list_participations(&self, member_id: &str) -> Result<Vec<Participant>, StorageError>;
    async fn count_participants(&self, match_id: &str) -> Result<usize, StorageError>;

    // Ledger operations
    /// Append all entries and apply their signed sum to the group balance, or nothing at all
    async fn append_transactions(&self, group_id: &str, entries: Vec<NewTransaction>) -> Result<Vec<Transaction>, StorageError>;
    /// Newest first
    async fn list_transactions(&self, group_id: &str, limit: Option<usize>) -> Result<Vec<Transaction>, StorageError>;
}

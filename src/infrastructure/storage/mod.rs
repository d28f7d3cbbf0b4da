//! In-memory storage implementation

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::application::errors::StorageError;
use crate::domain::entities::{
    Group, Match, MatchStatus, Member, MemberUpdate, NewTransaction, Participant,
    ParticipantDetail, Transaction,
};
use crate::domain::traits::Store;

/// Rows kept in insertion order; listings reverse them for newest-first.
#[derive(Default)]
struct Tables {
    groups: Vec<Group>,
    members: Vec<Member>,
    matches: Vec<Match>,
    participants: Vec<Participant>,
    transactions: Vec<Transaction>,
}

/// Store backed by process memory
///
/// All tables sit behind one lock so multi-table writes (transaction rows plus
/// the cached balance) are applied as a unit.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get_or_create_group(&self, source_id: &str, name: &str) -> Result<Group, StorageError> {
        let mut tables = self.tables.write().await;
        if let Some(group) = tables.groups.iter().find(|g| g.source_id == source_id) {
            return Ok(group.clone());
        }
        let group = Group::new(source_id, name);
        tables.groups.push(group.clone());
        Ok(group)
    }

    async fn get_group(&self, id: &str) -> Result<Option<Group>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables.groups.iter().find(|g| g.id == id).cloned())
    }

    async fn list_groups(&self) -> Result<Vec<Group>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables.groups.iter().rev().cloned().collect())
    }

    async fn set_balance(&self, group_id: &str, balance: Decimal) -> Result<bool, StorageError> {
        let mut tables = self.tables.write().await;
        match tables.groups.iter_mut().find(|g| g.id == group_id) {
            Some(group) => {
                group.balance = balance;
                group.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn get_or_create_member(&self, candidate: &Member) -> Result<Member, StorageError> {
        let mut tables = self.tables.write().await;
        if let Some(member) = tables
            .members
            .iter()
            .find(|m| m.group_id == candidate.group_id && m.external_id == candidate.external_id)
        {
            return Ok(member.clone());
        }
        if !tables.groups.iter().any(|g| g.id == candidate.group_id) {
            return Err(StorageError::NotFound(format!("group {}", candidate.group_id)));
        }
        tables.members.push(candidate.clone());
        Ok(candidate.clone())
    }

    async fn get_member(&self, id: &str) -> Result<Option<Member>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables.members.iter().find(|m| m.id == id).cloned())
    }

    async fn list_members(&self, group_id: &str) -> Result<Vec<Member>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables
            .members
            .iter()
            .rev()
            .filter(|m| m.group_id == group_id)
            .cloned()
            .collect())
    }

    async fn update_member(&self, id: &str, update: &MemberUpdate) -> Result<Option<Member>, StorageError> {
        let mut tables = self.tables.write().await;
        Ok(tables.members.iter_mut().find(|m| m.id == id).map(|member| {
            update.apply(member);
            member.clone()
        }))
    }

    async fn delete_member(&self, id: &str) -> Result<bool, StorageError> {
        let mut tables = self.tables.write().await;
        let before = tables.members.len();
        tables.members.retain(|m| m.id != id);
        if tables.members.len() == before {
            return Ok(false);
        }

        tables.participants.retain(|p| p.member_id != id);
        for tx in tables.transactions.iter_mut().filter(|t| t.recorded_by.as_deref() == Some(id)) {
            tx.recorded_by = None;
        }
        for game in tables.matches.iter_mut().filter(|m| m.created_by.as_deref() == Some(id)) {
            game.created_by = None;
        }
        Ok(true)
    }

    async fn insert_match(&self, game: &Match) -> Result<(), StorageError> {
        let mut tables = self.tables.write().await;
        if !tables.groups.iter().any(|g| g.id == game.group_id) {
            return Err(StorageError::NotFound(format!("group {}", game.group_id)));
        }
        tables.matches.push(game.clone());
        Ok(())
    }

    async fn get_match(&self, id: &str) -> Result<Option<Match>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables.matches.iter().find(|m| m.id == id).cloned())
    }

    async fn list_matches(&self, group_id: &str, status: Option<MatchStatus>) -> Result<Vec<Match>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables
            .matches
            .iter()
            .rev()
            .filter(|m| m.group_id == group_id)
            .filter(|m| status.map_or(true, |s| m.status == s))
            .cloned()
            .collect())
    }

    async fn set_match_status(&self, id: &str, status: MatchStatus) -> Result<bool, StorageError> {
        let mut tables = self.tables.write().await;
        match tables.matches.iter_mut().find(|m| m.id == id) {
            Some(game) => {
                game.status = status;
                game.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn insert_participant(&self, participant: &Participant) -> Result<(), StorageError> {
        let mut tables = self.tables.write().await;
        let duplicate = tables
            .participants
            .iter()
            .any(|p| p.match_id == participant.match_id && p.member_id == participant.member_id);
        if duplicate {
            return Err(StorageError::UniqueViolation(format!(
                "participant ({}, {})",
                participant.match_id, participant.member_id
            )));
        }
        tables.participants.push(participant.clone());
        Ok(())
    }

    async fn delete_participant(&self, match_id: &str, member_id: &str) -> Result<bool, StorageError> {
        let mut tables = self.tables.write().await;
        let before = tables.participants.len();
        tables
            .participants
            .retain(|p| !(p.match_id == match_id && p.member_id == member_id));
        Ok(tables.participants.len() != before)
    }

    async fn get_participant(&self, match_id: &str, member_id: &str) -> Result<Option<Participant>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables
            .participants
            .iter()
            .find(|p| p.match_id == match_id && p.member_id == member_id)
            .cloned())
    }

    async fn list_participants(&self, match_id: &str) -> Result<Vec<ParticipantDetail>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables
            .participants
            .iter()
            .filter(|p| p.match_id == match_id)
            .map(|p| ParticipantDetail {
                member_id: p.member_id.clone(),
                member_name: tables
                    .members
                    .iter()
                    .find(|m| m.id == p.member_id)
                    .map(|m| m.name.clone())
                    .unwrap_or_default(),
                amount_due: p.amount_due,
                joined_at: p.joined_at,
            })
            .collect())
    }

    async fn list_participations(&self, member_id: &str) -> Result<Vec<Participant>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables
            .participants
            .iter()
            .filter(|p| p.member_id == member_id)
            .cloned()
            .collect())
    }

    async fn count_participants(&self, match_id: &str) -> Result<usize, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables.participants.iter().filter(|p| p.match_id == match_id).count())
    }

    async fn append_transactions(&self, group_id: &str, entries: Vec<NewTransaction>) -> Result<Vec<Transaction>, StorageError> {
        let mut tables = self.tables.write().await;
        let group = tables
            .groups
            .iter_mut()
            .find(|g| g.id == group_id)
            .ok_or_else(|| StorageError::NotFound(format!("group {}", group_id)))?;

        let mut balance = group.balance;
        for entry in &entries {
            balance = balance
                .checked_add(entry.kind.signed(entry.amount))
                .ok_or_else(|| StorageError::Internal("balance overflow".to_string()))?;
        }
        group.balance = balance;
        group.updated_at = Utc::now();

        let recorded: Vec<Transaction> = entries
            .into_iter()
            .map(|entry| entry.into_transaction(group_id))
            .collect();
        tables.transactions.extend(recorded.iter().cloned());
        Ok(recorded)
    }

    async fn list_transactions(&self, group_id: &str, limit: Option<usize>) -> Result<Vec<Transaction>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables
            .transactions
            .iter()
            .rev()
            .filter(|t| t.group_id == group_id)
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }
}

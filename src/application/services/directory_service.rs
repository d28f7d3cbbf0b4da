//! Member/group directory - maps chat identities to group and member records

use rust_decimal::Decimal;
use std::sync::Arc;

use crate::application::errors::{BotError, StorageError};
use crate::domain::entities::{
    ChatUser, Group, GroupStats, MatchStatus, Member, MemberStats, MemberUpdate,
};
use crate::domain::traits::Store;

#[derive(Clone)]
pub struct DirectoryService {
    store: Arc<dyn Store>,
}

impl DirectoryService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Group for a chat source, created on first contact
    pub async fn resolve_group(&self, source_id: &str) -> Result<Group, BotError> {
        let name = Group::default_name(source_id);
        let group = self.store.get_or_create_group(source_id, &name).await?;
        tracing::debug!("Resolved group {} ({}) for source {}", group.name, group.id, source_id);
        Ok(group)
    }

    /// Member for a chat user inside `group_id`, created on first contact
    pub async fn resolve_member(&self, group_id: &str, user: &ChatUser) -> Result<Member, BotError> {
        let candidate = Member::new(group_id, &user.id, user.display_name()).with_phone(user.phone.clone());
        let member = self
            .store
            .get_or_create_member(&candidate)
            .await
            .map_err(|e| match e {
                StorageError::NotFound(_) => BotError::GroupNotFound(group_id.to_string()),
                other => other.into(),
            })?;

        if member.id == candidate.id {
            tracing::info!("New member created: {} in group {}", member.name, group_id);
        }
        Ok(member)
    }

    pub async fn get_group(&self, group_id: &str) -> Result<Group, BotError> {
        self.store
            .get_group(group_id)
            .await?
            .ok_or_else(|| BotError::GroupNotFound(group_id.to_string()))
    }

    pub async fn list_groups(&self) -> Result<Vec<GroupStats>, BotError> {
        let groups = self.store.list_groups().await?;
        let mut stats = Vec::with_capacity(groups.len());
        for group in groups {
            stats.push(self.stats_for(group).await?);
        }
        Ok(stats)
    }

    pub async fn group_stats(&self, group_id: &str) -> Result<GroupStats, BotError> {
        let group = self.get_group(group_id).await?;
        self.stats_for(group).await
    }

    async fn stats_for(&self, group: Group) -> Result<GroupStats, BotError> {
        let members = self.store.list_members(&group.id).await?;
        let matches = self.store.list_matches(&group.id, None).await?;
        let open_matches = matches.iter().filter(|m| m.status == MatchStatus::Open).count();

        Ok(GroupStats {
            group_id: group.id,
            name: group.name,
            balance: group.balance,
            total_members: members.len(),
            total_matches: matches.len(),
            open_matches,
            created_at: group.created_at,
        })
    }

    /// Members of a group, most recently joined first
    pub async fn list_members(&self, group_id: &str) -> Result<Vec<Member>, BotError> {
        self.get_group(group_id).await?;
        Ok(self.store.list_members(group_id).await?)
    }

    pub async fn get_member(&self, member_id: &str) -> Result<Member, BotError> {
        self.store
            .get_member(member_id)
            .await?
            .ok_or_else(|| BotError::MemberNotFound(member_id.to_string()))
    }

    pub async fn update_member(&self, member_id: &str, update: &MemberUpdate) -> Result<Member, BotError> {
        if update.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(BotError::Validation("Nama anggota tidak boleh kosong".to_string()));
        }

        let member = self
            .store
            .update_member(member_id, update)
            .await?
            .ok_or_else(|| BotError::MemberNotFound(member_id.to_string()))?;
        tracing::info!("Member {} updated", member_id);
        Ok(member)
    }

    /// Remove a member along with their match participations
    pub async fn remove_member(&self, member_id: &str) -> Result<(), BotError> {
        if !self.store.delete_member(member_id).await? {
            return Err(BotError::MemberNotFound(member_id.to_string()));
        }
        tracing::info!("Member {} removed from group", member_id);
        Ok(())
    }

    pub async fn member_stats(&self, member_id: &str) -> Result<MemberStats, BotError> {
        let member = self.get_member(member_id).await?;
        let participations = self.store.list_participations(member_id).await?;
        let total_amount_due = participations
            .iter()
            .try_fold(Decimal::ZERO, |total, p| total.checked_add(p.amount_due))
            .ok_or_else(|| BotError::Validation("❌ Total tagihan anggota terlalu besar".to_string()))?;

        Ok(MemberStats {
            member_id: member.id,
            name: member.name,
            phone: member.phone,
            matches_joined: participations.len(),
            total_amount_due,
        })
    }
}

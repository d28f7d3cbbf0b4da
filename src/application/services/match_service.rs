//! Match registry - match lifecycle and participant membership

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::application::errors::{BotError, StorageError};
use crate::domain::entities::{
    Match, MatchStatus, MatchSummary, Participant, ParticipantDetail,
};
use crate::domain::traits::Store;

/// Request to schedule a match
#[derive(Debug, Clone, Deserialize)]
pub struct NewMatch {
    pub group_id: String,
    pub name: String,
    pub venue: String,
    pub scheduled_at: DateTime<Utc>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub max_participants: Option<u32>,
    #[serde(default)]
    pub created_by: Option<String>,
}

impl NewMatch {
    pub fn new(
        group_id: impl Into<String>,
        name: impl Into<String>,
        venue: impl Into<String>,
        scheduled_at: DateTime<Utc>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            name: name.into(),
            venue: venue.into(),
            scheduled_at,
            price: None,
            max_participants: None,
            created_by: None,
        }
    }

    pub fn with_price(mut self, price: Decimal) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_max_participants(mut self, max: u32) -> Self {
        self.max_participants = Some(max);
        self
    }

    pub fn with_creator(mut self, member_id: impl Into<String>) -> Self {
        self.created_by = Some(member_id.into());
        self
    }
}

/// Owns match state transitions and the participant set.
///
/// Join, leave and end for one match run under that match's mutex, so the
/// status, duplicate and capacity checks cannot interleave with each other.
#[derive(Clone)]
pub struct MatchRegistry {
    store: Arc<dyn Store>,
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl MatchRegistry {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            locks: Arc::new(DashMap::new()),
        }
    }

    fn lock_for(&self, match_id: &str) -> Arc<Mutex<()>> {
        self.locks.entry(match_id.to_string()).or_default().value().clone()
    }

    /// Drop the lock entry of a match once nobody else holds or waits on it
    fn release(&self, match_id: &str, lock: Arc<Mutex<()>>) {
        drop(lock);
        self.locks.remove_if(match_id, |_, l| Arc::strong_count(l) == 1);
    }

    /// Number of per-match lock entries currently tracked
    pub fn active_locks(&self) -> usize {
        self.locks.len()
    }

    pub async fn create_match(&self, request: NewMatch) -> Result<Match, BotError> {
        if request.name.trim().is_empty() || request.venue.trim().is_empty() {
            return Err(BotError::Validation("Nama dan venue pertandingan wajib diisi".to_string()));
        }
        if request.price.is_some_and(|p| p.is_sign_negative()) {
            return Err(BotError::Validation("Harga tidak boleh negatif".to_string()));
        }
        if request.max_participants == Some(0) {
            return Err(BotError::Validation("Maksimal peserta minimal 1".to_string()));
        }

        let game = Match::new(&request.group_id, request.name, request.venue, request.scheduled_at)
            .with_price(request.price)
            .with_max_participants(request.max_participants)
            .with_creator(request.created_by);

        self.store.insert_match(&game).await.map_err(|e| match e {
            StorageError::NotFound(_) => BotError::GroupNotFound(request.group_id.clone()),
            other => other.into(),
        })?;

        tracing::info!("Match created: {} in group {}", game.name, game.group_id);
        Ok(game)
    }

    pub async fn get_match(&self, match_id: &str) -> Result<Match, BotError> {
        self.store
            .get_match(match_id)
            .await?
            .ok_or_else(|| BotError::MatchNotFound(match_id.to_string()))
    }

    /// Matches of a group, newest first, with participant counts
    pub async fn list_matches(&self, group_id: &str, status: Option<MatchStatus>) -> Result<Vec<MatchSummary>, BotError> {
        let matches = self.store.list_matches(group_id, status).await?;
        let mut summaries = Vec::with_capacity(matches.len());
        for game in matches {
            let participant_count = self.store.count_participants(&game.id).await?;
            summaries.push(MatchSummary { inner: game, participant_count });
        }
        Ok(summaries)
    }

    /// Participants in join order
    pub async fn participants(&self, match_id: &str) -> Result<Vec<ParticipantDetail>, BotError> {
        self.get_match(match_id).await?;
        Ok(self.store.list_participants(match_id).await?)
    }

    pub async fn is_joined(&self, match_id: &str, member_id: &str) -> Result<bool, BotError> {
        Ok(self.store.get_participant(match_id, member_id).await?.is_some())
    }

    /// Open matches of the group the member has joined, newest first
    pub async fn open_matches_joined_by(&self, group_id: &str, member_id: &str) -> Result<Vec<Match>, BotError> {
        let open = self.store.list_matches(group_id, Some(MatchStatus::Open)).await?;
        let mut joined = Vec::new();
        for game in open {
            if self.is_joined(&game.id, member_id).await? {
                joined.push(game);
            }
        }
        Ok(joined)
    }

    /// Join a member to an open match, snapshotting the current price as amount due
    pub async fn add_participant(&self, match_id: &str, member_id: &str) -> Result<Participant, BotError> {
        let lock = self.lock_for(match_id);
        let result = {
            let _guard = lock.lock().await;
            self.add_participant_locked(match_id, member_id).await
        };
        if matches!(result, Err(BotError::MatchNotFound(_) | BotError::MatchClosed)) {
            self.release(match_id, lock);
        }
        result
    }

    async fn add_participant_locked(&self, match_id: &str, member_id: &str) -> Result<Participant, BotError> {
        let game = self.get_match(match_id).await?;
        if !game.is_open() {
            return Err(BotError::MatchClosed);
        }

        let member = self
            .store
            .get_member(member_id)
            .await?
            .ok_or_else(|| BotError::MemberNotFound(member_id.to_string()))?;
        if member.group_id != game.group_id {
            return Err(BotError::MemberNotFound(member_id.to_string()));
        }

        if self.store.get_participant(match_id, member_id).await?.is_some() {
            return Err(BotError::AlreadyJoined);
        }

        if let Some(max) = game.max_participants {
            let count = self.store.count_participants(match_id).await?;
            if count >= max as usize {
                return Err(BotError::MatchFull { max });
            }
        }

        let participant = Participant::new(match_id, member_id, game.price_or_zero());
        self.store
            .insert_participant(&participant)
            .await
            .map_err(|e| match e {
                StorageError::UniqueViolation(_) => BotError::AlreadyJoined,
                other => other.into(),
            })?;

        tracing::info!("Member {} joined match {}", member.name, game.name);
        Ok(participant)
    }

    pub async fn remove_participant(&self, match_id: &str, member_id: &str) -> Result<(), BotError> {
        let lock = self.lock_for(match_id);
        let result = {
            let _guard = lock.lock().await;
            self.remove_participant_locked(match_id, member_id).await
        };
        if matches!(result, Err(BotError::MatchNotFound(_) | BotError::MatchClosed)) {
            self.release(match_id, lock);
        }
        result
    }

    async fn remove_participant_locked(&self, match_id: &str, member_id: &str) -> Result<(), BotError> {
        let game = self.get_match(match_id).await?;
        if !game.is_open() {
            return Err(BotError::MatchClosed);
        }

        if !self.store.delete_participant(match_id, member_id).await? {
            return Err(BotError::NotJoined);
        }

        tracing::info!("Member {} left match {}", member_id, game.name);
        Ok(())
    }

    /// Mark a match done. Returns `false` when it already was.
    pub async fn end_match(&self, match_id: &str) -> Result<bool, BotError> {
        let ended = self.end_match_with(match_id, |_| async { Ok(()) }).await?;
        Ok(ended.is_some())
    }

    /// Run `before_close` on the open match, then mark it done, all under the
    /// match lock. Returns `None` when the match already was done.
    ///
    /// When `before_close` fails the match stays open and the error is
    /// returned, so the caller can try again.
    pub async fn end_match_with<T, F, Fut>(&self, match_id: &str, before_close: F) -> Result<Option<T>, BotError>
    where
        F: FnOnce(Match) -> Fut,
        Fut: Future<Output = Result<T, BotError>>,
    {
        let lock = self.lock_for(match_id);
        let result = {
            let _guard = lock.lock().await;
            self.end_match_locked(match_id, before_close).await
        };

        // done or missing matches reject every membership change
        if matches!(result, Ok(_) | Err(BotError::MatchNotFound(_))) {
            self.release(match_id, lock);
        }
        result
    }

    async fn end_match_locked<T, F, Fut>(&self, match_id: &str, before_close: F) -> Result<Option<T>, BotError>
    where
        F: FnOnce(Match) -> Fut,
        Fut: Future<Output = Result<T, BotError>>,
    {
        let game = self.get_match(match_id).await?;
        if game.status == MatchStatus::Done {
            return Ok(None);
        }

        let name = game.name.clone();
        let outcome = before_close(game).await?;
        self.store.set_match_status(match_id, MatchStatus::Done).await?;
        tracing::info!("Match {} ended", name);
        Ok(Some(outcome))
    }
}

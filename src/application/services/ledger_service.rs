//! Ledger service - group kas balance and its transaction log

use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;

use crate::application::errors::{BotError, StorageError};
use crate::domain::entities::{Balance, NewTransaction, Transaction};
use crate::domain::settlement::{self, Settlement};
use crate::domain::traits::Store;

/// Outcome of billing a match's participants
#[derive(Debug, Clone, Serialize)]
pub struct SettlementReceipt {
    pub match_id: String,
    pub amount_per_person: Decimal,
    pub total_collected: Decimal,
    pub transactions_created: usize,
}

#[derive(Clone)]
pub struct LedgerService {
    store: Arc<dyn Store>,
}

impl LedgerService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Append one entry and move the balance by its signed amount
    pub async fn record_transaction(&self, group_id: &str, entry: NewTransaction) -> Result<Transaction, BotError> {
        if entry.amount <= Decimal::ZERO {
            return Err(BotError::Validation("Jumlah transaksi harus lebih dari 0".to_string()));
        }

        let mut recorded = self.append(group_id, vec![entry]).await?;
        let transaction = recorded
            .pop()
            .ok_or_else(|| StorageError::Internal("transaction not recorded".to_string()))?;

        tracing::info!(
            "Transaction recorded: {} {} in group {}",
            transaction.kind,
            transaction.amount,
            group_id
        );
        Ok(transaction)
    }

    pub async fn get_balance(&self, group_id: &str) -> Result<Balance, BotError> {
        let group = self
            .store
            .get_group(group_id)
            .await?
            .ok_or_else(|| BotError::GroupNotFound(group_id.to_string()))?;

        Ok(Balance {
            group_id: group.id,
            group_name: group.name,
            balance: group.balance,
        })
    }

    /// Newest first, at most `limit` entries
    pub async fn get_history(&self, group_id: &str, limit: Option<usize>) -> Result<Vec<Transaction>, BotError> {
        if self.store.get_group(group_id).await?.is_none() {
            return Err(BotError::GroupNotFound(group_id.to_string()));
        }
        Ok(self.store.list_transactions(group_id, limit).await?)
    }

    pub async fn calculate_settlement(&self, match_id: &str) -> Result<Settlement, BotError> {
        let game = self
            .store
            .get_match(match_id)
            .await?
            .ok_or_else(|| BotError::MatchNotFound(match_id.to_string()))?;
        let participants = self.store.list_participants(match_id).await?;
        settlement::calculate(&game, &participants)
    }

    /// Record one income entry per participant of the match.
    ///
    /// All entries land in a single store call, so either every participant
    /// is billed or none is.
    pub async fn apply_settlement(
        &self,
        group_id: &str,
        match_id: &str,
        recorded_by: Option<String>,
    ) -> Result<SettlementReceipt, BotError> {
        let game = self
            .store
            .get_match(match_id)
            .await?
            .filter(|m| m.group_id == group_id)
            .ok_or_else(|| BotError::MatchNotFound(match_id.to_string()))?;
        let participants = self.store.list_participants(match_id).await?;
        let settlement = settlement::calculate(&game, &participants)?;

        let description = format!("Tagihan pertandingan: {}", game.name);
        let entries: Vec<NewTransaction> = settlement
            .allocations
            .iter()
            .map(|allocation| {
                NewTransaction::income(allocation.amount_due)
                    .with_description(description.clone())
                    .with_match(Some(game.id.clone()))
                    .recorded_by(recorded_by.clone())
            })
            .collect();

        if entries.is_empty() {
            tracing::debug!("Match {} has nothing to settle", game.name);
            return Ok(SettlementReceipt {
                match_id: game.id,
                amount_per_person: Decimal::ZERO,
                total_collected: Decimal::ZERO,
                transactions_created: 0,
            });
        }

        let recorded = self.append(group_id, entries).await.map_err(|e| {
            tracing::error!("Settlement of match {} failed: {}", game.name, e);
            e
        })?;

        tracing::info!(
            "Settlement applied for match {}: {} x {} = {}",
            game.name,
            recorded.len(),
            settlement.amount_per_person,
            settlement.total_cost
        );

        Ok(SettlementReceipt {
            match_id: game.id,
            amount_per_person: settlement.amount_per_person,
            total_collected: settlement.total_cost,
            transactions_created: recorded.len(),
        })
    }

    /// Force the cached balance to zero without writing a transaction
    pub async fn reset_balance(&self, group_id: &str) -> Result<(), BotError> {
        if !self.store.set_balance(group_id, Decimal::ZERO).await? {
            return Err(BotError::GroupNotFound(group_id.to_string()));
        }
        tracing::warn!("Kas balance reset to zero for group {}", group_id);
        Ok(())
    }

    async fn append(&self, group_id: &str, entries: Vec<NewTransaction>) -> Result<Vec<Transaction>, BotError> {
        self.store
            .append_transactions(group_id, entries)
            .await
            .map_err(|e| match e {
                StorageError::NotFound(_) => BotError::GroupNotFound(group_id.to_string()),
                other => other.into(),
            })
    }
}

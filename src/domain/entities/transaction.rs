use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }

    /// Signed effect of `amount` on the group balance
    pub fn signed(&self, amount: Decimal) -> Decimal {
        match self {
            TransactionType::Income => amount,
            TransactionType::Expense => -amount,
        }
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            other => Err(format!("unknown transaction type: {}", other)),
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable kas ledger entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub group_id: String,
    pub kind: TransactionType,
    /// Always positive; the sign comes from `kind`
    pub amount: Decimal,
    pub description: Option<String>,
    pub match_id: Option<String>,
    pub recorded_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn signed_amount(&self) -> Decimal {
        self.kind.signed(self.amount)
    }
}

/// Transaction as requested by a caller, before it gets an id and timestamp
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub kind: TransactionType,
    pub amount: Decimal,
    pub description: Option<String>,
    pub match_id: Option<String>,
    pub recorded_by: Option<String>,
}

impl NewTransaction {
    pub fn income(amount: Decimal) -> Self {
        Self::new(TransactionType::Income, amount)
    }

    pub fn expense(amount: Decimal) -> Self {
        Self::new(TransactionType::Expense, amount)
    }

    pub fn new(kind: TransactionType, amount: Decimal) -> Self {
        Self {
            kind,
            amount,
            description: None,
            match_id: None,
            recorded_by: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_match(mut self, match_id: Option<String>) -> Self {
        self.match_id = match_id;
        self
    }

    pub fn recorded_by(mut self, member_id: Option<String>) -> Self {
        self.recorded_by = member_id;
        self
    }

    pub(crate) fn into_transaction(self, group_id: &str) -> Transaction {
        Transaction {
            id: uuid::Uuid::new_v4().to_string(),
            group_id: group_id.to_string(),
            kind: self.kind,
            amount: self.amount,
            description: self.description,
            match_id: self.match_id,
            recorded_by: self.recorded_by,
            created_at: Utc::now(),
        }
    }
}

/// Current kas balance of a group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Balance {
    pub group_id: String,
    pub group_name: String,
    pub balance: Decimal,
}

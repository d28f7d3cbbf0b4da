use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A chat group with its shared kas balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    /// Identifier of the group on the chat platform
    pub source_id: String,
    pub name: String,
    /// Cached balance, kept equal to the signed sum of the group's transactions
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Group {
    pub fn new(source_id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            source_id: source_id.into(),
            name: name.into(),
            balance: Decimal::ZERO,
            created_at: now,
            updated_at: now,
        }
    }

    /// Name given to a group seen for the first time: `Group <id before '@'>`
    pub fn default_name(source_id: &str) -> String {
        let local = source_id.split('@').next().unwrap_or(source_id);
        format!("Group {}", local)
    }
}

/// Group summary for listings and dashboards
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupStats {
    pub group_id: String,
    pub name: String,
    pub balance: Decimal,
    pub total_members: usize,
    pub total_matches: usize,
    pub open_matches: usize,
    pub created_at: DateTime<Utc>,
}

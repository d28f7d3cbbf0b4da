use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Match lifecycle. `Done` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Open,
    Done,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Open => "open",
            MatchStatus::Done => "done",
        }
    }
}

impl FromStr for MatchStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(MatchStatus::Open),
            "done" => Ok(MatchStatus::Done),
            other => Err(format!("unknown match status: {}", other)),
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scheduled sporting event inside a group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: String,
    pub group_id: String,
    pub name: String,
    pub venue: String,
    pub scheduled_at: DateTime<Utc>,
    /// Price per head; `None` means free
    pub price: Option<Decimal>,
    /// `None` means uncapped
    pub max_participants: Option<u32>,
    pub status: MatchStatus,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Match {
    pub fn new(
        group_id: impl Into<String>,
        name: impl Into<String>,
        venue: impl Into<String>,
        scheduled_at: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            group_id: group_id.into(),
            name: name.into(),
            venue: venue.into(),
            scheduled_at,
            price: None,
            max_participants: None,
            status: MatchStatus::Open,
            created_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_price(mut self, price: Option<Decimal>) -> Self {
        self.price = price;
        self
    }

    pub fn with_max_participants(mut self, max: Option<u32>) -> Self {
        self.max_participants = max;
        self
    }

    pub fn with_creator(mut self, member_id: Option<String>) -> Self {
        self.created_by = member_id;
        self
    }

    pub fn is_open(&self) -> bool {
        self.status == MatchStatus::Open
    }

    /// Price used for snapshots and settlement, zero when unset
    pub fn price_or_zero(&self) -> Decimal {
        self.price.unwrap_or(Decimal::ZERO)
    }
}

/// Join record of one member in one match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub match_id: String,
    pub member_id: String,
    /// Price per head at the moment of joining
    pub amount_due: Decimal,
    pub joined_at: DateTime<Utc>,
}

impl Participant {
    pub fn new(match_id: impl Into<String>, member_id: impl Into<String>, amount_due: Decimal) -> Self {
        Self {
            match_id: match_id.into(),
            member_id: member_id.into(),
            amount_due,
            joined_at: Utc::now(),
        }
    }
}

/// Participant row joined with the member's display name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParticipantDetail {
    pub member_id: String,
    pub member_name: String,
    pub amount_due: Decimal,
    pub joined_at: DateTime<Utc>,
}

/// Match together with its current participant count
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchSummary {
    #[serde(flatten)]
    pub inner: Match,
    pub participant_count: usize,
}

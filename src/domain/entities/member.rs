use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    #[default]
    Member,
    Admin,
}

impl MemberRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::Member => "member",
            MemberRole::Admin => "admin",
        }
    }
}

impl FromStr for MemberRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "member" => Ok(MemberRole::Member),
            "admin" => Ok(MemberRole::Admin),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

impl fmt::Display for MemberRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A chat user inside one group
///
/// `(group_id, external_id)` is unique: the same chat user in two groups is two members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: String,
    pub group_id: String,
    pub external_id: String,
    pub name: String,
    pub phone: Option<String>,
    pub role: MemberRole,
    pub joined_at: DateTime<Utc>,
}

impl Member {
    pub fn new(group_id: impl Into<String>, external_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            group_id: group_id.into(),
            external_id: external_id.into(),
            name: name.into(),
            phone: None,
            role: MemberRole::Member,
            joined_at: Utc::now(),
        }
    }

    pub fn with_phone(mut self, phone: Option<String>) -> Self {
        self.phone = phone;
        self
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Partial update applied by the directory; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MemberUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub role: Option<MemberRole>,
}

impl MemberUpdate {
    pub fn apply(&self, member: &mut Member) {
        if let Some(name) = &self.name {
            member.name = name.clone();
        }
        if let Some(phone) = &self.phone {
            member.phone = Some(phone.clone());
        }
        if let Some(role) = self.role {
            member.role = role;
        }
    }
}

/// Per-member activity summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberStats {
    pub member_id: String,
    pub name: String,
    pub phone: Option<String>,
    pub matches_joined: usize,
    pub total_amount_due: rust_decimal::Decimal,
}

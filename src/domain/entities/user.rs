use std::fmt;

/// Sender of an inbound chat message, as reported by the transport
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChatUser {
    pub id: String,
    pub push_name: Option<String>,
    pub phone: Option<String>,
}

impl ChatUser {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            push_name: None,
            phone: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.push_name = if name.trim().is_empty() { None } else { Some(name) };
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn display_name(&self) -> String {
        self.push_name.clone().unwrap_or_else(|| "User".to_string())
    }
}

impl fmt::Display for ChatUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

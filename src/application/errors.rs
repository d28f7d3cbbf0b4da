//! Application layer errors

use thiserror::Error;

/// Broad class of a failure, used to pick the reply and the HTTP status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Internal,
}

/// General bot errors
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Group not found: {0}")]
    GroupNotFound(String),

    #[error("Match not found: {0}")]
    MatchNotFound(String),

    #[error("Member not found: {0}")]
    MemberNotFound(String),

    #[error("Member already joined this match")]
    AlreadyJoined,

    #[error("Match is full ({max} participants)")]
    MatchFull { max: u32 },

    #[error("Member has not joined this match")]
    NotJoined,

    #[error("Match is already done")]
    MatchClosed,

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl BotError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BotError::Validation(_) => ErrorKind::Validation,
            BotError::GroupNotFound(_) | BotError::MatchNotFound(_) | BotError::MemberNotFound(_) => {
                ErrorKind::NotFound
            }
            BotError::AlreadyJoined
            | BotError::MatchFull { .. }
            | BotError::NotJoined
            | BotError::MatchClosed => ErrorKind::Conflict,
            BotError::Storage(_) | BotError::Transport(_) | BotError::Config(_) => ErrorKind::Internal,
        }
    }

    /// Status code an HTTP layer should answer with
    pub fn http_status(&self) -> u16 {
        match self.kind() {
            ErrorKind::NotFound => 404,
            ErrorKind::Validation | ErrorKind::Conflict => 400,
            ErrorKind::Internal => 500,
        }
    }

    /// Short chat reply for this error. Internal details never leak.
    pub fn user_message(&self) -> String {
        match self {
            BotError::Validation(msg) => msg.clone(),
            BotError::GroupNotFound(_) => "❌ Maaf, grup tidak ditemukan.".to_string(),
            BotError::MatchNotFound(_) => "❌ Maaf, pertandingan tidak ditemukan.".to_string(),
            BotError::MemberNotFound(_) => "❌ Maaf, anggota tidak ditemukan.".to_string(),
            BotError::AlreadyJoined => "❌ Anda sudah bergabung ke pertandingan ini!".to_string(),
            BotError::MatchFull { max } => {
                format!("❌ Pertandingan sudah penuh (maksimal {} peserta).", max)
            }
            BotError::NotJoined => "❌ Anda belum bergabung ke pertandingan ini!".to_string(),
            BotError::MatchClosed => "❌ Pertandingan ini sudah selesai.".to_string(),
            BotError::Storage(_) | BotError::Transport(_) | BotError::Config(_) => {
                "⚠️ Terjadi kesalahan saat memproses perintah. Coba lagi nanti!".to_string()
            }
        }
    }
}

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(BotError::MatchNotFound("m1".into()).http_status(), 404);
        assert_eq!(BotError::Validation("bad".into()).http_status(), 400);
        assert_eq!(BotError::AlreadyJoined.http_status(), 400);
        assert_eq!(BotError::MatchFull { max: 2 }.http_status(), 400);
        assert_eq!(BotError::Storage(StorageError::Internal("x".into())).http_status(), 500);
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let err = BotError::Storage(StorageError::Serialization("balance column corrupt".into()));
        assert!(!err.user_message().contains("corrupt"));
        assert_eq!(err.kind(), ErrorKind::Internal);
    }
}

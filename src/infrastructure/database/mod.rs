//! SQLite storage implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

use crate::application::errors::StorageError;
use crate::domain::entities::{
    Group, Match, MatchStatus, Member, MemberRole, MemberUpdate, NewTransaction, Participant,
    ParticipantDetail, Transaction, TransactionType,
};
use crate::domain::traits::Store;

const SCHEMA: &str = "
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS groups (
    id TEXT PRIMARY KEY,
    source_id TEXT UNIQUE NOT NULL,
    name TEXT NOT NULL,
    balance TEXT NOT NULL DEFAULT '0',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS members (
    id TEXT PRIMARY KEY,
    group_id TEXT NOT NULL REFERENCES groups(id) ON DELETE CASCADE,
    external_id TEXT NOT NULL,
    name TEXT NOT NULL,
    phone TEXT,
    role TEXT NOT NULL DEFAULT 'member',
    joined_at TEXT NOT NULL,
    UNIQUE(group_id, external_id)
);

CREATE TABLE IF NOT EXISTS matches (
    id TEXT PRIMARY KEY,
    group_id TEXT NOT NULL REFERENCES groups(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    venue TEXT NOT NULL,
    scheduled_at TEXT NOT NULL,
    price TEXT,
    max_participants INTEGER,
    status TEXT NOT NULL DEFAULT 'open',
    created_by TEXT REFERENCES members(id) ON DELETE SET NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS participants (
    match_id TEXT NOT NULL REFERENCES matches(id) ON DELETE CASCADE,
    member_id TEXT NOT NULL REFERENCES members(id) ON DELETE CASCADE,
    amount_due TEXT NOT NULL,
    joined_at TEXT NOT NULL,
    UNIQUE(match_id, member_id)
);

CREATE TABLE IF NOT EXISTS transactions (
    id TEXT PRIMARY KEY,
    group_id TEXT NOT NULL REFERENCES groups(id) ON DELETE CASCADE,
    kind TEXT NOT NULL,
    amount TEXT NOT NULL,
    description TEXT,
    match_id TEXT REFERENCES matches(id) ON DELETE SET NULL,
    recorded_by TEXT REFERENCES members(id) ON DELETE SET NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_matches_group ON matches(group_id, status);
CREATE INDEX IF NOT EXISTS idx_participants_member ON participants(member_id);
CREATE INDEX IF NOT EXISTS idx_transactions_group ON transactions(group_id, created_at);
";

/// SQLite-backed store
///
/// One connection guarded by a mutex; every trait call runs while holding it,
/// so multi-statement writes never interleave.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        tracing::info!("Opening database at {}", path.display());
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn
            .lock()
            .map_err(|_| StorageError::Internal("Lock poisoned".to_string()))
    }
}

fn conversion_error(idx: usize, err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, err.into())
}

fn decimal_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let raw: String = row.get(idx)?;
    Decimal::from_str(&raw).map_err(|e| conversion_error(idx, e))
}

fn optional_decimal_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Decimal>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| Decimal::from_str(&s).map_err(|e| conversion_error(idx, e)))
        .transpose()
}

fn parsed_at<T: FromStr<Err = String>>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e: String| conversion_error(idx, e))
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

const GROUP_COLUMNS: &str = "id, source_id, name, balance, created_at, updated_at";

fn group_from_row(row: &Row<'_>) -> rusqlite::Result<Group> {
    Ok(Group {
        id: row.get(0)?,
        source_id: row.get(1)?,
        name: row.get(2)?,
        balance: decimal_at(row, 3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

const MEMBER_COLUMNS: &str = "id, group_id, external_id, name, phone, role, joined_at";

fn member_from_row(row: &Row<'_>) -> rusqlite::Result<Member> {
    Ok(Member {
        id: row.get(0)?,
        group_id: row.get(1)?,
        external_id: row.get(2)?,
        name: row.get(3)?,
        phone: row.get(4)?,
        role: parsed_at::<MemberRole>(row, 5)?,
        joined_at: row.get(6)?,
    })
}

const MATCH_COLUMNS: &str =
    "id, group_id, name, venue, scheduled_at, price, max_participants, status, created_by, created_at, updated_at";

fn match_from_row(row: &Row<'_>) -> rusqlite::Result<Match> {
    Ok(Match {
        id: row.get(0)?,
        group_id: row.get(1)?,
        name: row.get(2)?,
        venue: row.get(3)?,
        scheduled_at: row.get(4)?,
        price: optional_decimal_at(row, 5)?,
        max_participants: row.get(6)?,
        status: parsed_at::<MatchStatus>(row, 7)?,
        created_by: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

fn participant_from_row(row: &Row<'_>) -> rusqlite::Result<Participant> {
    Ok(Participant {
        match_id: row.get(0)?,
        member_id: row.get(1)?,
        amount_due: decimal_at(row, 2)?,
        joined_at: row.get(3)?,
    })
}

const TRANSACTION_COLUMNS: &str =
    "id, group_id, kind, amount, description, match_id, recorded_by, created_at";

fn transaction_from_row(row: &Row<'_>) -> rusqlite::Result<Transaction> {
    Ok(Transaction {
        id: row.get(0)?,
        group_id: row.get(1)?,
        kind: parsed_at::<TransactionType>(row, 2)?,
        amount: decimal_at(row, 3)?,
        description: row.get(4)?,
        match_id: row.get(5)?,
        recorded_by: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn find_member(conn: &Connection, id: &str) -> rusqlite::Result<Option<Member>> {
    conn.query_row(
        &format!("SELECT {} FROM members WHERE id = ?1", MEMBER_COLUMNS),
        [id],
        member_from_row,
    )
    .optional()
}

#[async_trait]
impl Store for SqliteStore {
    async fn get_or_create_group(&self, source_id: &str, name: &str) -> Result<Group, StorageError> {
        let conn = self.lock()?;
        let candidate = Group::new(source_id, name);
        conn.execute(
            "INSERT OR IGNORE INTO groups (id, source_id, name, balance, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                candidate.id,
                candidate.source_id,
                candidate.name,
                candidate.balance.to_string(),
                candidate.created_at,
                candidate.updated_at
            ],
        )?;

        let group = conn.query_row(
            &format!("SELECT {} FROM groups WHERE source_id = ?1", GROUP_COLUMNS),
            [source_id],
            group_from_row,
        )?;
        Ok(group)
    }

    async fn get_group(&self, id: &str) -> Result<Option<Group>, StorageError> {
        let conn = self.lock()?;
        let group = conn
            .query_row(
                &format!("SELECT {} FROM groups WHERE id = ?1", GROUP_COLUMNS),
                [id],
                group_from_row,
            )
            .optional()?;
        Ok(group)
    }

    async fn list_groups(&self) -> Result<Vec<Group>, StorageError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM groups ORDER BY created_at DESC, rowid DESC",
            GROUP_COLUMNS
        ))?;
        let rows = stmt.query_map([], group_from_row)?;

        let mut groups = Vec::new();
        for group in rows {
            groups.push(group?);
        }
        Ok(groups)
    }

    async fn set_balance(&self, group_id: &str, balance: Decimal) -> Result<bool, StorageError> {
        let conn = self.lock()?;
        let rows = conn.execute(
            "UPDATE groups SET balance = ?1, updated_at = ?2 WHERE id = ?3",
            params![balance.to_string(), Utc::now(), group_id],
        )?;
        Ok(rows > 0)
    }

    async fn get_or_create_member(&self, candidate: &Member) -> Result<Member, StorageError> {
        let conn = self.lock()?;
        let group_exists: bool = conn
            .query_row("SELECT 1 FROM groups WHERE id = ?1", [&candidate.group_id], |_| Ok(true))
            .optional()?
            .unwrap_or(false);
        if !group_exists {
            return Err(StorageError::NotFound(format!("group {}", candidate.group_id)));
        }

        conn.execute(
            "INSERT OR IGNORE INTO members (id, group_id, external_id, name, phone, role, joined_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                candidate.id,
                candidate.group_id,
                candidate.external_id,
                candidate.name,
                candidate.phone,
                candidate.role.as_str(),
                candidate.joined_at
            ],
        )?;

        let member = conn.query_row(
            &format!(
                "SELECT {} FROM members WHERE group_id = ?1 AND external_id = ?2",
                MEMBER_COLUMNS
            ),
            [&candidate.group_id, &candidate.external_id],
            member_from_row,
        )?;
        Ok(member)
    }

    async fn get_member(&self, id: &str) -> Result<Option<Member>, StorageError> {
        let conn = self.lock()?;
        Ok(find_member(&conn, id)?)
    }

    async fn list_members(&self, group_id: &str) -> Result<Vec<Member>, StorageError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM members WHERE group_id = ?1 ORDER BY joined_at DESC, rowid DESC",
            MEMBER_COLUMNS
        ))?;
        let rows = stmt.query_map([group_id], member_from_row)?;

        let mut members = Vec::new();
        for member in rows {
            members.push(member?);
        }
        Ok(members)
    }

    async fn update_member(&self, id: &str, update: &MemberUpdate) -> Result<Option<Member>, StorageError> {
        let conn = self.lock()?;
        let Some(mut member) = find_member(&conn, id)? else {
            return Ok(None);
        };
        update.apply(&mut member);

        conn.execute(
            "UPDATE members SET name = ?1, phone = ?2, role = ?3 WHERE id = ?4",
            params![member.name, member.phone, member.role.as_str(), id],
        )?;
        Ok(Some(member))
    }

    async fn delete_member(&self, id: &str) -> Result<bool, StorageError> {
        let conn = self.lock()?;
        let rows = conn.execute("DELETE FROM members WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }

    async fn insert_match(&self, game: &Match) -> Result<(), StorageError> {
        let conn = self.lock()?;
        let group_exists: bool = conn
            .query_row("SELECT 1 FROM groups WHERE id = ?1", [&game.group_id], |_| Ok(true))
            .optional()?
            .unwrap_or(false);
        if !group_exists {
            return Err(StorageError::NotFound(format!("group {}", game.group_id)));
        }

        conn.execute(
            &format!(
                "INSERT INTO matches ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                MATCH_COLUMNS
            ),
            params![
                game.id,
                game.group_id,
                game.name,
                game.venue,
                game.scheduled_at,
                game.price.map(|p| p.to_string()),
                game.max_participants,
                game.status.as_str(),
                game.created_by,
                game.created_at,
                game.updated_at
            ],
        )?;
        Ok(())
    }

    async fn get_match(&self, id: &str) -> Result<Option<Match>, StorageError> {
        let conn = self.lock()?;
        let game = conn
            .query_row(
                &format!("SELECT {} FROM matches WHERE id = ?1", MATCH_COLUMNS),
                [id],
                match_from_row,
            )
            .optional()?;
        Ok(game)
    }

    async fn list_matches(&self, group_id: &str, status: Option<MatchStatus>) -> Result<Vec<Match>, StorageError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM matches
             WHERE group_id = ?1 AND (?2 IS NULL OR status = ?2)
             ORDER BY created_at DESC, rowid DESC",
            MATCH_COLUMNS
        ))?;
        let rows = stmt.query_map(params![group_id, status.map(|s| s.as_str())], match_from_row)?;

        let mut matches = Vec::new();
        for game in rows {
            matches.push(game?);
        }
        Ok(matches)
    }

    async fn set_match_status(&self, id: &str, status: MatchStatus) -> Result<bool, StorageError> {
        let conn = self.lock()?;
        let rows = conn.execute(
            "UPDATE matches SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![status.as_str(), Utc::now(), id],
        )?;
        Ok(rows > 0)
    }

    async fn insert_participant(&self, participant: &Participant) -> Result<(), StorageError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO participants (match_id, member_id, amount_due, joined_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                participant.match_id,
                participant.member_id,
                participant.amount_due.to_string(),
                participant.joined_at
            ],
        )
        .map_err(|e| {
            if is_unique_violation(&e) {
                StorageError::UniqueViolation(format!(
                    "participant ({}, {})",
                    participant.match_id, participant.member_id
                ))
            } else {
                StorageError::Sqlite(e)
            }
        })?;
        Ok(())
    }

    async fn delete_participant(&self, match_id: &str, member_id: &str) -> Result<bool, StorageError> {
        let conn = self.lock()?;
        let rows = conn.execute(
            "DELETE FROM participants WHERE match_id = ?1 AND member_id = ?2",
            [match_id, member_id],
        )?;
        Ok(rows > 0)
    }

    async fn get_participant(&self, match_id: &str, member_id: &str) -> Result<Option<Participant>, StorageError> {
        let conn = self.lock()?;
        let participant = conn
            .query_row(
                "SELECT match_id, member_id, amount_due, joined_at FROM participants
                 WHERE match_id = ?1 AND member_id = ?2",
                [match_id, member_id],
                participant_from_row,
            )
            .optional()?;
        Ok(participant)
    }

    async fn list_participants(&self, match_id: &str) -> Result<Vec<ParticipantDetail>, StorageError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT p.member_id, m.name, p.amount_due, p.joined_at
             FROM participants p
             JOIN members m ON m.id = p.member_id
             WHERE p.match_id = ?1
             ORDER BY p.joined_at, p.rowid",
        )?;
        let rows = stmt.query_map([match_id], |row| {
            Ok(ParticipantDetail {
                member_id: row.get(0)?,
                member_name: row.get(1)?,
                amount_due: decimal_at(row, 2)?,
                joined_at: row.get::<_, DateTime<Utc>>(3)?,
            })
        })?;

        let mut participants = Vec::new();
        for participant in rows {
            participants.push(participant?);
        }
        Ok(participants)
    }

    async fn list_participations(&self, member_id: &str) -> Result<Vec<Participant>, StorageError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT match_id, member_id, amount_due, joined_at FROM participants
             WHERE member_id = ?1 ORDER BY joined_at, rowid",
        )?;
        let rows = stmt.query_map([member_id], participant_from_row)?;

        let mut participants = Vec::new();
        for participant in rows {
            participants.push(participant?);
        }
        Ok(participants)
    }

    async fn count_participants(&self, match_id: &str) -> Result<usize, StorageError> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM participants WHERE match_id = ?1",
            [match_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    async fn append_transactions(&self, group_id: &str, entries: Vec<NewTransaction>) -> Result<Vec<Transaction>, StorageError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let mut balance = tx
            .query_row("SELECT balance FROM groups WHERE id = ?1", [group_id], |row| decimal_at(row, 0))
            .optional()?
            .ok_or_else(|| StorageError::NotFound(format!("group {}", group_id)))?;

        let mut recorded = Vec::with_capacity(entries.len());
        for entry in entries {
            let transaction = entry.into_transaction(group_id);
            balance = balance
                .checked_add(transaction.signed_amount())
                .ok_or_else(|| StorageError::Internal("balance overflow".to_string()))?;

            tx.execute(
                &format!(
                    "INSERT INTO transactions ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    TRANSACTION_COLUMNS
                ),
                params![
                    transaction.id,
                    transaction.group_id,
                    transaction.kind.as_str(),
                    transaction.amount.to_string(),
                    transaction.description,
                    transaction.match_id,
                    transaction.recorded_by,
                    transaction.created_at
                ],
            )?;
            recorded.push(transaction);
        }

        tx.execute(
            "UPDATE groups SET balance = ?1, updated_at = ?2 WHERE id = ?3",
            params![balance.to_string(), Utc::now(), group_id],
        )?;
        tx.commit()?;

        Ok(recorded)
    }

    async fn list_transactions(&self, group_id: &str, limit: Option<usize>) -> Result<Vec<Transaction>, StorageError> {
        let conn = self.lock()?;
        let limit = limit.map(|l| l as i64).unwrap_or(-1);
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM transactions WHERE group_id = ?1
             ORDER BY created_at DESC, rowid DESC LIMIT ?2",
            TRANSACTION_COLUMNS
        ))?;
        let rows = stmt.query_map(params![group_id, limit], transaction_from_row)?;

        let mut transactions = Vec::new();
        for transaction in rows {
            transactions.push(transaction?);
        }
        Ok(transactions)
    }
}

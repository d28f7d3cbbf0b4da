//! Domain entities - Core business objects with no external dependencies

pub mod user;
pub mod message;
pub mod command;
pub mod group;
pub mod member;
pub mod matches;
pub mod transaction;

pub use user::ChatUser;
pub use message::{InboundMessage, Content};
pub use command::{Command, CommandKind, CommandRegistry};
pub use group::{Group, GroupStats};
pub use member::{Member, MemberRole, MemberStats, MemberUpdate};
pub use matches::{Match, MatchStatus, MatchSummary, Participant, ParticipantDetail};
pub use transaction::{Balance, NewTransaction, Transaction, TransactionType};

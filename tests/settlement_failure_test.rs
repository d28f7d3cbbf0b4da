//! Settlement failure handling at /endmatch
//! Run with: cargo test --test settlement_failure_test

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Once};

use kas_bot::application::errors::StorageError;
use kas_bot::application::messaging::{Dispatch, Dispatcher};
use kas_bot::application::services::{CommandService, KasSettings, Services};
use kas_bot::domain::entities::{
    ChatUser, Group, InboundMessage, Match, MatchStatus, Member, MemberUpdate, NewTransaction,
    Participant, ParticipantDetail, Transaction,
};
use kas_bot::domain::traits::Store;
use kas_bot::infrastructure::MemoryStore;

static INIT: Once = Once::new();

fn ensure_init() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

const GROUP: &str = "120363@g.us";

/// MemoryStore whose ledger writes fail while `fail_appends` is set
struct FailingLedgerStore {
    inner: MemoryStore,
    fail_appends: AtomicBool,
}

#[async_trait]
impl Store for FailingLedgerStore {
    async fn get_or_create_group(&self, source_id: &str, name: &str) -> Result<Group, StorageError> {
        self.inner.get_or_create_group(source_id, name).await
    }
    async fn get_group(&self, id: &str) -> Result<Option<Group>, StorageError> {
        self.inner.get_group(id).await
    }
    async fn list_groups(&self) -> Result<Vec<Group>, StorageError> {
        self.inner.list_groups().await
    }
    async fn set_balance(&self, group_id: &str, balance: Decimal) -> Result<bool, StorageError> {
        self.inner.set_balance(group_id, balance).await
    }
    async fn get_or_create_member(&self, candidate: &Member) -> Result<Member, StorageError> {
        self.inner.get_or_create_member(candidate).await
    }
    async fn get_member(&self, id: &str) -> Result<Option<Member>, StorageError> {
        self.inner.get_member(id).await
    }
    async fn list_members(&self, group_id: &str) -> Result<Vec<Member>, StorageError> {
        self.inner.list_members(group_id).await
    }
    async fn update_member(&self, id: &str, update: &MemberUpdate) -> Result<Option<Member>, StorageError> {
        self.inner.update_member(id, update).await
    }
    async fn delete_member(&self, id: &str) -> Result<bool, StorageError> {
        self.inner.delete_member(id).await
    }
    async fn insert_match(&self, game: &Match) -> Result<(), StorageError> {
        self.inner.insert_match(game).await
    }
    async fn get_match(&self, id: &str) -> Result<Option<Match>, StorageError> {
        self.inner.get_match(id).await
    }
    async fn list_matches(&self, group_id: &str, status: Option<MatchStatus>) -> Result<Vec<Match>, StorageError> {
        self.inner.list_matches(group_id, status).await
    }
    async fn set_match_status(&self, id: &str, status: MatchStatus) -> Result<bool, StorageError> {
        self.inner.set_match_status(id, status).await
    }
    async fn insert_participant(&self, participant: &Participant) -> Result<(), StorageError> {
        self.inner.insert_participant(participant).await
    }
    async fn delete_participant(&self, match_id: &str, member_id: &str) -> Result<bool, StorageError> {
        self.inner.delete_participant(match_id, member_id).await
    }
    async fn get_participant(&self, match_id: &str, member_id: &str) -> Result<Option<Participant>, StorageError> {
        self.inner.get_participant(match_id, member_id).await
    }
    async fn list_participants(&self, match_id: &str) -> Result<Vec<ParticipantDetail>, StorageError> {
        self.inner.list_participants(match_id).await
    }
    async fn list_participations(&self, member_id: &str) -> Result<Vec<Participant>, StorageError> {
        self.inner.list_participations(member_id).await
    }
    async fn count_participants(&self, match_id: &str) -> Result<usize, StorageError> {
        self.inner.count_participants(match_id).await
    }
    async fn append_transactions(&self, group_id: &str, entries: Vec<NewTransaction>) -> Result<Vec<Transaction>, StorageError> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(StorageError::Internal("ledger unavailable".to_string()));
        }
        self.inner.append_transactions(group_id, entries).await
    }
    async fn list_transactions(&self, group_id: &str, limit: Option<usize>) -> Result<Vec<Transaction>, StorageError> {
        self.inner.list_transactions(group_id, limit).await
    }
}

fn setup() -> (Dispatcher, Services, Arc<FailingLedgerStore>) {
    ensure_init();
    let failing = Arc::new(FailingLedgerStore {
        inner: MemoryStore::new(),
        fail_appends: AtomicBool::new(false),
    });
    let store: Arc<dyn Store> = failing.clone();
    let services = Services::new(store);

    let mut commands = CommandService::new("/");
    commands.register_defaults();

    let dispatcher = Dispatcher::new(commands, services.clone(), KasSettings::default());
    (dispatcher, services, failing)
}

async fn say(dispatcher: &Dispatcher, user: &str, text: &str) -> String {
    let message = InboundMessage::group(GROUP, text, ChatUser::new(format!("{}-id", user)).with_name(user));
    match dispatcher.dispatch(&message).await {
        Dispatch::Replied(reply) => reply,
        Dispatch::Ignored => panic!("{} was ignored", text),
    }
}

#[tokio::test]
async fn test_failed_settlement_keeps_match_open_for_retry() {
    let (dispatcher, services, store) = setup();

    say(&dispatcher, "Andi", "/newmatch Futsal Court 50000").await;
    say(&dispatcher, "Budi", "/join 1").await;

    store.fail_appends.store(true, Ordering::SeqCst);
    let reply = say(&dispatcher, "Andi", "/endmatch").await;
    assert!(reply.contains("Terjadi kesalahan"), "{}", reply);

    let group = services.directory.resolve_group(GROUP).await.unwrap().id;
    let game = services.matches.list_matches(&group, None).await.unwrap()[0].inner.clone();
    assert_eq!(game.status, MatchStatus::Open);
    assert_eq!(services.ledger.get_balance(&group).await.unwrap().balance, Decimal::ZERO);
    assert!(services.ledger.get_history(&group, None).await.unwrap().is_empty());

    store.fail_appends.store(false, Ordering::SeqCst);
    let reply = say(&dispatcher, "Andi", "/endmatch").await;
    assert!(reply.contains("Total masuk kas: Rp 100.000"), "{}", reply);

    let game = services.matches.get_match(&game.id).await.unwrap();
    assert_eq!(game.status, MatchStatus::Done);
    assert_eq!(services.ledger.get_balance(&group).await.unwrap().balance, dec!(100000));
    assert_eq!(services.ledger.get_history(&group, None).await.unwrap().len(), 2);
    assert_eq!(services.matches.active_locks(), 0);
}

#[tokio::test]
async fn test_failed_settlement_in_registry_leaves_match_open() {
    let (dispatcher, services, store) = setup();

    say(&dispatcher, "Andi", "/newmatch Basket Hall 30000").await;
    let group = services.directory.resolve_group(GROUP).await.unwrap().id;
    let game = services.matches.list_matches(&group, None).await.unwrap()[0].inner.clone();

    store.fail_appends.store(true, Ordering::SeqCst);
    let ledger = &services.ledger;
    let result = services
        .matches
        .end_match_with(&game.id, |open| async move {
            ledger.apply_settlement(&open.group_id, &open.id, None).await
        })
        .await;
    assert!(result.is_err());
    assert!(services.matches.get_match(&game.id).await.unwrap().is_open());

    // members can still join the open match
    let reply = say(&dispatcher, "Budi", "/join 1").await;
    assert!(reply.contains("Berhasil bergabung"), "{}", reply);
    assert_eq!(services.matches.participants(&game.id).await.unwrap().len(), 2);
}

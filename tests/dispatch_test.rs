//! Dispatcher integration tests
//! Run with: cargo test --test dispatch_test

use rust_decimal_macros::dec;
use std::sync::{Arc, Once};
use tokio::sync::mpsc;

use kas_bot::application::messaging::{Dispatch, Dispatcher};
use kas_bot::application::services::{CommandService, KasSettings, MessageService, Services};
use kas_bot::domain::entities::{ChatUser, Command, CommandKind, InboundMessage, MatchStatus};
use kas_bot::domain::traits::Store;
use kas_bot::infrastructure::adapters::ConsoleAdapter;
use kas_bot::infrastructure::config::ConsoleConfig;
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

fn setup() -> (Dispatcher, Services) {
    setup_with_prefix("/")
}

fn setup_with_prefix(prefix: &str) -> (Dispatcher, Services) {
    ensure_init();
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let services = Services::new(store);

    let mut commands = CommandService::new(prefix);
    commands.register_defaults();

    let dispatcher = Dispatcher::new(commands, services.clone(), KasSettings::default());
    (dispatcher, services)
}

fn from(user: &str, text: &str) -> InboundMessage {
    InboundMessage::group(GROUP, text, ChatUser::new(format!("{}-id", user)).with_name(user))
}

async fn say(dispatcher: &Dispatcher, user: &str, text: &str) -> String {
    match dispatcher.dispatch(&from(user, text)).await {
        Dispatch::Replied(reply) => reply,
        Dispatch::Ignored => panic!("{} was ignored", text),
    }
}

async fn group_id(services: &Services) -> String {
    services.directory.resolve_group(GROUP).await.unwrap().id
}

#[tokio::test]
async fn test_newmatch_creates_match_and_joins_creator() {
    let (dispatcher, services) = setup();

    let reply = say(&dispatcher, "Andi", "/newmatch Futsal \"Court A\" 50000").await;
    assert!(reply.contains("Pertandingan Baru Dibuat"), "{}", reply);
    assert!(reply.contains("Rp 50.000"));

    let group = group_id(&services).await;
    let matches = services.matches.list_matches(&group, None).await.unwrap();
    assert_eq!(matches.len(), 1);

    let summary = &matches[0];
    assert_eq!(summary.inner.name, "Futsal");
    assert_eq!(summary.inner.venue, "Court A");
    assert_eq!(summary.inner.price, Some(dec!(50000)));
    assert_eq!(summary.inner.status, MatchStatus::Open);
    assert_eq!(summary.participant_count, 1);
}

#[tokio::test]
async fn test_newmatch_multi_word_venue_and_max_flag() {
    let (dispatcher, services) = setup();

    say(&dispatcher, "Andi", "/nm Badminton GOR Satria Rp75.000 --max 4").await;

    let group = group_id(&services).await;
    let game = &services.matches.list_matches(&group, None).await.unwrap()[0].inner;
    assert_eq!(game.venue, "GOR Satria");
    assert_eq!(game.price, Some(dec!(75000)));
    assert_eq!(game.max_participants, Some(4));
}

#[tokio::test]
async fn test_newmatch_rejects_bad_input() {
    let (dispatcher, services) = setup();

    let reply = say(&dispatcher, "Andi", "/newmatch Futsal 50000").await;
    assert!(reply.contains("Format salah"), "{}", reply);

    let reply = say(&dispatcher, "Andi", "/newmatch Futsal Court gratis").await;
    assert_eq!(reply, "❌ Harga harus berupa angka positif");

    let reply = say(&dispatcher, "Andi", "/newmatch Futsal Court 50000 --max nol").await;
    assert!(reply.contains("--max"));

    let group = group_id(&services).await;
    assert!(services.matches.list_matches(&group, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_newmatch_caps_price() {
    let (dispatcher, services) = setup();

    let reply = say(&dispatcher, "Andi", "/newmatch Futsal Court 1000000001").await;
    assert_eq!(reply, "❌ Harga maksimal Rp 1.000.000.000");

    let huge = "/newmatch Futsal Court 79228162514264337593543950335";
    let reply = say(&dispatcher, "Andi", huge).await;
    assert_eq!(reply, "❌ Harga maksimal Rp 1.000.000.000");

    let group = group_id(&services).await;
    assert!(services.matches.list_matches(&group, None).await.unwrap().is_empty());

    let reply = say(&dispatcher, "Andi", "/newmatch Futsal Court Rp1.000.000.000").await;
    assert!(reply.contains("Pertandingan Baru Dibuat"), "{}", reply);
}

#[tokio::test]
async fn test_usage_error_follows_prefix() {
    let (dispatcher, _) = setup_with_prefix("!");

    let reply = say(&dispatcher, "Andi", "!newmatch Futsal 50000").await;
    assert!(reply.contains("Format salah"), "{}", reply);
    assert!(reply.contains("!newmatch <olahraga>"), "{}", reply);
    assert!(reply.contains("Alias: !nm, !buatmatch"), "{}", reply);
    assert!(!reply.contains("/newmatch"), "{}", reply);
}

#[tokio::test]
async fn test_unknown_command_is_handled() {
    let (dispatcher, _) = setup();

    let outcome = dispatcher.dispatch(&from("Andi", "/unknown")).await;
    assert!(outcome.is_handled());
    assert_eq!(
        outcome.reply(),
        Some("❌ Perintah tidak ditemukan: /unknown\n\nKetik /help untuk melihat semua perintah")
    );
}

#[tokio::test]
async fn test_non_group_and_plain_text_are_ignored() {
    let (dispatcher, services) = setup();

    let private = InboundMessage::new("628123@c.us", "/help", ChatUser::new("628123"));
    assert_eq!(dispatcher.dispatch(&private).await, Dispatch::Ignored);

    let chatter = from("Andi", "main jam berapa?");
    assert_eq!(dispatcher.dispatch(&chatter).await, Dispatch::Ignored);

    assert!(services.directory.list_groups().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_commands_are_case_insensitive() {
    let (dispatcher, _) = setup();

    let reply = say(&dispatcher, "Andi", "/HELP").await;
    assert!(reply.contains("/newmatch"));

    let reply = say(&dispatcher, "Andi", "/Bantuan join").await;
    assert!(reply.starts_with("📌 *JOIN*"), "{}", reply);
}

#[tokio::test]
async fn test_first_contact_provisions_group_and_member_once() {
    let (dispatcher, services) = setup();

    say(&dispatcher, "Andi", "/kas").await;
    say(&dispatcher, "Andi", "/listmatch").await;

    let groups = services.directory.list_groups().await.unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].name, "Group 120363");

    let members = services.directory.list_members(&groups[0].group_id).await.unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].name, "Andi");
}

#[tokio::test]
async fn test_join_and_leave_flow() {
    let (dispatcher, _) = setup();

    let reply = say(&dispatcher, "Budi", "/join").await;
    assert!(reply.contains("Tidak ada pertandingan aktif"));

    say(&dispatcher, "Andi", "/newmatch Futsal Court 50000 --max 2").await;

    let reply = say(&dispatcher, "Budi", "/join").await;
    assert!(reply.contains("Daftar Pertandingan Aktif"));
    assert!(reply.contains("1 peserta"));

    let reply = say(&dispatcher, "Budi", "/j 3").await;
    assert_eq!(reply, "❌ Nomor pertandingan tidak valid! Pilih antara 1-1");

    let reply = say(&dispatcher, "Budi", "/join 1").await;
    assert!(reply.contains("Berhasil bergabung"), "{}", reply);

    let reply = say(&dispatcher, "Budi", "/join 1").await;
    assert_eq!(reply, "❌ Anda sudah bergabung ke pertandingan ini!");

    let reply = say(&dispatcher, "Citra", "/join 1").await;
    assert_eq!(reply, "❌ Pertandingan sudah penuh (maksimal 2 peserta).");

    let reply = say(&dispatcher, "Budi", "/leave").await;
    assert!(reply.contains("Berhasil keluar"), "{}", reply);

    let reply = say(&dispatcher, "Budi", "/keluar").await;
    assert_eq!(reply, "❌ Anda tidak bergabung ke pertandingan manapun!");

    let reply = say(&dispatcher, "Citra", "/join 1").await;
    assert!(reply.contains("Berhasil bergabung"));
}

#[tokio::test]
async fn test_leave_with_several_joined_matches_asks_for_index() {
    let (dispatcher, services) = setup();

    say(&dispatcher, "Andi", "/newmatch Futsal Court 50000").await;
    say(&dispatcher, "Andi", "/newmatch Basket Hall 30000").await;

    let reply = say(&dispatcher, "Andi", "/leave").await;
    assert!(reply.contains("Pilih pertandingan"), "{}", reply);
    assert!(reply.contains("1. Basket - Hall"));

    say(&dispatcher, "Andi", "/leave 1").await;

    let group = group_id(&services).await;
    let matches = services.matches.list_matches(&group, None).await.unwrap();
    let basket = matches.iter().find(|m| m.inner.name == "Basket").unwrap();
    let futsal = matches.iter().find(|m| m.inner.name == "Futsal").unwrap();
    assert_eq!(basket.participant_count, 0);
    assert_eq!(futsal.participant_count, 1);
}

#[tokio::test]
async fn test_status_lists_participants() {
    let (dispatcher, _) = setup();

    say(&dispatcher, "Andi", "/newmatch Futsal Court 50000 --max 10").await;
    say(&dispatcher, "Budi", "/join 1").await;

    let reply = say(&dispatcher, "Citra", "/status").await;
    assert!(reply.contains("Peserta (2/10)"), "{}", reply);
    assert!(reply.contains("1. Andi"));
    assert!(reply.contains("2. Budi"));
}

#[tokio::test]
async fn test_endmatch_settles_exactly_once() {
    let (dispatcher, services) = setup();

    say(&dispatcher, "Andi", "/newmatch Futsal Court 50000").await;
    say(&dispatcher, "Budi", "/join 1").await;

    let reply = say(&dispatcher, "Andi", "/endmatch").await;
    assert!(reply.contains("Pertandingan Selesai"), "{}", reply);
    assert!(reply.contains("Tagihan per orang: Rp 50.000"));
    assert!(reply.contains("Total masuk kas: Rp 100.000"));

    let reply = say(&dispatcher, "Andi", "/endmatch").await;
    assert!(reply.contains("Tidak ada pertandingan aktif"));

    let group = group_id(&services).await;
    let game = &services.matches.list_matches(&group, None).await.unwrap()[0].inner;
    assert_eq!(game.status, MatchStatus::Done);
    assert!(!services.matches.end_match(&game.id).await.unwrap());

    let balance = services.ledger.get_balance(&group).await.unwrap();
    assert_eq!(balance.balance, dec!(100000));

    let history = services.ledger.get_history(&group, None).await.unwrap();
    assert_eq!(history.len(), 2);
    assert!(history
        .iter()
        .all(|t| t.description.as_deref() == Some("Tagihan pertandingan: Futsal")));

    let reply = say(&dispatcher, "Budi", "/saldo").await;
    assert!(reply.contains("Rp 100.000"));

    let reply = say(&dispatcher, "Budi", "/hk 1").await;
    assert!(reply.contains("(1 terakhir)"), "{}", reply);

    let reply = say(&dispatcher, "Budi", "/lm").await;
    assert!(reply.contains("Selesai"));
    assert!(reply.contains("• Futsal - Court"));
}

#[tokio::test]
async fn test_historykas_rejects_bad_limit() {
    let (dispatcher, _) = setup();

    let reply = say(&dispatcher, "Andi", "/historykas banyak").await;
    assert!(reply.contains("Format salah"));

    let reply = say(&dispatcher, "Andi", "/historykas").await;
    assert_eq!(reply, "📭 Belum ada transaksi kas.");
}

#[tokio::test]
async fn test_reregistering_overwrites_command() {
    let (mut dispatcher, _) = setup();

    dispatcher.register(Command::new("kas", CommandKind::Help).with_aliases(["saldo"]));

    let reply = say(&dispatcher, "Andi", "/saldo").await;
    assert!(reply.contains("Daftar Perintah"), "{}", reply);
}

#[tokio::test]
async fn test_message_service_delivers_reply() {
    let (dispatcher, _) = setup();
    let (tx, mut rx) = mpsc::channel(4);

    let console = ConsoleConfig {
        source_id: GROUP.to_string(),
        ..ConsoleConfig::default()
    };
    let adapter = ConsoleAdapter::new(&console).with_sender(tx);
    let service = MessageService::new(adapter, Arc::new(dispatcher));

    let message = service.transport().message_from_line("@Dewi /kas").unwrap();
    assert!(service.process(&message).await);

    let (chat_id, text) = rx.recv().await.unwrap();
    assert_eq!(chat_id, GROUP);
    assert!(text.contains("Rp 0"));

    let chatter = service.transport().message_from_line("halo semua").unwrap();
    assert!(!service.process(&chatter).await);
}

//! Chat command handlers
//!
//! Every [`CommandKind`] runs through [`Command::execute`]. Handlers return the
//! reply text; user mistakes come back as [`BotError::Validation`] carrying the
//! text to show.

use chrono::{Duration, Utc};
use rust_decimal::Decimal;

use crate::application::errors::{BotError, ConfigError};
use crate::application::services::{CommandService, KasSettings, NewMatch, Services};
use crate::domain::entities::{
    Command, CommandKind, Group, Match, MatchStatus, MatchSummary, Member, TransactionType,
};
use super::format::{format_money, parse_amount, parse_index, usage_error};
use super::parser::parse_flags;

/// Resolved sender and group for one command
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub source_id: String,
    pub user_name: String,
    pub group: Group,
    pub member: Member,
}

/// Shared state handlers read from
pub struct HandlerEnv<'a> {
    pub services: &'a Services,
    pub commands: &'a CommandService,
    pub settings: &'a KasSettings,
}

impl HandlerEnv<'_> {
    fn money(&self, amount: Decimal) -> String {
        format_money(amount, &self.settings.currency_symbol)
    }

    fn prefix(&self) -> &str {
        self.commands.prefix()
    }

    async fn open_matches(&self, group_id: &str) -> Result<Vec<MatchSummary>, BotError> {
        self.services.matches.list_matches(group_id, Some(MatchStatus::Open)).await
    }

    fn no_active_matches(&self) -> String {
        format!(
            "❌ Tidak ada pertandingan aktif. Ketik {}newmatch untuk membuat!",
            self.prefix()
        )
    }
}

impl Command {
    pub async fn execute(&self, env: &HandlerEnv<'_>, ctx: &CommandContext, args: &[String]) -> Result<String, BotError> {
        match self.kind {
            CommandKind::Help => Ok(env.commands.get_help(args.first().map(String::as_str))),
            CommandKind::NewMatch => new_match(self, env, ctx, args).await,
            CommandKind::Join => join(env, ctx, args).await,
            CommandKind::Leave => leave(env, ctx, args).await,
            CommandKind::ListMatch => list_matches(env, ctx).await,
            CommandKind::Status => status(env, ctx, args).await,
            CommandKind::EndMatch => end_match(env, ctx, args).await,
            CommandKind::Kas => kas(env, ctx).await,
            CommandKind::HistoryKas => history(self, env, ctx, args).await,
        }
    }
}

/// Highest per-person price `/newmatch` accepts
pub const MAX_MATCH_PRICE: i64 = 1_000_000_000;

fn invalid_index(len: usize) -> BotError {
    BotError::Validation(format!("❌ Nomor pertandingan tidak valid! Pilih antara 1-{}", len))
}

/// Pick the match at a 1-based position, defaulting to the first
fn select<'a>(matches: &'a [MatchSummary], arg: Option<&String>) -> Result<&'a MatchSummary, BotError> {
    let idx = match arg {
        Some(raw) => parse_index(raw, matches.len()).ok_or_else(|| invalid_index(matches.len()))?,
        None => 0,
    };
    matches.get(idx).ok_or_else(|| invalid_index(matches.len()))
}

fn match_line(env: &HandlerEnv<'_>, game: &Match) -> String {
    format!("*{}* - {}\n   💰 {}", game.name, game.venue, env.money(game.price_or_zero()))
}

async fn new_match(cmd: &Command, env: &HandlerEnv<'_>, ctx: &CommandContext, args: &[String]) -> Result<String, BotError> {
    let (positional, flags) = parse_flags(args);
    if positional.len() < 3 {
        return Err(BotError::Validation(usage_error(cmd, env.prefix())));
    }

    let name = &positional[0];
    let venue = positional[1..positional.len() - 1].join(" ");
    let price = parse_amount(&positional[positional.len() - 1])
        .filter(|p| *p > Decimal::ZERO)
        .ok_or_else(|| BotError::Validation("❌ Harga harus berupa angka positif".to_string()))?;
    if price > Decimal::from(MAX_MATCH_PRICE) {
        return Err(BotError::Validation(format!(
            "❌ Harga maksimal {}",
            env.money(Decimal::from(MAX_MATCH_PRICE))
        )));
    }

    let scheduled_at = Duration::try_minutes(env.settings.match_start_offset_minutes)
        .and_then(|offset| Utc::now().checked_add_signed(offset))
        .ok_or_else(|| {
            ConfigError::InvalidValue("kas.match-start-offset-minutes is out of range".to_string())
        })?;
    let mut request = NewMatch::new(&ctx.group.id, name, venue, scheduled_at)
        .with_price(price)
        .with_creator(&ctx.member.id);

    if let Some(raw) = flags.get("max") {
        let max = raw
            .parse::<u32>()
            .ok()
            .filter(|m| *m > 0)
            .ok_or_else(|| BotError::Validation("❌ Nilai --max harus berupa angka positif".to_string()))?;
        request = request.with_max_participants(max);
    }

    let game = env.services.matches.create_match(request).await?;
    env.services.matches.add_participant(&game.id, &ctx.member.id).await?;

    let capacity = game
        .max_participants
        .map(|max| format!(" (maksimal {})", max))
        .unwrap_or_default();

    Ok(format!(
        "✅ *Pertandingan Baru Dibuat!*\n\n\
         📌 *{}*\n\
         📍 Lokasi: {}\n\
         💰 Harga: {}\n\
         🕐 Waktu: {}\n\
         👥 Peserta: 1 orang (Anda){}\n\n\
         Ketik *{}join* untuk bergabung ke pertandingan ini!",
        game.name,
        game.venue,
        env.money(price),
        game.scheduled_at.format("%d/%m/%Y %H:%M UTC"),
        capacity,
        env.prefix()
    ))
}

async fn join(env: &HandlerEnv<'_>, ctx: &CommandContext, args: &[String]) -> Result<String, BotError> {
    let open = env.open_matches(&ctx.group.id).await?;
    if open.is_empty() {
        return Ok(env.no_active_matches());
    }

    let Some(raw) = args.first() else {
        let mut text = "📋 *Daftar Pertandingan Aktif:*\n\n".to_string();
        for (idx, summary) in open.iter().enumerate() {
            text.push_str(&format!(
                "{}. {}\n   👥 {} peserta\n\n",
                idx + 1,
                match_line(env, &summary.inner),
                summary.participant_count
            ));
        }
        text.push_str(&format!(
            "Ketik *{p}join <nomor>* untuk bergabung\nContoh: {p}join 1",
            p = env.prefix()
        ));
        return Ok(text);
    };

    let idx = parse_index(raw, open.len()).ok_or_else(|| invalid_index(open.len()))?;
    let game = &open[idx].inner;
    env.services.matches.add_participant(&game.id, &ctx.member.id).await?;

    Ok(format!(
        "✅ *Berhasil bergabung!*\n\n📌 {}\n📍 {}\n💰 {}\n\n\
         Ketik *{p}status* untuk lihat detail pertandingan\n\
         Ketik *{p}leave* untuk keluar dari pertandingan",
        game.name,
        game.venue,
        env.money(game.price_or_zero()),
        p = env.prefix()
    ))
}

async fn leave(env: &HandlerEnv<'_>, ctx: &CommandContext, args: &[String]) -> Result<String, BotError> {
    let open = env.open_matches(&ctx.group.id).await?;
    if open.is_empty() {
        return Ok(env.no_active_matches());
    }

    let joined = env
        .services
        .matches
        .open_matches_joined_by(&ctx.group.id, &ctx.member.id)
        .await?;

    let game = match (args.first(), joined.len()) {
        (_, 0) => return Ok("❌ Anda tidak bergabung ke pertandingan manapun!".to_string()),
        (Some(raw), len) => {
            let idx = parse_index(raw, len).ok_or_else(|| invalid_index(len))?;
            &joined[idx]
        }
        (None, 1) => &joined[0],
        (None, _) => {
            let mut text = "📋 *Pilih pertandingan untuk ditinggalkan:*\n\n".to_string();
            for (idx, game) in joined.iter().enumerate() {
                text.push_str(&format!("{}. {} - {}\n", idx + 1, game.name, game.venue));
            }
            text.push_str(&format!(
                "\nKetik *{p}leave <nomor>* untuk keluar\nContoh: {p}leave 1",
                p = env.prefix()
            ));
            return Ok(text);
        }
    };

    env.services.matches.remove_participant(&game.id, &ctx.member.id).await?;
    Ok(format!(
        "✅ *Berhasil keluar dari pertandingan!*\n\n{} - {}",
        game.name, game.venue
    ))
}

async fn list_matches(env: &HandlerEnv<'_>, ctx: &CommandContext) -> Result<String, BotError> {
    let matches = env.services.matches.list_matches(&ctx.group.id, None).await?;
    if matches.is_empty() {
        return Ok(format!(
            "📭 Belum ada pertandingan. Ketik {}newmatch untuk membuat!",
            env.prefix()
        ));
    }

    let (active, done): (Vec<_>, Vec<_>) = matches.iter().partition(|m| m.inner.is_open());
    let mut text = "📋 *Daftar Pertandingan*\n\n".to_string();

    if !active.is_empty() {
        text.push_str("🟢 *Aktif:*\n");
        for (idx, summary) in active.iter().enumerate() {
            let capacity = match summary.inner.max_participants {
                Some(max) => format!("{}/{}", summary.participant_count, max),
                None => summary.participant_count.to_string(),
            };
            text.push_str(&format!(
                "{}. {}\n   👥 {} peserta\n\n",
                idx + 1,
                match_line(env, &summary.inner),
                capacity
            ));
        }
    }

    if !done.is_empty() {
        text.push_str("✅ *Selesai:*\n");
        for summary in done.iter().take(5) {
            text.push_str(&format!("• {} - {}\n", summary.inner.name, summary.inner.venue));
        }
    }

    Ok(text.trim_end().to_string())
}

async fn status(env: &HandlerEnv<'_>, ctx: &CommandContext, args: &[String]) -> Result<String, BotError> {
    let open = env.open_matches(&ctx.group.id).await?;
    if open.is_empty() {
        return Ok(env.no_active_matches());
    }

    let game = &select(&open, args.first())?.inner;
    let participants = env.services.matches.participants(&game.id).await?;

    let count = match game.max_participants {
        Some(max) => format!("{}/{}", participants.len(), max),
        None => participants.len().to_string(),
    };

    let mut text = format!(
        "📊 *Detail Pertandingan*\n\n📌 *{}*\n📍 Lokasi: {}\n💰 Harga: {}\n🕐 Waktu: {}\n👥 Peserta ({}):\n",
        game.name,
        game.venue,
        env.money(game.price_or_zero()),
        game.scheduled_at.format("%d/%m/%Y %H:%M UTC"),
        count
    );
    for (idx, participant) in participants.iter().enumerate() {
        text.push_str(&format!("{}. {}\n", idx + 1, participant.member_name));
    }
    if participants.is_empty() {
        text.push_str("Belum ada peserta\n");
    }

    Ok(text.trim_end().to_string())
}

async fn end_match(env: &HandlerEnv<'_>, ctx: &CommandContext, args: &[String]) -> Result<String, BotError> {
    let open = env.open_matches(&ctx.group.id).await?;
    if open.is_empty() {
        return Ok(env.no_active_matches());
    }

    let game = &select(&open, args.first())?.inner;
    let ledger = &env.services.ledger;
    let receipt = env
        .services
        .matches
        .end_match_with(&game.id, |open_game| async move {
            ledger
                .apply_settlement(&ctx.group.id, &open_game.id, Some(ctx.member.id.clone()))
                .await
        })
        .await?
        .ok_or(BotError::MatchClosed)?;

    let mut text = format!("🏁 *Pertandingan Selesai!*\n\n📌 {} - {}\n", game.name, game.venue);
    if receipt.transactions_created == 0 {
        text.push_str("\nTidak ada tagihan untuk pertandingan ini.");
    } else {
        text.push_str(&format!(
            "\n💸 Tagihan per orang: {}\n👥 Peserta: {} orang\n💰 Total masuk kas: {}",
            env.money(receipt.amount_per_person),
            receipt.transactions_created,
            env.money(receipt.total_collected)
        ));
    }
    Ok(text)
}

async fn kas(env: &HandlerEnv<'_>, ctx: &CommandContext) -> Result<String, BotError> {
    let balance = env.services.ledger.get_balance(&ctx.group.id).await?;
    Ok(format!(
        "💰 *Kas {}*\n\nSaldo saat ini: *{}*\n\nKetik {}historykas untuk melihat riwayat transaksi",
        balance.group_name,
        env.money(balance.balance),
        env.prefix()
    ))
}

async fn history(cmd: &Command, env: &HandlerEnv<'_>, ctx: &CommandContext, args: &[String]) -> Result<String, BotError> {
    let limit = match args.first() {
        Some(raw) => raw
            .parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| BotError::Validation(usage_error(cmd, env.prefix())))?,
        None => env.settings.history_limit,
    };

    let transactions = env.services.ledger.get_history(&ctx.group.id, Some(limit)).await?;
    if transactions.is_empty() {
        return Ok("📭 Belum ada transaksi kas.".to_string());
    }

    let mut text = format!("📜 *Riwayat Kas* ({} terakhir)\n\n", transactions.len());
    for tx in &transactions {
        let marker = match tx.kind {
            TransactionType::Income => "➕",
            TransactionType::Expense => "➖",
        };
        text.push_str(&format!(
            "{} {} - {}\n   🕐 {}\n",
            marker,
            env.money(tx.amount),
            tx.description.as_deref().unwrap_or(tx.kind.as_str()),
            tx.created_at.format("%d/%m/%Y %H:%M")
        ));
    }

    Ok(text.trim_end().to_string())
}

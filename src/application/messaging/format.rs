//! Reply formatting helpers shared by command handlers

use once_cell::sync::Lazy;
use regex_lite::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::domain::entities::Command;

/// `1.250.000` or `1.250.000,50`: dots group thousands, comma marks decimals
static GROUPED_AMOUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{1,3}(\.\d{3})+(,\d+)?$").expect("amount pattern is valid")
});

/// Render money the Indonesian way: `Rp 1.250.000` / `Rp 12.500,50`
pub fn format_money(amount: Decimal, symbol: &str) -> String {
    let sign = if amount.is_sign_negative() && !amount.is_zero() { "-" } else { "" };
    let plain = amount.abs().round_dp(2).normalize().to_string();
    let (int_part, frac_part) = match plain.split_once('.') {
        Some((i, f)) => (i.to_string(), Some(format!("{:0<2}", f))),
        None => (plain, None),
    };

    let mut grouped = String::new();
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    match frac_part {
        Some(frac) => format!("{}{} {},{}", sign, symbol, grouped, frac),
        None => format!("{}{} {}", sign, symbol, grouped),
    }
}

/// Parse a user-typed amount. Accepts an `Rp` prefix and Indonesian separators.
pub fn parse_amount(input: &str) -> Option<Decimal> {
    let trimmed = input.trim();
    let trimmed = trimmed
        .strip_prefix("Rp")
        .or_else(|| trimmed.strip_prefix("rp"))
        .or_else(|| trimmed.strip_prefix("RP"))
        .unwrap_or(trimmed)
        .trim();

    let normalized = if GROUPED_AMOUNT.is_match(trimmed) {
        trimmed.replace('.', "").replace(',', ".")
    } else if trimmed.contains(',') && !trimmed.contains('.') {
        trimmed.replace(',', ".")
    } else {
        trimmed.to_string()
    };

    Decimal::from_str(&normalized).ok()
}

/// Parse a 1-based list position typed by a user into a 0-based index
pub fn parse_index(input: &str, len: usize) -> Option<usize> {
    let n: usize = input.trim().parse().ok()?;
    (1..=len).contains(&n).then(|| n - 1)
}

/// Detailed help for one command. Usage and example lines are stored without
/// the command prefix, which is prepended here.
pub fn usage_help(command: &Command, prefix: &str) -> String {
    let mut help = format!("📌 *{}*\n", command.name.to_uppercase());
    if let Some(desc) = &command.description {
        help.push_str(desc);
        help.push('\n');
    }
    if !command.aliases.is_empty() {
        let aliases: Vec<String> = command.aliases.iter().map(|a| format!("{}{}", prefix, a)).collect();
        help.push_str(&format!("Alias: {}\n", aliases.join(", ")));
    }
    help.push_str(&format!(
        "\nCara pakai:\n{}{}\n",
        prefix,
        command.usage.as_deref().unwrap_or(&command.name)
    ));
    if let Some(example) = &command.example {
        help.push_str(&format!("\nContoh:\n{}{}\n", prefix, example));
    }
    help
}

/// Usage help prefixed with a "wrong format" line, for missing or bad arguments
pub fn usage_error(command: &Command, prefix: &str) -> String {
    format!("❌ Format salah!\n\n{}", usage_help(command, prefix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::CommandKind;
    use rust_decimal_macros::dec;

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(dec!(50000), "Rp"), "Rp 50.000");
        assert_eq!(format_money(dec!(1250000), "Rp"), "Rp 1.250.000");
        assert_eq!(format_money(dec!(999), "Rp"), "Rp 999");
        assert_eq!(format_money(dec!(12500.50), "Rp"), "Rp 12.500,50");
        assert_eq!(format_money(dec!(0.25), "Rp"), "Rp 0,25");
        assert_eq!(format_money(dec!(-5000), "Rp"), "-Rp 5.000");
        assert_eq!(format_money(dec!(0), "Rp"), "Rp 0");
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("50000"), Some(dec!(50000)));
        assert_eq!(parse_amount("50.000"), Some(dec!(50000)));
        assert_eq!(parse_amount("Rp1.250.000"), Some(dec!(1250000)));
        assert_eq!(parse_amount("Rp 12.500,50"), Some(dec!(12500.50)));
        assert_eq!(parse_amount("12,5"), Some(dec!(12.5)));
        assert_eq!(parse_amount("12.5"), Some(dec!(12.5)));
        assert_eq!(parse_amount("abc"), None);
    }

    #[test]
    fn test_parse_index() {
        assert_eq!(parse_index("1", 3), Some(0));
        assert_eq!(parse_index("3", 3), Some(2));
        assert_eq!(parse_index("0", 3), None);
        assert_eq!(parse_index("4", 3), None);
        assert_eq!(parse_index("x", 3), None);
    }

    #[test]
    fn test_usage_help_mentions_usage_and_aliases() {
        let cmd = Command::new("join", CommandKind::Join)
            .with_description("Bergabung ke pertandingan")
            .with_aliases(["j"])
            .with_usage("join <nomor>")
            .with_example("join 1");
        let help = usage_help(&cmd, "/");

        assert!(help.contains("JOIN"));
        assert!(help.contains("/join <nomor>"));
        assert!(help.contains("Alias: /j"));
        assert!(help.contains("/join 1"));
    }

    #[test]
    fn test_usage_help_follows_prefix() {
        let cmd = Command::new("kas", CommandKind::Kas).with_aliases(["k"]);
        let help = usage_help(&cmd, "!");

        assert!(help.contains("Alias: !k"));
        assert!(help.contains("Cara pakai:\n!kas"));
        assert!(!help.contains('/'));
    }
}

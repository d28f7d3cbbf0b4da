//! Message parser - Turns raw chat text into structured content

use once_cell::sync::Lazy;
use regex_lite::Regex;
use std::collections::HashMap;

use crate::domain::entities::Content;

/// A double-quoted span (straight or curly quotes, as phone keyboards send) or a bare word
static TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"["“”]([^"“”]*)["“”]|(\S+)"#).expect("token pattern is valid")
});

/// Parses incoming text into [`Content`]
#[derive(Debug, Clone)]
pub struct MessageParser {
    command_prefix: String,
}

impl MessageParser {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            command_prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.command_prefix
    }

    pub fn is_command(&self, text: &str) -> bool {
        !self.command_prefix.is_empty() && text.starts_with(&self.command_prefix)
    }

    /// Parse a text message
    pub fn parse(&self, text: &str) -> Content {
        if text.trim().is_empty() {
            return Content::Empty;
        }
        if self.is_command(text) {
            return self.parse_command(text);
        }
        Content::Text(text.to_string())
    }

    /// Parse a command message
    fn parse_command(&self, text: &str) -> Content {
        let cmd_text = &text[self.command_prefix.len()..];
        let mut tokens = tokenize(cmd_text).into_iter();

        let name = tokens.next().unwrap_or_default().to_lowercase();
        let args = tokens.collect();

        Content::Command { name, args }
    }
}

/// Split on whitespace, keeping quoted spans together without their quotes
pub fn tokenize(input: &str) -> Vec<String> {
    TOKEN
        .captures_iter(input)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Separate `--key value` / `--key=value` flags from positional arguments.
///
/// A flag without a following value maps to an empty string.
pub fn parse_flags(args: &[String]) -> (Vec<String>, HashMap<String, String>) {
    let mut positional = Vec::new();
    let mut flags = HashMap::new();
    let mut iter = args.iter().peekable();

    while let Some(arg) = iter.next() {
        let Some(flag) = arg.strip_prefix("--") else {
            positional.push(arg.clone());
            continue;
        };

        if let Some((key, value)) = flag.split_once('=') {
            flags.insert(key.to_lowercase(), value.to_string());
            continue;
        }

        let value = match iter.peek() {
            Some(next) if !next.starts_with("--") => iter.next().cloned().unwrap_or_default(),
            _ => String::new(),
        };
        flags.insert(flag.to_lowercase(), value);
    }

    (positional, flags)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_command_with_quoted_argument() {
        let parser = MessageParser::new("/");
        let content = parser.parse(r#"/NewMatch Futsal "Court A" 50000"#);

        assert_eq!(
            content,
            Content::Command {
                name: "newmatch".to_string(),
                args: args(&["Futsal", "Court A", "50000"]),
            }
        );
    }

    #[test]
    fn test_curly_quotes_group_too() {
        assert_eq!(tokenize("Futsal “Lapangan Satrio” 50000"), args(&["Futsal", "Lapangan Satrio", "50000"]));
    }

    #[test]
    fn test_plain_text_is_not_a_command() {
        let parser = MessageParser::new("/");
        assert_eq!(parser.parse("halo semua"), Content::Text("halo semua".to_string()));
        assert_eq!(parser.parse("   "), Content::Empty);
    }

    #[test]
    fn test_bare_prefix_gives_empty_name() {
        let parser = MessageParser::new("/");
        assert_eq!(parser.parse("/"), Content::Command { name: String::new(), args: vec![] });
    }

    #[test]
    fn test_custom_prefix() {
        let parser = MessageParser::new("!");
        assert!(parser.parse("!join 2").is_command());
        assert!(!parser.parse("/join 2").is_command());
    }

    #[test]
    fn test_parse_flags() {
        let (positional, flags) = parse_flags(&args(&["Futsal", "--max", "10", "Court", "50000", "--note=x", "--dry"]));

        assert_eq!(positional, args(&["Futsal", "Court", "50000"]));
        assert_eq!(flags.get("max").map(String::as_str), Some("10"));
        assert_eq!(flags.get("note").map(String::as_str), Some("x"));
        assert_eq!(flags.get("dry").map(String::as_str), Some(""));
    }
}

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

/// Recoverable input problems. Neither is surfaced as an HTTP error: an empty
/// message is ignored and a malformed email is re-prompted inside the chat.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    #[error("Input is empty")]
    EmptyInput,

    #[error("Invalid email format")]
    InvalidEmailFormat,
}

pub const DEFAULT_ECHO_MAX_CHARS: usize = 50;

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is a valid regex")
    })
}

/// Trims the input, rejecting anything that is blank.
pub fn normalize_input(text: &str) -> Result<&str, ChatError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ChatError::EmptyInput);
    }
    Ok(trimmed)
}

/// Validates `local@domain.tld` shape: no whitespace, exactly one `@`, and a
/// dot somewhere after it.
pub fn validate_email(text: &str) -> Result<String, ChatError> {
    let candidate = text.trim();
    if email_pattern().is_match(candidate) {
        Ok(candidate.to_string())
    } else {
        Err(ChatError::InvalidEmailFormat)
    }
}

/// Shortens a message for echoing back in a confirmation.
pub fn truncate_echo(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

//! Message hygiene and formatting helpers shared by the retrieval and
//! response paths.

use chrono::{DateTime, Utc};
use std::sync::LazyLock;

static UNSAFE_CHARS_RE: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r#"[<>"']"#).expect("unsafe-chars regex is valid"));
static EMAIL_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b")
        .expect("email regex is valid")
});
static PHONE_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"\b\d{3}[-.]?\d{3}[-.]?\d{4}\b").expect("phone regex is valid")
});

/// Maximum characters kept by [`sanitize_message`] when no limit is configured.
pub const DEFAULT_MAX_MESSAGE_CHARS: usize = 10_000;

/// Outbound responses longer than this are truncated by [`format_response`].
pub const MAX_RESPONSE_CHARS: usize = 4_000;

const AI_FOOTER: &str = "\n\n---\n*This response was generated by our AI assistant. If you need further assistance, please let us know!*";

/// Strip `<>"'`, cap the length at `max_chars` (marking the cut with `...`),
/// then trim surrounding whitespace.
pub fn sanitize_message(message: &str, max_chars: usize) -> String {
    if message.is_empty() {
        return String::new();
    }

    let stripped = UNSAFE_CHARS_RE.replace_all(message, "");

    let capped = if stripped.chars().count() > max_chars {
        let mut cut: String = stripped.chars().take(max_chars).collect();
        cut.push_str("...");
        cut
    } else {
        stripped.into_owned()
    };

    capped.trim().to_string()
}

/// Truncate to `max_chars`, preferring a word boundary in the last 20% of
/// the kept text.
pub fn truncate_message(message: &str, max_chars: usize) -> String {
    if message.chars().count() <= max_chars {
        return message.to_string();
    }

    let truncated: String = message.chars().take(max_chars).collect();
    if let Some(last_space) = truncated.rfind(' ') {
        let space_chars = truncated[..last_space].chars().count();
        if space_chars as f64 > max_chars as f64 * 0.8 {
            return format!("{}...", &truncated[..last_space]);
        }
    }

    format!("{}...", truncated)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactInfo {
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// First email address and phone number mentioned in a message.
pub fn extract_contact_info(message: &str) -> ContactInfo {
    ContactInfo {
        email: EMAIL_RE.find(message).map(|m| m.as_str().to_string()),
        phone: PHONE_RE.find(message).map(|m| m.as_str().to_string()),
    }
}

/// Prepare an AI-generated reply for delivery: cap its length and append the
/// assistant disclaimer once.
pub fn format_response(response: &str) -> String {
    let mut formatted = if response.chars().count() > MAX_RESPONSE_CHARS {
        truncate_message(response, MAX_RESPONSE_CHARS)
    } else {
        response.to_string()
    };

    if !formatted.is_empty() && !formatted.ends_with("(AI Assistant)") {
        formatted.push_str(AI_FOOTER);
    }

    formatted
}

/// Render a unix timestamp as `YYYY-MM-DD HH:MM:SS UTC`; falls back to the raw
/// number when it is out of range.
pub fn format_timestamp(timestamp: i64) -> String {
    match DateTime::<Utc>::from_timestamp(timestamp, 0) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => {
            tracing::warn!(timestamp, "Timestamp out of range");
            timestamp.to_string()
        }
    }
}

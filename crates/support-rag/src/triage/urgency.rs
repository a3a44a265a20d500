//! Keyword-driven urgency classification.

use crate::types::UrgencyLevel;

/// Ordered urgency rules. The first rule with a matching keyword decides the
/// level, so a message mentioning both "emergency" and "how" is critical.
pub const URGENCY_RULES: &[(UrgencyLevel, &[&str])] = &[
    (
        UrgencyLevel::Critical,
        &["emergency", "urgent", "broken", "down", "not working", "error"],
    ),
    (
        UrgencyLevel::High,
        &["help", "issue", "problem", "frustrated", "angry", "unhappy"],
    ),
    (
        UrgencyLevel::Medium,
        &["question", "how", "what", "when", "where", "why"],
    ),
];

pub fn classify_urgency(message: &str) -> UrgencyLevel {
    let message_lower = message.to_lowercase();
    URGENCY_RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| message_lower.contains(k)))
        .map(|(level, _)| *level)
        .unwrap_or(UrgencyLevel::Low)
}

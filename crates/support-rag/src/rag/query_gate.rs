//! Retrieval go/no-go gate and query enhancement.
//!
//! The gate is deliberately cheap: a keyword scan plus a trailing question
//! mark check. Enhancement appends topic hints so short customer messages land
//! near the right knowledge-base articles in embedding space.

/// Terms that suggest the customer needs specific information.
pub const RETRIEVAL_KEYWORDS: &[&str] = &[
    "how", "what", "when", "where", "why", "which", "password", "reset", "account", "billing",
    "payment", "refund", "cancel", "delete", "update", "change", "problem", "issue", "error",
    "help", "support", "policy", "terms", "privacy", "security",
];

/// Hint families, in the order their hints are appended.
pub const ENHANCEMENT_RULES: &[(&str, &[&str])] = &[
    ("account management", &["password", "login", "account"]),
    ("billing payment", &["billing", "payment", "refund", "money"]),
    ("technical support", &["error", "problem", "issue", "broken"]),
];

#[derive(Debug, Clone, Default)]
pub struct QueryGate;

impl QueryGate {
    pub fn new() -> Self {
        Self
    }

    /// True when the query contains an information-seeking keyword or is
    /// phrased as a question.
    pub fn should_retrieve(&self, query: &str) -> bool {
        let query_lower = query.to_lowercase();

        if let Some(keyword) = RETRIEVAL_KEYWORDS.iter().find(|k| query_lower.contains(*k)) {
            tracing::debug!(keyword, "Retrieval gate matched keyword");
            return true;
        }

        query.trim().ends_with('?')
    }

    /// Append one hint per matching family. The original query is kept verbatim.
    pub fn enhance(&self, query: &str) -> String {
        let query_lower = query.to_lowercase();

        let mut parts = vec![query];
        for (hint, words) in ENHANCEMENT_RULES {
            if words.iter().any(|w| query_lower.contains(w)) {
                parts.push(*hint);
            }
        }

        parts.join(" ")
    }
}

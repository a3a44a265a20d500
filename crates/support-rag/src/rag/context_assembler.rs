//! Turns ranked search results into the single context block injected ahead
//! of the customer's message.

use crate::config::ScoreConvention;
use crate::types::ScoredDocument;

pub const DEFAULT_SCORE_THRESHOLD: f32 = 0.8;

const PREAMBLE: &str = "Based on our knowledge base, here is relevant information:";
const CLOSING: &str = "\nPlease provide a helpful response based on the information above.";

#[derive(Debug, Clone, Copy)]
pub struct ContextAssembler {
    convention: ScoreConvention,
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self::new(ScoreConvention::Similarity)
    }
}

impl ContextAssembler {
    pub fn new(convention: ScoreConvention) -> Self {
        Self { convention }
    }

    /// Whether `scored` clears `score_threshold` under this convention.
    pub fn retains(&self, scored: &ScoredDocument, score_threshold: f32) -> bool {
        self.convention.passes(scored.score, score_threshold)
    }

    /// Build the context text. An empty input yields an empty string, which
    /// callers treat as "answer without retrieval augmentation".
    ///
    /// Documents that fail the threshold are skipped but keep their position
    /// number, so the numbering reflects the store's ranking.
    pub fn assemble(
        &self,
        documents: &[ScoredDocument],
        original_query: &str,
        score_threshold: f32,
    ) -> String {
        if documents.is_empty() {
            return String::new();
        }

        let mut parts = vec![PREAMBLE.to_string()];

        for (i, scored) in documents.iter().enumerate() {
            if !self.retains(scored, score_threshold) {
                tracing::debug!(
                    id = %scored.document.id,
                    score = scored.score,
                    threshold = score_threshold,
                    "Skipping low-relevance document"
                );
                continue;
            }

            let doc = &scored.document;
            parts.push(format!("\n{}. {}", i + 1, doc.content.trim()));

            if let Some(category) = doc.category() {
                parts.push(format!("   Category: {}", category));
            }
            if let Some(topic) = doc.topic() {
                parts.push(format!("   Topic: {}", topic));
            }
        }

        parts.push(format!("\nUser Question: {}", original_query));
        parts.push(CLOSING.to_string());

        parts.join("\n")
    }
}

//! Retrieval orchestrator: sanitize → enhance → search → assemble.
//!
//! `retrieve` never fails. Store errors are folded into a `RetrievalResult`
//! with an empty context and the error text, so the response pipeline can
//! always proceed without augmentation.

use std::collections::HashSet;
use std::sync::Arc;

use super::context_assembler::ContextAssembler;
use super::query_gate::QueryGate;
use crate::config::{RetrievalConfig, SupportConfig};
use crate::knowledge_base::KnowledgeBase;
use crate::text::sanitize_message;
use crate::types::{MetadataValue, RetrievalResult};

pub struct Retriever {
    knowledge_base: Arc<KnowledgeBase>,
    gate: QueryGate,
    assembler: ContextAssembler,
    config: RetrievalConfig,
}

impl Retriever {
    pub fn new(knowledge_base: Arc<KnowledgeBase>, config: &SupportConfig) -> Self {
        Self {
            knowledge_base,
            gate: QueryGate::new(),
            assembler: ContextAssembler::new(config.retrieval.score_convention),
            config: config.retrieval.clone(),
        }
    }

    pub fn default_k(&self) -> usize {
        self.config.default_k
    }

    pub fn should_use_rag(&self, query: &str) -> bool {
        self.gate.should_retrieve(query)
    }

    pub fn enhance_query(&self, query: &str) -> String {
        self.gate.enhance(query)
    }

    /// Configured threshold, or the one the knowledge store is calibrated for.
    pub fn score_threshold(&self) -> f32 {
        self.config
            .score_threshold
            .unwrap_or_else(|| self.knowledge_base.score_threshold())
    }

    /// Retrieve context for `query` with `k` results (`None` uses the
    /// configured default). The gate is not consulted here.
    pub async fn retrieve(&self, query: &str, k: Option<usize>) -> RetrievalResult {
        let k = k.unwrap_or(self.config.default_k);
        let sanitized = sanitize_message(query, self.config.max_query_chars);
        let enhanced = self.gate.enhance(&sanitized);

        let documents = match self.knowledge_base.try_search(&enhanced, k).await {
            Ok(documents) => documents,
            Err(e) => {
                tracing::error!(error = %e, "Error retrieving context");
                return RetrievalResult::failed(sanitized, e.to_string());
            }
        };

        let threshold = self.score_threshold();
        let included = documents
            .iter()
            .filter(|scored| self.assembler.retains(scored, threshold))
            .count();

        // Context is non-empty only when at least one document clears the threshold.
        let context = if included > 0 {
            self.assembler.assemble(&documents, &sanitized, threshold)
        } else {
            String::new()
        };

        let preview: String = sanitized.chars().take(50).collect();
        tracing::info!(
            query = %preview,
            retrieved = documents.len(),
            included,
            threshold,
            context_chars = context.len(),
            "Retrieved documents for query"
        );

        RetrievalResult {
            context,
            retrieved_count: documents.len(),
            documents,
            query: sanitized,
            error: None,
        }
    }

    /// Gate, retrieve and return the context block when there is one.
    pub async fn rag_context(&self, message: &str) -> Option<String> {
        if !self.should_use_rag(message) {
            tracing::debug!("Retrieval gate declined message");
            return None;
        }

        let result = self.retrieve(message, None).await;
        if result.has_context() {
            tracing::info!(
                retrieved = result.retrieved_count,
                "Using retrieved documents as context"
            );
            Some(result.context)
        } else {
            None
        }
    }

    /// Distinct `category` metadata values among the top results, in ranking order.
    pub async fn relevant_categories(&self, query: &str) -> Vec<String> {
        let documents = self
            .knowledge_base
            .search(query, self.config.category_probe_k)
            .await;

        let mut seen = HashSet::new();
        documents
            .iter()
            .filter_map(|scored| scored.document.category())
            .map(MetadataValue::to_string)
            .filter(|category| seen.insert(category.clone()))
            .collect()
    }

    /// Question lines (ending in `?`, longer than 10 chars) found in the
    /// content of the top `k` results, at most `k` of them.
    pub async fn similar_questions(&self, query: &str, k: usize) -> Vec<String> {
        let documents = self.knowledge_base.search(query, k).await;

        documents
            .iter()
            .flat_map(|scored| scored.document.content.lines())
            .map(str::trim)
            .filter(|line| line.ends_with('?') && line.chars().count() > 10)
            .take(k)
            .map(str::to_string)
            .collect()
    }
}

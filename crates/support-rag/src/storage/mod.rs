//! Knowledge store capability: embedding plus similarity search over the
//! support knowledge base.
//!
//! Implementations own their own consistency guarantees; callers never lock
//! around them.

pub mod vector_store;

use anyhow::Result;
use async_trait::async_trait;

use crate::rag::DEFAULT_SCORE_THRESHOLD;
use crate::types::{Document, ScoredDocument};

pub use vector_store::InMemoryVectorStore;

#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// Insert documents, replacing any live document with the same id.
    async fn add(&self, documents: Vec<Document>) -> Result<()>;

    /// Top `k` documents for `query`, in the store's own ranking order.
    async fn search(&self, query: &str, k: usize) -> Result<Vec<ScoredDocument>>;

    /// Remove a document. Returns whether a live document was removed.
    async fn delete(&self, id: &str) -> Result<bool>;

    async fn get(&self, id: &str) -> Result<Option<Document>>;

    /// All live documents, oldest first, at most `limit`.
    async fn list(&self, limit: usize) -> Result<Vec<Document>>;

    async fn count(&self) -> Result<usize>;

    async fn clear(&self) -> Result<()>;

    /// Identifier of the embedding model backing similarity search.
    fn embedding_model(&self) -> &str;

    /// Relevance cutoff calibrated to the scores this store reports.
    fn score_threshold(&self) -> f32 {
        DEFAULT_SCORE_THRESHOLD
    }
}

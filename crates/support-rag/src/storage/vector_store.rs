use anyhow::{Context, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::cmp::Ordering;
use std::collections::HashMap;

use super::KnowledgeStore;
use crate::embeddings::{cosine_similarity, EmbeddingModel};
use crate::rag::DEFAULT_SCORE_THRESHOLD;
use crate::types::{Document, ScoredDocument};

struct StoredDocument {
    document: Document,
    vector: Vec<f32>,
    /// Insertion sequence, used for stable listing and tie-breaking.
    seq: u64,
}

#[derive(Default)]
struct StoreState {
    documents: HashMap<String, StoredDocument>,
    next_seq: u64,
}

/// In-process vector store with exact cosine search.
///
/// Scores are cosine similarities clamped to `[0, 1]`, higher is better.
pub struct InMemoryVectorStore {
    embeddings: Box<dyn EmbeddingModel>,
    state: RwLock<StoreState>,
}

impl InMemoryVectorStore {
    pub fn new(embeddings: Box<dyn EmbeddingModel>) -> Self {
        Self {
            embeddings,
            state: RwLock::new(StoreState::default()),
        }
    }
}

#[async_trait]
impl KnowledgeStore for InMemoryVectorStore {
    async fn add(&self, documents: Vec<Document>) -> Result<()> {
        if documents.is_empty() {
            return Ok(());
        }

        let texts: Vec<&str> = documents.iter().map(|d| d.content.as_str()).collect();
        let vectors = self
            .embeddings
            .embed_documents(&texts)
            .context("Failed to embed documents")?;

        let len = documents.len();
        let mut state = self.state.write();
        for (document, vector) in documents.into_iter().zip(vectors) {
            let seq = state.next_seq;
            state.next_seq += 1;
            state.documents.insert(
                document.id.clone(),
                StoredDocument {
                    document,
                    vector,
                    seq,
                },
            );
        }

        tracing::debug!("Inserted {} documents into vector store", len);
        Ok(())
    }

    async fn search(&self, query: &str, k: usize) -> Result<Vec<ScoredDocument>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let query_vec = self
            .embeddings
            .embed_query(query)
            .context("Failed to embed query")?;

        let state = self.state.read();
        let mut hits: Vec<(f32, u64, &Document)> = state
            .documents
            .values()
            .map(|stored| {
                let score = cosine_similarity(&query_vec, &stored.vector).max(0.0);
                (score, stored.seq, &stored.document)
            })
            .collect();

        hits.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(Ordering::Equal)
                .then(a.1.cmp(&b.1))
        });
        hits.truncate(k);

        Ok(hits
            .into_iter()
            .map(|(score, _, document)| ScoredDocument {
                document: document.clone(),
                score,
            })
            .collect())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.state.write().documents.remove(id).is_some())
    }

    async fn get(&self, id: &str) -> Result<Option<Document>> {
        Ok(self
            .state
            .read()
            .documents
            .get(id)
            .map(|stored| stored.document.clone()))
    }

    async fn list(&self, limit: usize) -> Result<Vec<Document>> {
        let state = self.state.read();
        let mut stored: Vec<&StoredDocument> = state.documents.values().collect();
        stored.sort_by_key(|s| s.seq);
        Ok(stored
            .into_iter()
            .take(limit)
            .map(|s| s.document.clone())
            .collect())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.state.read().documents.len())
    }

    async fn clear(&self) -> Result<()> {
        let mut state = self.state.write();
        state.documents.clear();
        Ok(())
    }

    fn embedding_model(&self) -> &str {
        self.embeddings.name()
    }

    fn score_threshold(&self) -> f32 {
        self.embeddings
            .relevance_threshold()
            .unwrap_or(DEFAULT_SCORE_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::{HashingConfig, HashingEmbeddings};
    use chrono::Utc;

    fn store() -> InMemoryVectorStore {
        InMemoryVectorStore::new(Box::new(HashingEmbeddings::new(HashingConfig::default())))
    }

    fn doc(id: &str, content: &str) -> Document {
        Document {
            id: id.to_string(),
            content: content.to_string(),
            metadata: Default::default(),
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_search_ranks_by_similarity() {
        let store = store();
        store
            .add(vec![
                doc("billing", "We accept Visa, MasterCard and PayPal for billing"),
                doc("password", "Reset your password with the forgot password link"),
            ])
            .await
            .unwrap();

        let hits = store.search("forgot password", 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].document.id, "password");
        assert!(hits[0].score >= hits[1].score);
        assert!(hits.iter().all(|h| (0.0..=1.0).contains(&h.score)));
    }

    #[tokio::test]
    async fn test_search_respects_k() {
        let store = store();
        store
            .add((0..5).map(|i| doc(&format!("d{}", i), "refund policy")).collect())
            .await
            .unwrap();
        assert_eq!(store.search("refund", 3).await.unwrap().len(), 3);
        assert!(store.search("refund", 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_same_id_replaces() {
        let store = store();
        store.add(vec![doc("x", "old content")]).await.unwrap();
        store.add(vec![doc("x", "new content")]).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 1);
        assert_eq!(store.get("x").await.unwrap().unwrap().content, "new content");
    }

    #[test]
    fn test_score_threshold_follows_embedder() {
        assert_eq!(store().score_threshold(), crate::embeddings::HASHING_RELEVANCE_THRESHOLD);
    }

    #[tokio::test]
    async fn test_delete_and_list() {
        let store = store();
        store
            .add(vec![doc("a", "first"), doc("b", "second"), doc("c", "third")])
            .await
            .unwrap();
        assert!(store.delete("b").await.unwrap());
        assert!(!store.delete("b").await.unwrap());

        let ids: Vec<String> = store
            .list(10)
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids, vec!["a", "c"]);

        store.clear().await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
    }
}

//! Knowledge store facade.
//!
//! Normalizes documents on the way in (ids, timestamps) and wraps every store
//! call. The plain methods fail closed: on a store error they log and return
//! `false` or an empty result. The `try_*` methods return the error instead,
//! for callers that must tell "nothing found" apart from "search failed".

use chrono::Utc;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::clock::Clock;
use crate::config::SupportConfig;
use crate::embeddings::{HashingConfig, HashingEmbeddings};
use crate::error::{RagError, Result};
use crate::storage::{InMemoryVectorStore, KnowledgeStore};
use crate::types::{Document, Metadata, NewDocument, ScoredDocument, StoreStats};

pub struct KnowledgeBase {
    store: Arc<dyn KnowledgeStore>,
    clock: Arc<dyn Clock>,
    collection_name: String,
    data_dir: PathBuf,
}

#[derive(Serialize)]
struct KnowledgeBaseExport {
    export_date: chrono::DateTime<Utc>,
    total_documents: usize,
    documents: Vec<Document>,
}

/// Upper bound on documents written by [`KnowledgeBase::export_to_file`].
const EXPORT_LIMIT: usize = 1000;

impl KnowledgeBase {
    pub fn new(
        store: Arc<dyn KnowledgeStore>,
        clock: Arc<dyn Clock>,
        config: &SupportConfig,
    ) -> Self {
        Self {
            store,
            clock,
            collection_name: config.store.collection_name.clone(),
            data_dir: config.data_dir.clone(),
        }
    }

    /// Knowledge base over the in-process vector store, sized from
    /// `config.store`. Seeds the starter articles when
    /// `store.seed_sample_documents` is set and the store is empty.
    pub async fn open_local(clock: Arc<dyn Clock>, config: &SupportConfig) -> Result<Self> {
        let embeddings = HashingEmbeddings::new(HashingConfig::from(&config.store));
        let store = InMemoryVectorStore::new(Box::new(embeddings));
        let knowledge_base = Self::new(Arc::new(store), clock, config);

        if config.store.seed_sample_documents {
            knowledge_base.seed_sample_documents().await?;
        }

        tracing::info!(
            collection = %knowledge_base.collection_name,
            embedding_model = knowledge_base.store.embedding_model(),
            "Opened local knowledge base"
        );
        Ok(knowledge_base)
    }

    /// Relevance cutoff the backing store is calibrated for.
    pub fn score_threshold(&self) -> f32 {
        self.store.score_threshold()
    }

    fn generate_id(&self) -> String {
        format!("doc_{}", self.clock.now().format("%Y%m%d_%H%M%S"))
    }

    fn materialize(&self, new_doc: NewDocument) -> Document {
        let id = match new_doc.id {
            Some(id) if !id.is_empty() => id,
            _ => self.generate_id(),
        };
        Document {
            id,
            content: new_doc.content,
            metadata: new_doc.metadata,
            created_at: self.clock.now(),
            updated_at: None,
        }
    }

    // ── Fallible API ───────────────────────────────────────────────────────

    pub async fn try_add(&self, documents: Vec<NewDocument>) -> Result<Vec<String>> {
        let docs: Vec<Document> = documents.into_iter().map(|d| self.materialize(d)).collect();
        let ids: Vec<String> = docs.iter().map(|d| d.id.clone()).collect();

        self.store.add(docs).await?;

        tracing::info!(count = ids.len(), ids = ?ids, "Added documents to knowledge base");
        Ok(ids)
    }

    pub async fn try_search(&self, query: &str, k: usize) -> Result<Vec<ScoredDocument>> {
        if k == 0 {
            return Err(RagError::validation("search k must be > 0"));
        }

        let results = self.store.search(query, k).await?;
        let preview: String = query.chars().take(50).collect();
        tracing::info!(
            query = %preview,
            k = k,
            found = results.len(),
            "Knowledge base search"
        );
        Ok(results)
    }

    /// Replace content and metadata of `id`. Implemented as delete-then-add,
    /// so a failure between the two steps leaves the document deleted.
    pub async fn try_update(&self, id: &str, content: &str, metadata: Metadata) -> Result<()> {
        let created_at = match self.store.get(id).await? {
            Some(existing) => existing.created_at,
            None => self.clock.now(),
        };

        let now = self.clock.now();

        self.store.delete(id).await?;
        self.store
            .add(vec![Document {
                id: id.to_string(),
                content: content.to_string(),
                metadata,
                created_at,
                updated_at: Some(now),
            }])
            .await?;

        tracing::info!(id = %id, "Updated document");
        Ok(())
    }

    pub async fn try_delete(&self, id: &str) -> Result<bool> {
        let removed = self.store.delete(id).await?;
        tracing::info!(id = %id, removed, "Deleted document");
        Ok(removed)
    }

    pub async fn try_stats(&self) -> Result<StoreStats> {
        Ok(StoreStats {
            total_documents: self.store.count().await?,
            collection_name: self.collection_name.clone(),
            embedding_model: self.store.embedding_model().to_string(),
            last_updated: self.clock.now(),
        })
    }

    // ── Fail-closed API ────────────────────────────────────────────────────

    pub async fn add(&self, documents: Vec<NewDocument>) -> bool {
        match self.try_add(documents).await {
            Ok(_) => true,
            Err(e) => {
                tracing::error!(error = %e, "Error adding documents to knowledge base");
                false
            }
        }
    }

    pub async fn search(&self, query: &str, k: usize) -> Vec<ScoredDocument> {
        match self.try_search(query, k).await {
            Ok(results) => results,
            Err(e) => {
                tracing::error!(error = %e, "Error searching knowledge base");
                Vec::new()
            }
        }
    }

    pub async fn update(&self, id: &str, content: &str, metadata: Metadata) -> bool {
        match self.try_update(id, content, metadata).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(id = %id, error = %e, "Error updating document");
                false
            }
        }
    }

    /// True when the store call succeeded, whether or not the id existed.
    pub async fn delete(&self, id: &str) -> bool {
        match self.try_delete(id).await {
            Ok(_) => true,
            Err(e) => {
                tracing::error!(id = %id, error = %e, "Error deleting document");
                false
            }
        }
    }

    /// `None` when the store is unavailable.
    pub async fn stats(&self) -> Option<StoreStats> {
        match self.try_stats().await {
            Ok(stats) => Some(stats),
            Err(e) => {
                tracing::error!(error = %e, "Error getting knowledge base stats");
                None
            }
        }
    }

    pub async fn get_document(&self, id: &str) -> Option<Document> {
        match self.store.get(id).await {
            Ok(doc) => doc,
            Err(e) => {
                tracing::error!(id = %id, error = %e, "Error getting document");
                None
            }
        }
    }

    // ── Maintenance ────────────────────────────────────────────────────────

    /// Populate an empty store with the starter support articles. Returns the
    /// number of documents added (0 when the store already had content).
    pub async fn seed_sample_documents(&self) -> Result<usize> {
        if self.store.count().await? > 0 {
            return Ok(0);
        }

        tracing::info!("Initializing knowledge base with sample data");
        let samples = sample_documents();
        let count = samples.len();
        self.try_add(samples).await?;
        Ok(count)
    }

    /// Write every live document to `path` as pretty-printed JSON.
    pub async fn export_to_file(&self, path: &Path) -> Result<usize> {
        let documents = self.store.list(EXPORT_LIMIT).await?;
        let export = KnowledgeBaseExport {
            export_date: self.clock.now(),
            total_documents: documents.len(),
            documents,
        };

        let json = serde_json::to_string_pretty(&export)?;
        std::fs::write(path, json).map_err(|e| RagError::io(path, e))?;

        tracing::info!(
            path = %path.display(),
            count = export.total_documents,
            "Exported knowledge base"
        );
        Ok(export.total_documents)
    }

    /// Export into `data_dir` under a timestamped file name.
    pub async fn export_to_data_dir(&self) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.data_dir).map_err(|e| RagError::io(&self.data_dir, e))?;

        let file_name = format!(
            "knowledge_base_export_{}.json",
            self.clock.now().format("%Y%m%d_%H%M%S")
        );
        let path = self.data_dir.join(file_name);
        self.export_to_file(&path).await?;
        Ok(path)
    }
}

fn sample(id: &str, category: &str, topic: &str, priority: &str, content: &str) -> NewDocument {
    NewDocument::new(content)
        .with_id(id)
        .with_metadata("category", category)
        .with_metadata("topic", topic)
        .with_metadata("priority", priority)
}

/// Starter articles covering the most common support topics.
pub fn sample_documents() -> Vec<NewDocument> {
    vec![
        sample(
            "password_reset",
            "account",
            "password_reset",
            "high",
            "How to Reset Your Password:\n\n\
             1. Go to the login page\n\
             2. Click \"Forgot Password\" link\n\
             3. Enter your email address\n\
             4. Check your email for reset instructions\n\
             5. Click the reset link in the email\n\
             6. Enter your new password\n\
             7. Confirm your new password\n\n\
             If you don't receive the email, check your spam folder.",
        ),
        sample(
            "account_creation",
            "account",
            "account_creation",
            "high",
            "Creating a New Account:\n\n\
             1. Visit our website homepage\n\
             2. Click \"Sign Up\" or \"Create Account\"\n\
             3. Fill in your personal information:\n\
             \x20  - Full name\n\
             \x20  - Email address\n\
             \x20  - Password (minimum 8 characters)\n\
             4. Accept terms and conditions\n\
             5. Click \"Create Account\"\n\
             6. Verify your email address\n\n\
             You'll receive a confirmation email to activate your account.",
        ),
        sample(
            "billing_help",
            "billing",
            "payment_methods",
            "medium",
            "Billing and Payment Information:\n\n\
             Payment Methods Accepted:\n\
             - Credit cards (Visa, MasterCard, American Express)\n\
             - PayPal\n\
             - Bank transfers (for annual plans)\n\n\
             Billing Cycle:\n\
             - Monthly plans: Charged on the same date each month\n\
             - Annual plans: Charged once per year with 2 months free\n\n\
             To update payment information:\n\
             1. Log into your account\n\
             2. Go to Settings > Billing\n\
             3. Click \"Update Payment Method\"\n\
             4. Enter new payment details\n\n\
             For billing questions, contact our support team.",
        ),
        sample(
            "refund_policy",
            "billing",
            "refunds",
            "medium",
            "Refund Policy:\n\n\
             We offer a 30-day money-back guarantee for all new subscriptions.\n\n\
             Refund Eligibility:\n\
             - Must be within 30 days of initial purchase\n\
             - Account must be in good standing\n\
             - No refunds for partial months\n\n\
             To request a refund:\n\
             1. Contact customer support\n\
             2. Provide your account details\n\
             3. Explain the reason for refund\n\
             4. Allow 3-5 business days for processing\n\n\
             Refunds are processed to the original payment method.",
        ),
        sample(
            "technical_support",
            "technical",
            "troubleshooting",
            "high",
            "Technical Support:\n\n\
             Common Issues and Solutions:\n\n\
             1. Can't log in:\n\
             \x20  - Clear browser cache and cookies\n\
             \x20  - Try incognito/private browsing mode\n\
             \x20  - Reset your password\n\n\
             2. Slow performance:\n\
             \x20  - Check your internet connection\n\
             \x20  - Close unnecessary browser tabs\n\
             \x20  - Try a different browser\n\n\
             3. Features not working:\n\
             \x20  - Update your browser to the latest version\n\
             \x20  - Disable browser extensions temporarily\n\
             \x20  - Contact support with specific error messages\n\n\
             For urgent technical issues, contact our 24/7 support team.",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::embeddings::{HashingConfig, HashingEmbeddings};
    use crate::types::MetadataValue;
    use async_trait::async_trait;

    struct FailingStore;

    #[async_trait]
    impl KnowledgeStore for FailingStore {
        async fn add(&self, _documents: Vec<Document>) -> anyhow::Result<()> {
            Err(anyhow::anyhow!("store offline"))
        }
        async fn search(&self, _query: &str, _k: usize) -> anyhow::Result<Vec<ScoredDocument>> {
            Err(anyhow::anyhow!("store offline"))
        }
        async fn delete(&self, _id: &str) -> anyhow::Result<bool> {
            Err(anyhow::anyhow!("store offline"))
        }
        async fn get(&self, _id: &str) -> anyhow::Result<Option<Document>> {
            Err(anyhow::anyhow!("store offline"))
        }
        async fn list(&self, _limit: usize) -> anyhow::Result<Vec<Document>> {
            Err(anyhow::anyhow!("store offline"))
        }
        async fn count(&self) -> anyhow::Result<usize> {
            Err(anyhow::anyhow!("store offline"))
        }
        async fn clear(&self) -> anyhow::Result<()> {
            Err(anyhow::anyhow!("store offline"))
        }
        fn embedding_model(&self) -> &str {
            "none"
        }
    }

    fn knowledge_base() -> KnowledgeBase {
        let store = InMemoryVectorStore::new(Box::new(HashingEmbeddings::new(
            HashingConfig::default(),
        )));
        KnowledgeBase::new(
            Arc::new(store),
            Arc::new(FixedClock::at_hour(10)),
            &SupportConfig::default(),
        )
    }

    fn failing_knowledge_base() -> KnowledgeBase {
        KnowledgeBase::new(
            Arc::new(FailingStore),
            Arc::new(FixedClock::at_hour(10)),
            &SupportConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_add_then_search_round_trip() {
        let kb = knowledge_base();
        assert!(
            kb.add(vec![NewDocument::new("How to cancel your subscription plan")
                .with_id("x")
                .with_metadata("category", "billing")])
                .await
        );
        assert!(kb.add(vec![NewDocument::new("Our office dog is named Biscuit")]).await);

        let results = kb.search("cancel subscription", 3).await;
        assert!(!results.is_empty());
        assert_eq!(results[0].document.id, "x");
        assert_eq!(
            results[0].document.category(),
            Some(&MetadataValue::Text("billing".into()))
        );
    }

    #[tokio::test]
    async fn test_generated_id_uses_clock() {
        let kb = knowledge_base();
        let ids = kb.try_add(vec![NewDocument::new("no id here")]).await.unwrap();
        assert_eq!(ids, vec!["doc_20240115_103000".to_string()]);
    }

    #[tokio::test]
    async fn test_update_replaces_and_stamps() {
        let kb = knowledge_base();
        kb.add(vec![NewDocument::new("old text").with_id("faq")]).await;
        let created = kb.get_document("faq").await.unwrap().created_at;

        let mut meta = Metadata::new();
        meta.insert("topic".into(), "shipping".into());
        assert!(kb.update("faq", "new text", meta).await);

        let doc = kb.get_document("faq").await.unwrap();
        assert_eq!(doc.content, "new text");
        assert_eq!(doc.created_at, created);
        assert_eq!(doc.updated_at, Some(FixedClock::at_hour(10).0));
        assert!(!doc.metadata.contains_key("updated_at"));
        assert_eq!(doc.topic(), Some(&MetadataValue::Text("shipping".into())));
        assert_eq!(kb.stats().await.unwrap().total_documents, 1);
    }

    #[tokio::test]
    async fn test_delete() {
        let kb = knowledge_base();
        kb.add(vec![NewDocument::new("temp").with_id("t")]).await;
        assert!(kb.delete("t").await);
        assert!(kb.get_document("t").await.is_none());
        assert!(!kb.try_delete("t").await.unwrap());
    }

    #[tokio::test]
    async fn test_stats() {
        let kb = knowledge_base();
        let stats = kb.stats().await.unwrap();
        assert_eq!(stats.total_documents, 0);
        assert_eq!(stats.collection_name, "knowledge_base");
        assert_eq!(stats.embedding_model, "hashing-bow-384");
    }

    #[tokio::test]
    async fn test_fail_closed() {
        let kb = failing_knowledge_base();
        assert!(!kb.add(vec![NewDocument::new("x")]).await);
        assert!(kb.search("anything", 3).await.is_empty());
        assert!(!kb.update("x", "y", Metadata::new()).await);
        assert!(!kb.delete("x").await);
        assert!(kb.stats().await.is_none());
        assert!(kb.get_document("x").await.is_none());
    }

    #[tokio::test]
    async fn test_try_search_distinguishes_failure_from_empty() {
        let empty = knowledge_base();
        assert!(empty.try_search("refund", 3).await.unwrap().is_empty());

        let failing = failing_knowledge_base();
        let err = failing.try_search("refund", 3).await.unwrap_err();
        assert!(matches!(err, RagError::Upstream(_)));
        assert!(err.to_string().contains("store offline"));
    }

    #[tokio::test]
    async fn test_zero_k_is_validation_error() {
        let kb = knowledge_base();
        assert!(matches!(
            kb.try_search("q", 0).await,
            Err(RagError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn test_seed_only_when_empty() {
        let kb = knowledge_base();
        assert_eq!(kb.seed_sample_documents().await.unwrap(), 5);
        assert_eq!(kb.seed_sample_documents().await.unwrap(), 0);
        assert!(kb.get_document("refund_policy").await.is_some());
    }

    fn temp_config(name: &str) -> SupportConfig {
        let mut config = SupportConfig::default();
        config.data_dir =
            std::env::temp_dir().join(format!("support-rag-{}-{}", name, std::process::id()));
        config
    }

    #[tokio::test]
    async fn test_open_local_honours_store_config() {
        let mut config = temp_config("open");
        config.store.embedding_dimension = 64;
        let kb = KnowledgeBase::open_local(Arc::new(FixedClock::at_hour(10)), &config)
            .await
            .unwrap();
        let stats = kb.stats().await.unwrap();
        assert_eq!(stats.total_documents, 5);
        assert_eq!(stats.embedding_model, "hashing-bow-64");
        assert_eq!(kb.score_threshold(), crate::embeddings::HASHING_RELEVANCE_THRESHOLD);

        config.store.seed_sample_documents = false;
        let empty = KnowledgeBase::open_local(Arc::new(FixedClock::at_hour(10)), &config)
            .await
            .unwrap();
        assert_eq!(empty.stats().await.unwrap().total_documents, 0);
    }

    #[tokio::test]
    async fn test_export_to_data_dir() {
        let config = temp_config("export");
        let kb = KnowledgeBase::open_local(Arc::new(FixedClock::at_hour(10)), &config)
            .await
            .unwrap();

        let path = kb.export_to_data_dir().await.unwrap();
        assert_eq!(
            path,
            config.data_dir.join("knowledge_base_export_20240115_103000.json")
        );
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["total_documents"], 5);
        std::fs::remove_dir_all(&config.data_dir).ok();
    }

    #[tokio::test]
    async fn test_export_to_file() {
        let kb = knowledge_base();
        kb.seed_sample_documents().await.unwrap();

        let path = std::env::temp_dir().join(format!(
            "support-rag-export-{}.json",
            std::process::id()
        ));
        let written = kb.export_to_file(&path).await.unwrap();
        assert_eq!(written, 5);

        let raw = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["total_documents"], 5);
        assert_eq!(value["documents"][0]["id"], "password_reset");
        std::fs::remove_file(&path).ok();
    }
}

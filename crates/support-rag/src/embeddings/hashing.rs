//! Feature-hashing bag-of-words embeddings.
//!
//! A dependency-free stand-in for a neural embedding model: tokens are hashed
//! into a fixed number of buckets and the resulting term-frequency vector is
//! L2-normalized. Good enough for keyword-overlap retrieval in development and
//! tests; production deployments plug a real model in behind `EmbeddingModel`.

use anyhow::Result;
use parking_lot::RwLock;
use std::num::NonZeroUsize;
use std::sync::Arc;

use super::EmbeddingModel;
use crate::config::StoreConfig;

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "at", "be", "by", "can", "do", "for", "from", "i", "if", "in", "is",
    "it", "me", "my", "of", "on", "or", "our", "so", "the", "this", "to", "we", "with", "you",
    "your",
];

/// Cosine similarity at which a bag-of-words match is treated as relevant.
/// Keyword-overlap scores sit well below those of neural models; a direct
/// topical match lands around 0.3 to 0.65.
pub const HASHING_RELEVANCE_THRESHOLD: f32 = 0.25;

#[derive(Clone, Debug)]
pub struct HashingConfig {
    pub dimension: usize,
    pub cache_size: usize,
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            dimension: 384,
            cache_size: 1000,
        }
    }
}

impl From<&StoreConfig> for HashingConfig {
    fn from(config: &StoreConfig) -> Self {
        Self {
            dimension: config.embedding_dimension,
            cache_size: config.embedding_cache_size,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum EmbedMode {
    Query,
    Document,
}

pub struct HashingEmbeddings {
    config: HashingConfig,
    name: String,
    cache: Arc<RwLock<lru::LruCache<(EmbedMode, String), Vec<f32>>>>,
}

impl HashingEmbeddings {
    pub fn new(config: HashingConfig) -> Self {
        let dimension = config.dimension.max(1);
        let cache_size = NonZeroUsize::new(config.cache_size).unwrap_or(NonZeroUsize::MIN);
        Self {
            name: format!("hashing-bow-{}", dimension),
            config: HashingConfig {
                dimension,
                ..config
            },
            cache: Arc::new(RwLock::new(lru::LruCache::new(cache_size))),
        }
    }

    fn embed_with_mode(&self, text: &str, mode: EmbedMode) -> Vec<f32> {
        let cache_key = (mode, text.to_string());
        if let Some(cached) = self.cache.write().get(&cache_key) {
            return cached.clone();
        }

        let mut vec = vec![0.0f32; self.config.dimension];
        for token in tokenize(text) {
            let bucket = (fnv1a(token.as_bytes()) % self.config.dimension as u64) as usize;
            vec[bucket] += 1.0;
        }
        let embedding = normalize_vec(vec);

        self.cache.write().put(cache_key, embedding.clone());
        embedding
    }
}

impl EmbeddingModel for HashingEmbeddings {
    fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_with_mode(text, EmbedMode::Query))
    }

    fn embed_document(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_with_mode(text, EmbedMode::Document))
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn relevance_threshold(&self) -> Option<f32> {
        Some(HASHING_RELEVANCE_THRESHOLD)
    }
}

/// Lowercased alphanumeric tokens with stopwords removed.
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .filter(|t| !STOPWORDS.contains(&t.as_str()))
}

/// Stable across processes, unlike `DefaultHasher`.
fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for b in bytes {
        hash ^= *b as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

fn normalize_vec(mut vec: Vec<f32>) -> Vec<f32> {
    let norm: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 1e-12 {
        for v in &mut vec {
            *v /= norm;
        }
    }
    vec
}

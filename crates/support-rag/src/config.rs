use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{RagError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SupportConfig {
    pub data_dir: PathBuf,
    pub retrieval: RetrievalConfig,
    pub escalation: EscalationConfig,
    pub store: StoreConfig,
    pub llm: LlmConfig,
    pub features: FeatureFlags,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreConvention {
    /// Higher is more relevant; keep `score >= threshold`.
    Similarity,
    /// Lower is more relevant; keep `score <= threshold`.
    Distance,
}

impl ScoreConvention {
    pub fn passes(&self, score: f32, threshold: f32) -> bool {
        match self {
            Self::Similarity => score >= threshold,
            Self::Distance => score <= threshold,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    pub default_k: usize,
    /// Relevance cutoff for assembled context. `None` uses the threshold the
    /// knowledge store reports as calibrated for its scores.
    pub score_threshold: Option<f32>,
    pub score_convention: ScoreConvention,
    pub max_query_chars: usize,
    /// How many results to inspect when collecting relevant categories.
    pub category_probe_k: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationConfig {
    /// Inclusive UTC hour.
    pub business_hours_start: u32,
    /// Exclusive UTC hour.
    pub business_hours_end: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub collection_name: String,
    pub embedding_dimension: usize,
    pub embedding_cache_size: usize,
    pub seed_sample_documents: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub endpoint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureFlags {
    pub ai_enabled: bool,
    pub auto_escalation_enabled: bool,
}

impl SupportConfig {
    /// Validate config values, returning errors for clearly broken configurations.
    pub fn validate(&self) -> Result<()> {
        if self.retrieval.default_k == 0 {
            return Err(RagError::configuration("retrieval.default_k must be > 0"));
        }
        if self.retrieval.category_probe_k == 0 {
            return Err(RagError::configuration(
                "retrieval.category_probe_k must be > 0",
            ));
        }
        if self
            .retrieval
            .score_threshold
            .is_some_and(|threshold| !threshold.is_finite())
        {
            return Err(RagError::configuration(
                "retrieval.score_threshold must be finite",
            ));
        }
        if self.retrieval.max_query_chars == 0 {
            return Err(RagError::configuration(
                "retrieval.max_query_chars must be > 0",
            ));
        }
        if self.escalation.business_hours_end > 24 {
            return Err(RagError::configuration(
                "escalation.business_hours_end must be <= 24",
            ));
        }
        if self.escalation.business_hours_start >= self.escalation.business_hours_end {
            return Err(RagError::configuration(
                "escalation.business_hours_start must be < business_hours_end",
            ));
        }
        if self.store.embedding_dimension == 0 {
            return Err(RagError::configuration(
                "store.embedding_dimension must be > 0",
            ));
        }
        Ok(())
    }

    /// Load config from a JSON file, falling back to defaults for missing sections.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| RagError::io(path, e))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| RagError::configuration(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Build config from the process environment on top of the defaults.
    ///
    /// `OPENAI_API_KEY` is required when AI responses are enabled; its absence
    /// is a start-up error, not something to recover from per request.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(dir) = lookup("SUPPORT_RAG_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(key) = lookup("OPENAI_API_KEY") {
            config.llm.api_key = key;
        }
        if let Some(model) = lookup("OPENAI_MODEL") {
            config.llm.model = model;
        }
        if let Some(raw) = lookup("OPENAI_MAX_TOKENS") {
            config.llm.max_tokens = raw.parse().map_err(|_| {
                RagError::configuration(format!("OPENAI_MAX_TOKENS is not an integer: {}", raw))
            })?;
        }
        if let Some(raw) = lookup("OPENAI_TEMPERATURE") {
            config.llm.temperature = raw.parse().map_err(|_| {
                RagError::configuration(format!("OPENAI_TEMPERATURE is not a number: {}", raw))
            })?;
        }
        if let Some(raw) = lookup("AI_ENABLED") {
            config.features.ai_enabled = raw.eq_ignore_ascii_case("true");
        }
        if let Some(raw) = lookup("AUTO_ESCALATION_ENABLED") {
            config.features.auto_escalation_enabled = raw.eq_ignore_ascii_case("true");
        }

        if config.features.ai_enabled && config.llm.api_key.is_empty() {
            return Err(RagError::configuration(
                "Missing required environment variables: OPENAI_API_KEY",
            ));
        }

        config.validate()?;
        Ok(config)
    }
}

impl Default for SupportConfig {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("support-rag");

        Self {
            data_dir,
            retrieval: RetrievalConfig {
                default_k: 3,
                score_threshold: None,
                score_convention: ScoreConvention::Similarity,
                max_query_chars: 10_000,
                category_probe_k: 5,
            },
            escalation: EscalationConfig {
                business_hours_start: 9,
                business_hours_end: 18,
            },
            store: StoreConfig {
                collection_name: "knowledge_base".to_string(),
                embedding_dimension: 384,
                embedding_cache_size: 1000,
                seed_sample_documents: true,
            },
            llm: LlmConfig {
                api_key: String::new(),
                model: "gpt-4o-mini".to_string(),
                max_tokens: 1000,
                temperature: 0.7,
                endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            },
            features: FeatureFlags {
                ai_enabled: true,
                auto_escalation_enabled: true,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_is_valid() {
        let config = SupportConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.retrieval.default_k, 3);
        assert_eq!(config.retrieval.score_threshold, None);
        assert_eq!(config.escalation.business_hours_start, 9);
        assert_eq!(config.escalation.business_hours_end, 18);
    }

    #[test]
    fn test_inverted_business_hours_rejected() {
        let mut config = SupportConfig::default();
        config.escalation.business_hours_start = 18;
        config.escalation.business_hours_end = 9;
        assert!(matches!(
            config.validate(),
            Err(RagError::Configuration { .. })
        ));
    }

    #[test]
    fn test_missing_api_key_is_configuration_error() {
        let err = SupportConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_api_key_not_required_when_ai_disabled() {
        let config = SupportConfig::from_lookup(lookup_from(&[("AI_ENABLED", "false")])).unwrap();
        assert!(!config.features.ai_enabled);
    }

    #[test]
    fn test_env_overrides() {
        let config = SupportConfig::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_MODEL", "gpt-4o"),
            ("OPENAI_MAX_TOKENS", "256"),
            ("AUTO_ESCALATION_ENABLED", "False"),
        ]))
        .unwrap();
        assert_eq!(config.llm.api_key, "sk-test");
        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.llm.max_tokens, 256);
        assert!(!config.features.auto_escalation_enabled);
    }

    #[test]
    fn test_bad_number_in_env() {
        let err = SupportConfig::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_TEMPERATURE", "warm"),
        ]))
        .unwrap_err();
        assert!(matches!(err, RagError::Configuration { .. }));
    }

    #[test]
    fn test_non_finite_threshold_rejected() {
        let mut config = SupportConfig::default();
        config.retrieval.score_threshold = Some(f32::NAN);
        assert!(matches!(
            config.validate(),
            Err(RagError::Configuration { .. })
        ));
        config.retrieval.score_threshold = Some(0.5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_score_convention() {
        assert!(ScoreConvention::Similarity.passes(0.85, 0.8));
        assert!(!ScoreConvention::Similarity.passes(0.5, 0.8));
        assert!(ScoreConvention::Distance.passes(0.3, 0.8));
        assert!(!ScoreConvention::Distance.passes(0.9, 0.8));
    }
}

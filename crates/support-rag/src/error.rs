//! Error types for the support RAG core.
//!
//! Capability implementations (stores, embedders, LLM clients) speak
//! `anyhow::Result`; the facade and orchestrator convert those failures into
//! [`RagError`] at their boundary.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum RagError {
    /// Malformed input that could not be sanitized into something usable.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// The knowledge store, embedding model or LLM endpoint failed.
    #[error("upstream failure: {0}")]
    Upstream(String),

    /// Missing or inconsistent configuration. Fatal at start-up.
    #[error("configuration error: {message}")]
    Configuration { message: String },

    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RagError>;

impl RagError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration {
            message: msg.into(),
        }
    }

    /// Wrap a capability failure, keeping the full `anyhow` context chain.
    pub fn upstream(err: impl std::fmt::Display) -> Self {
        Self::Upstream(format!("{:#}", err))
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<anyhow::Error> for RagError {
    fn from(err: anyhow::Error) -> Self {
        Self::upstream(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_keeps_context_chain() {
        let err = anyhow::anyhow!("connection refused").context("vector search failed");
        let rag: RagError = err.into();
        let msg = rag.to_string();
        assert!(msg.starts_with("upstream failure:"));
        assert!(msg.contains("vector search failed"));
        assert!(msg.contains("connection refused"));
    }

    #[test]
    fn test_configuration_message() {
        let err = RagError::configuration("Missing required environment variables: OPENAI_API_KEY");
        assert_eq!(
            err.to_string(),
            "configuration error: Missing required environment variables: OPENAI_API_KEY"
        );
    }
}

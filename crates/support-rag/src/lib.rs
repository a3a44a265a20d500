pub mod clock;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod knowledge_base;
pub mod llm;
pub mod rag;
pub mod responder;
pub mod storage;
pub mod text;
pub mod triage;
pub mod types;

// Re-export primary types for convenience
pub use clock::{Clock, SystemClock};
pub use config::{ScoreConvention, SupportConfig};
pub use error::{RagError, Result};
pub use knowledge_base::KnowledgeBase;
pub use llm::{ChatCompletion, ChatMessage, OpenAiChatClient};
pub use rag::{ContextAssembler, QueryGate, Retriever};
pub use responder::{ConversationContext, SupportResponder};
pub use storage::{InMemoryVectorStore, KnowledgeStore};
pub use triage::{Triage, TriageAssessment};
pub use types::{
    Document, EscalationDecision, EscalationReason, Metadata, MetadataValue, NewDocument,
    RetrievalResult, ScoredDocument, StoreStats, UrgencyLevel, UserInfo,
};

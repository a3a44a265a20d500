//! Retrieval pipeline: gate and enhance the query, search the knowledge base,
//! assemble the context block.

pub mod context_assembler;
pub mod query_gate;
pub mod retriever;

pub use context_assembler::{ContextAssembler, DEFAULT_SCORE_THRESHOLD};
pub use query_gate::{QueryGate, ENHANCEMENT_RULES, RETRIEVAL_KEYWORDS};
pub use retriever::Retriever;

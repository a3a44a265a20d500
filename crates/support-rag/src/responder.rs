//! AI response path: system prompt, conversation context, retrieved
//! knowledge and the customer's message, sent to a chat-completion backend.

use std::sync::Arc;

use crate::config::SupportConfig;
use crate::llm::{ChatCompletion, ChatMessage, GenerationConfig};
use crate::rag::Retriever;
use crate::triage::{Triage, TriageAssessment};
use crate::types::UserInfo;

const SYSTEM_PROMPT: &str = "You are a helpful and professional customer support AI assistant. Your role is to:

1. Provide accurate, helpful, and friendly responses to customer inquiries
2. Understand customer issues and provide relevant solutions
3. Escalate complex issues when necessary
4. Maintain a professional and empathetic tone
5. Ask clarifying questions when needed
6. Provide step-by-step instructions when appropriate
7. Acknowledge customer concerns and show understanding

Key guidelines:
- Always be polite and professional
- Provide specific, actionable advice
- If you don't know something, say so and offer to connect them with a human agent
- Keep responses concise but comprehensive
- Use clear, simple language
- Show empathy for customer frustrations
- If the issue requires human intervention, clearly state this

Remember: You're here to help customers feel heard and supported while providing practical solutions to their problems.";

pub const FALLBACK_RESPONSE: &str = "I apologize, but I'm experiencing technical difficulties right now. Please try again in a moment or contact our human support team for immediate assistance.";

/// What the caller knows about the conversation so far.
#[derive(Debug, Clone, Default)]
pub struct ConversationContext {
    pub user_info: Option<UserInfo>,
    pub history_len: usize,
    pub issue_category: Option<String>,
    pub sentiment: Option<String>,
}

impl ConversationContext {
    /// Render as a single `Context: a | b | c` line, or `None` when nothing is known.
    pub fn to_message(&self) -> Option<String> {
        let mut parts = Vec::new();

        if let Some(user) = &self.user_info {
            parts.push(format!(
                "Customer Info: {} - {}",
                user.name.as_deref().unwrap_or("Unknown"),
                user.email.as_deref().unwrap_or("No email")
            ));
        }
        if self.history_len > 0 {
            parts.push(format!(
                "Previous messages in this conversation: {}",
                self.history_len
            ));
        }
        if let Some(category) = &self.issue_category {
            parts.push(format!("Issue Category: {}", category));
        }
        if let Some(sentiment) = &self.sentiment {
            parts.push(format!("Sentiment: {}", sentiment));
        }

        if parts.is_empty() {
            None
        } else {
            Some(format!("Context: {}", parts.join(" | ")))
        }
    }
}

pub struct SupportResponder {
    retriever: Arc<Retriever>,
    llm: Arc<dyn ChatCompletion>,
    triage: Arc<Triage>,
    generation: GenerationConfig,
    ai_enabled: bool,
}

impl SupportResponder {
    pub fn new(
        retriever: Arc<Retriever>,
        llm: Arc<dyn ChatCompletion>,
        triage: Arc<Triage>,
        config: &SupportConfig,
    ) -> Self {
        Self {
            retriever,
            llm,
            triage,
            generation: GenerationConfig::from(&config.llm),
            ai_enabled: config.features.ai_enabled,
        }
    }

    /// Assemble the ordered message list for one customer turn.
    pub async fn build_messages(
        &self,
        user_message: &str,
        context: Option<&ConversationContext>,
    ) -> Vec<ChatMessage> {
        let mut messages = vec![ChatMessage::system(SYSTEM_PROMPT)];

        if let Some(block) = context.and_then(ConversationContext::to_message) {
            messages.push(ChatMessage::system(block));
        }
        if let Some(rag_context) = self.retriever.rag_context(user_message).await {
            messages.push(ChatMessage::system(rag_context));
        }

        messages.push(ChatMessage::user(user_message));
        messages
    }

    /// Generate a reply. Never fails: backend errors yield [`FALLBACK_RESPONSE`].
    pub async fn generate_response(
        &self,
        user_message: &str,
        context: Option<&ConversationContext>,
    ) -> String {
        if !self.ai_enabled {
            tracing::debug!("AI responses disabled, returning fallback");
            return FALLBACK_RESPONSE.to_string();
        }

        let messages = self.build_messages(user_message, context).await;

        match self.llm.complete(&messages, &self.generation).await {
            Ok(reply) => {
                let preview: String = user_message.chars().take(100).collect();
                tracing::info!(
                    model = self.llm.model(),
                    message = %preview,
                    reply_chars = reply.len(),
                    "Generated AI response"
                );
                reply
            }
            Err(e) => {
                tracing::error!(error = %e, "Error generating AI response");
                FALLBACK_RESPONSE.to_string()
            }
        }
    }

    pub fn assess(&self, message: &str, user_info: Option<&UserInfo>) -> TriageAssessment {
        self.triage.assess(message, user_info)
    }
}

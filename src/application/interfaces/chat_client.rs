use async_trait::async_trait;

use crate::domain::{ChatMessage, ChatSettings, DomainError};

/// Sends chat-style prompts to an LLM provider.
///
/// Implementors encapsulate transport, serialization and vendor-specific API
/// details so callers only deal with [`ChatMessage`] values.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Send the conversation and return the assistant's reply.
    async fn complete(
        &self,
        messages: &[ChatMessage],
        settings: &ChatSettings,
    ) -> Result<ChatMessage, DomainError>;

    /// Send a `system` context message followed by a `user` prompt and return
    /// the reply text.
    async fn complete_prompt(&self, system: &str, user: &str) -> Result<String, DomainError> {
        let mut messages = Vec::with_capacity(2);
        if !system.is_empty() {
            messages.push(ChatMessage::system(system));
        }
        messages.push(ChatMessage::user(user));
        let reply = self.complete(&messages, &ChatSettings::default()).await?;
        Ok(reply.content)
    }
}

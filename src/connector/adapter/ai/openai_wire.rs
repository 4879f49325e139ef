//! Request and response bodies shared by OpenAI and Azure OpenAI.

use serde::{Deserialize, Serialize};

use crate::domain::{ChatMessage, ChatRole, ChatSettings, DomainError};

#[derive(Serialize)]
pub(crate) struct ChatRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<&'a str>,
    pub messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
}

impl<'a> ChatRequest<'a> {
    pub fn new(
        model: Option<&'a str>,
        messages: &'a [ChatMessage],
        settings: &ChatSettings,
    ) -> Self {
        Self {
            model,
            messages,
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            top_p: settings.top_p,
        }
    }
}

#[derive(Deserialize)]
pub(crate) struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatResponse {
    pub fn into_message(self, provider: &str) -> Result<ChatMessage, DomainError> {
        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::service(format!("{provider}: response had no choices")))?;
        Ok(ChatMessage {
            role: ChatRole::Assistant,
            content: choice.message.content.unwrap_or_default(),
        })
    }
}

#[derive(Serialize)]
pub(crate) struct EmbeddingRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<&'a str>,
    pub input: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<usize>,
}

#[derive(Deserialize)]
pub(crate) struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}

impl EmbeddingResponse {
    /// Vectors in input order.
    pub fn into_vectors(mut self) -> Vec<Vec<f32>> {
        self.data.sort_by_key(|d| d.index);
        self.data.into_iter().map(|d| d.embedding).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_settings_are_omitted() {
        let messages = [ChatMessage::user("hi")];
        let settings = ChatSettings {
            temperature: Some(0.5),
            ..Default::default()
        };
        let body =
            serde_json::to_value(ChatRequest::new(Some("gpt-4o"), &messages, &settings)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "model": "gpt-4o",
                "messages": [{"role": "user", "content": "hi"}],
                "temperature": 0.5
            })
        );
    }

    #[test]
    fn embeddings_are_reordered_by_index() {
        let response: EmbeddingResponse = serde_json::from_value(serde_json::json!({
            "data": [
                {"embedding": [2.0], "index": 1},
                {"embedding": [1.0], "index": 0}
            ]
        }))
        .unwrap();
        assert_eq!(response.into_vectors(), vec![vec![1.0], vec![2.0]]);
    }
}

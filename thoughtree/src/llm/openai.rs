//! OpenAI Chat Completions client implementing `LlmClient` (ChatOpenAI).
//!
//! Requires `OPENAI_API_KEY` (or explicit config). Point the client at another
//! OpenAI-compatible endpoint with [`ChatOpenAI::with_config`].

use async_trait::async_trait;
use tracing::{debug, trace};

use crate::error::OracleError;
use crate::llm::{LlmClient, LlmResponse, LlmUsage};
use crate::message::Message;

use async_openai::{
    config::{Config, OpenAIConfig},
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
        ChatCompletionRequestUserMessage, CreateChatCompletionRequestArgs,
    },
    Client,
};

/// OpenAI-compatible chat client used by the CLI for both oracles.
pub struct ChatOpenAI {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: Option<f32>,
}

impl ChatOpenAI {
    /// Client with default config (API key from `OPENAI_API_KEY`).
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            model: model.into(),
            temperature: None,
        }
    }

    /// Client with custom config (API key, base URL).
    pub fn with_config(config: OpenAIConfig, model: impl Into<String>) -> Self {
        Self {
            client: Client::with_config(config),
            model: model.into(),
            temperature: None,
        }
    }

    /// Set temperature (0–2). Generation benefits from > 0 so repeated samples differ.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Endpoint this client actually calls.
    fn chat_completions_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.client.config().api_base().trim_end_matches('/')
        )
    }

    fn messages_to_request(messages: &[Message]) -> Vec<ChatCompletionRequestMessage> {
        messages
            .iter()
            .map(|m| match m {
                Message::System(s) => ChatCompletionRequestMessage::System(
                    ChatCompletionRequestSystemMessage::from(s.as_str()),
                ),
                Message::User(s) => ChatCompletionRequestMessage::User(
                    ChatCompletionRequestUserMessage::from(s.as_str()),
                ),
                Message::Assistant(s) => ChatCompletionRequestMessage::Assistant(s.as_str().into()),
            })
            .collect()
    }
}

#[async_trait]
impl LlmClient for ChatOpenAI {
    async fn invoke(&self, messages: &[Message]) -> Result<LlmResponse, OracleError> {
        let trace_id = uuid::Uuid::new_v4().to_string();
        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(self.model.clone());
        args.messages(Self::messages_to_request(messages));
        if let Some(t) = self.temperature {
            args.temperature(t);
        }
        let request = args
            .build()
            .map_err(|e| OracleError::Llm(format!("OpenAI request build failed: {}", e)))?;

        let url = self.chat_completions_url();
        debug!(
            trace_id = %trace_id,
            url = %url,
            model = %self.model,
            message_count = messages.len(),
            temperature = ?self.temperature,
            "OpenAI chat create"
        );
        if let Ok(js) = serde_json::to_string_pretty(&request) {
            trace!(trace_id = %trace_id, request = %js, "OpenAI request body");
        }

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| OracleError::Llm(format!("OpenAI API error: {}", e)))?;

        if let Ok(js) = serde_json::to_string_pretty(&response) {
            trace!(trace_id = %trace_id, response = %js, "OpenAI response body");
        }

        let usage = response.usage.as_ref().map(|u| LlmUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| OracleError::Llm("OpenAI returned no choices".to_string()))?;
        let content = choice.message.content.unwrap_or_default();
        debug!(
            trace_id = %trace_id,
            content_len = content.len(),
            total_tokens = usage.as_ref().map(|u| u.total_tokens),
            "OpenAI chat done"
        );
        Ok(LlmResponse { content, usage })
    }
}

//! LLM client abstraction behind the LLM-backed oracles.
//!
//! [`LlmGenerationOracle`](crate::LlmGenerationOracle) and
//! [`LlmValidityOracle`](crate::LlmValidityOracle) render a prompt into messages and
//! call an [`LlmClient`]; this module defines the trait, the scripted [`MockLlm`] used in
//! tests and the OpenAI-compatible [`ChatOpenAI`].

mod mock;
mod openai;

pub use mock::MockLlm;
pub use openai::ChatOpenAI;

use async_trait::async_trait;

use crate::error::OracleError;
use crate::message::Message;

/// Token usage for one LLM call (prompt + completion).
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LlmUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Response from one completion.
#[derive(Clone, Debug, Default)]
pub struct LlmResponse {
    /// Assistant message content (plain text).
    pub content: String,
    /// Token usage for this call, when the provider reports it.
    pub usage: Option<LlmUsage>,
}

impl LlmResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            usage: None,
        }
    }
}

/// LLM client: given messages, returns assistant text.
///
/// Implementations must be stateless with respect to a search: two concurrent searches
/// may share one client.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Invoke one turn.
    async fn invoke(&self, messages: &[Message]) -> Result<LlmResponse, OracleError>;
}

#[async_trait]
impl<T: LlmClient + ?Sized> LlmClient for std::sync::Arc<T> {
    async fn invoke(&self, messages: &[Message]) -> Result<LlmResponse, OracleError> {
        (**self).invoke(messages).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct StubLlm {
        content: String,
    }

    #[async_trait]
    impl LlmClient for StubLlm {
        async fn invoke(&self, _messages: &[Message]) -> Result<LlmResponse, OracleError> {
            Ok(LlmResponse::text(self.content.clone()))
        }
    }

    #[tokio::test]
    async fn arc_client_delegates() {
        let llm: Arc<dyn LlmClient> = Arc::new(StubLlm {
            content: "hello".to_string(),
        });
        let resp = llm.invoke(&[Message::user("hi")]).await.unwrap();
        assert_eq!(resp.content, "hello");
        assert!(resp.usage.is_none());
    }
}

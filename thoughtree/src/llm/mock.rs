//! Mock LLM for tests and examples.
//!
//! Replays a script of responses in order; once the script is used up the last entry
//! repeats. Records every prompt it receives so tests can assert on call counts and
//! prompt content.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::OracleError;
use crate::llm::{LlmClient, LlmResponse};
use crate::message::Message;

/// One scripted step: either a reply or a transport failure.
#[derive(Clone, Debug)]
enum Scripted {
    Reply(String),
    Fail(String),
}

/// Scripted mock LLM.
///
/// **Interaction**: Implements `LlmClient`; wrapped by the LLM-backed oracles in tests.
pub struct MockLlm {
    script: Mutex<VecDeque<Scripted>>,
    last: Mutex<Option<Scripted>>,
    prompts: Mutex<Vec<Vec<Message>>>,
}

impl MockLlm {
    /// Mock that always answers `content`.
    pub fn with_reply(content: impl Into<String>) -> Self {
        Self::scripted([content.into()])
    }

    /// Mock that answers with each entry of `replies` in turn, repeating the last one.
    pub fn scripted<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            script: Mutex::new(
                replies
                    .into_iter()
                    .map(|s| Scripted::Reply(s.into()))
                    .collect(),
            ),
            last: Mutex::new(None),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Queues a failing call (builder); the failure is not repeated.
    pub fn then_fail(self, reason: impl Into<String>) -> Self {
        self.push(Scripted::Fail(reason.into()));
        self
    }

    /// Queues another reply (builder).
    pub fn then_reply(self, content: impl Into<String>) -> Self {
        self.push(Scripted::Reply(content.into()));
        self
    }

    /// Number of `invoke` calls so far.
    pub fn call_count(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or(0)
    }

    /// Messages received by every call, in order.
    pub fn prompts(&self) -> Vec<Vec<Message>> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    fn push(&self, step: Scripted) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(step);
        }
    }

    fn next_step(&self) -> Scripted {
        let popped = self.script.lock().ok().and_then(|mut s| s.pop_front());
        let mut last = match self.last.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        match popped {
            Some(step) => {
                if let Scripted::Reply(_) = step {
                    *last = Some(step.clone());
                }
                step
            }
            None => last.clone().unwrap_or(Scripted::Reply(String::new())),
        }
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn invoke(&self, messages: &[Message]) -> Result<LlmResponse, OracleError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(messages.to_vec());
        }
        match self.next_step() {
            Scripted::Reply(content) => Ok(LlmResponse::text(content)),
            Scripted::Fail(reason) => Err(OracleError::Llm(reason)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replays_script_then_repeats_last() {
        let llm = MockLlm::scripted(["a", "b"]);
        let mut seen = Vec::new();
        for _ in 0..4 {
            seen.push(llm.invoke(&[]).await.unwrap().content);
        }
        assert_eq!(seen, vec!["a", "b", "b", "b"]);
        assert_eq!(llm.call_count(), 4);
    }

    #[tokio::test]
    async fn failure_is_not_repeated() {
        let llm = MockLlm::with_reply("ok").then_fail("boom").then_reply("again");
        assert_eq!(llm.invoke(&[]).await.unwrap().content, "ok");
        assert!(matches!(llm.invoke(&[]).await, Err(OracleError::Llm(r)) if r == "boom"));
        assert_eq!(llm.invoke(&[]).await.unwrap().content, "again");
        assert_eq!(llm.invoke(&[]).await.unwrap().content, "again");
    }

    #[tokio::test]
    async fn records_prompts() {
        let llm = MockLlm::with_reply("x");
        llm.invoke(&[Message::user("first")]).await.unwrap();
        let prompts = llm.prompts();
        assert_eq!(prompts.len(), 1);
        assert_eq!(prompts[0][0].content(), "first");
    }
}

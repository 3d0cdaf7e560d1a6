//! The two external boundaries of the search: [`GenerationOracle`] and [`ValidityOracle`].
//!
//! Everything behind them (transport, prompt formatting, model selection) is opaque to
//! the search. [`LlmGenerationOracle`] and [`LlmValidityOracle`] are the LLM-backed
//! implementations: they render a [`prompt`](crate::prompt) template, call an
//! [`LlmClient`] under an [`OracleGuard`], and parse the reply.

mod retry;

pub use retry::{OracleGuard, RetryPolicy};

use std::sync::Arc;

use async_trait::async_trait;
use tracing::trace;

use crate::error::OracleError;
use crate::llm::LlmClient;
use crate::message::Message;
use crate::prompt::{self, Language};
use crate::thought::ThoughtPath;

/// Everything an oracle call is conditioned on.
#[derive(Clone, Copy, Debug)]
pub struct PromptContext<'a> {
    pub problem: &'a str,
    pub path: &'a ThoughtPath,
    /// Number of candidates requested (propose calls only).
    pub n: Option<usize>,
}

impl<'a> PromptContext<'a> {
    pub fn new(problem: &'a str, path: &'a ThoughtPath) -> Self {
        Self {
            problem,
            path,
            n: None,
        }
    }

    pub fn with_n(mut self, n: usize) -> Self {
        self.n = Some(n);
        self
    }
}

/// Reply of a multi-candidate generation call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Proposal {
    /// A list of candidate thoughts, in proposal order.
    List(Vec<String>),
    /// Anything that is not a list; the propose strategy treats it as no candidate.
    Text(String),
}

impl Proposal {
    /// Parses a model reply: a fenced ```json block or a bare JSON array becomes `List`,
    /// everything else `Text`.
    pub fn parse(content: &str) -> Self {
        let body = extract_fenced_json(content).unwrap_or_else(|| content.trim());
        match serde_json::from_str::<serde_json::Value>(body) {
            Ok(serde_json::Value::Array(items)) => Proposal::List(
                items
                    .into_iter()
                    .filter_map(|item| match item {
                        serde_json::Value::String(s) => Some(s),
                        serde_json::Value::Null => None,
                        other => Some(other.to_string()),
                    })
                    .collect(),
            ),
            _ => Proposal::Text(content.to_string()),
        }
    }
}

/// Returns the body of the first ```json (or bare ```) fence in `content`.
fn extract_fenced_json(content: &str) -> Option<&str> {
    let start = content.find("```")?;
    let rest = &content[start + 3..];
    let rest = rest
        .strip_prefix("json")
        .or_else(|| rest.strip_prefix("JSON"))
        .unwrap_or(rest);
    let end = rest.find("```").unwrap_or(rest.len());
    Some(rest[..end].trim())
}

/// Produces candidate thoughts.
#[async_trait]
pub trait GenerationOracle: Send + Sync {
    /// One next thought conditioned on the problem and path.
    async fn propose_one(&self, ctx: &PromptContext<'_>) -> Result<String, OracleError>;

    /// `ctx.n` next thoughts as a list.
    async fn propose_many(&self, ctx: &PromptContext<'_>) -> Result<Proposal, OracleError>;
}

/// Judges the last thought of a path; free text whose first line should hold the keyword.
#[async_trait]
pub trait ValidityOracle: Send + Sync {
    async fn judge(&self, ctx: &PromptContext<'_>) -> Result<String, OracleError>;
}

#[async_trait]
impl<T: GenerationOracle + ?Sized> GenerationOracle for Arc<T> {
    async fn propose_one(&self, ctx: &PromptContext<'_>) -> Result<String, OracleError> {
        (**self).propose_one(ctx).await
    }

    async fn propose_many(&self, ctx: &PromptContext<'_>) -> Result<Proposal, OracleError> {
        (**self).propose_many(ctx).await
    }
}

#[async_trait]
impl<T: ValidityOracle + ?Sized> ValidityOracle for Arc<T> {
    async fn judge(&self, ctx: &PromptContext<'_>) -> Result<String, OracleError> {
        (**self).judge(ctx).await
    }
}

/// LLM-backed generation oracle.
pub struct LlmGenerationOracle {
    llm: Arc<dyn LlmClient>,
    language: Language,
    guard: OracleGuard,
}

impl LlmGenerationOracle {
    pub fn new(llm: Arc<dyn LlmClient>, language: Language) -> Self {
        Self {
            llm,
            language,
            guard: OracleGuard::unguarded(),
        }
    }

    pub fn with_guard(mut self, guard: OracleGuard) -> Self {
        self.guard = guard;
        self
    }

    async fn complete(&self, label: &str, prompt: String) -> Result<String, OracleError> {
        let messages = [Message::user(prompt)];
        let response = self
            .guard
            .run(label, || self.llm.invoke(&messages))
            .await?;
        trace!(
            oracle = label,
            total_tokens = response.usage.as_ref().map(|u| u.total_tokens),
            content = %response.content,
            "oracle reply"
        );
        Ok(response.content)
    }
}

#[async_trait]
impl GenerationOracle for LlmGenerationOracle {
    async fn propose_one(&self, ctx: &PromptContext<'_>) -> Result<String, OracleError> {
        let prompt = prompt::sample_prompt(self.language, ctx.problem, ctx.path);
        let content = self.complete("sample", prompt).await?;
        Ok(content.trim().to_string())
    }

    async fn propose_many(&self, ctx: &PromptContext<'_>) -> Result<Proposal, OracleError> {
        let n = ctx.n.unwrap_or(1);
        let prompt = prompt::propose_prompt(self.language, ctx.problem, ctx.path, n);
        let content = self.complete("propose", prompt).await?;
        Ok(Proposal::parse(&content))
    }
}

/// LLM-backed validity oracle.
pub struct LlmValidityOracle {
    llm: Arc<dyn LlmClient>,
    language: Language,
    guard: OracleGuard,
}

impl LlmValidityOracle {
    pub fn new(llm: Arc<dyn LlmClient>, language: Language) -> Self {
        Self {
            llm,
            language,
            guard: OracleGuard::unguarded(),
        }
    }

    pub fn with_guard(mut self, guard: OracleGuard) -> Self {
        self.guard = guard;
        self
    }
}

#[async_trait]
impl ValidityOracle for LlmValidityOracle {
    async fn judge(&self, ctx: &PromptContext<'_>) -> Result<String, OracleError> {
        let messages = [Message::user(prompt::check_prompt(
            self.language,
            ctx.problem,
            ctx.path,
        ))];
        let response = self
            .guard
            .run("check", || self.llm.invoke(&messages))
            .await?;
        trace!(
            oracle = "check",
            total_tokens = response.usage.as_ref().map(|u| u.total_tokens),
            content = %response.content,
            "oracle reply"
        );
        Ok(response.content)
    }
}

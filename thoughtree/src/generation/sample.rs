//! SAMPLE strategy: one independent oracle call per thought.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::trace;

use crate::error::SearchError;
use crate::oracle::{GenerationOracle, PromptContext};
use crate::thought::ThoughtPath;

use super::ThoughtGenerator;

/// Asks the oracle for exactly one next thought on every call. Stateless.
pub struct SampleStrategy {
    oracle: Arc<dyn GenerationOracle>,
}

impl SampleStrategy {
    pub fn new(oracle: Arc<dyn GenerationOracle>) -> Self {
        Self { oracle }
    }
}

#[async_trait]
impl ThoughtGenerator for SampleStrategy {
    async fn next_thought(
        &mut self,
        problem: &str,
        path: &ThoughtPath,
    ) -> Result<String, SearchError> {
        let text = self
            .oracle
            .propose_one(&PromptContext::new(problem, path))
            .await?;
        trace!(path_len = path.len(), text = %text, "sampled thought");
        Ok(text)
    }
}

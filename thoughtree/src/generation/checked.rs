//! PROPOSE strategy screened by a checker.
//!
//! Candidates are popped in proposal order and classified immediately; the first one
//! that is not invalid is returned, invalid ones are dropped for good. When the queue
//! runs dry without a valid candidate the result is empty, which the loop counts as an
//! invalid step. The loop still classifies the returned thought itself.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::checker::Checker;
use crate::error::SearchError;
use crate::thought::ThoughtPath;

use super::{ProposeStrategy, ThoughtGenerator};

pub struct CheckedProposeStrategy {
    inner: ProposeStrategy,
    checker: Arc<dyn Checker>,
}

impl CheckedProposeStrategy {
    pub fn new(inner: ProposeStrategy, checker: Arc<dyn Checker>) -> Self {
        Self { inner, checker }
    }

    pub fn proposals(&self) -> &ProposeStrategy {
        &self.inner
    }
}

#[async_trait]
impl ThoughtGenerator for CheckedProposeStrategy {
    async fn next_thought(
        &mut self,
        problem: &str,
        path: &ThoughtPath,
    ) -> Result<String, SearchError> {
        if !self.inner.ensure_candidates(problem, path).await? {
            return Ok(String::new());
        }
        while let Some(candidate) = self.inner.pop(path) {
            let validity = self
                .checker
                .evaluate(problem, &path.extended(candidate.as_str()))
                .await?;
            if validity.is_valid() {
                return Ok(candidate);
            }
            debug!(path_len = path.len(), candidate = %candidate, "screened out invalid proposal");
        }
        Ok(String::new())
    }

    fn reset(&mut self) {
        self.inner.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::FnChecker;
    use crate::error::OracleError;
    use crate::oracle::{GenerationOracle, PromptContext, Proposal};
    use crate::thought::ThoughtValidity;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixed {
        items: Vec<&'static str>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl GenerationOracle for Fixed {
        async fn propose_one(&self, _ctx: &PromptContext<'_>) -> Result<String, OracleError> {
            unreachable!()
        }

        async fn propose_many(&self, _ctx: &PromptContext<'_>) -> Result<Proposal, OracleError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Proposal::List(self.items.iter().map(|s| s.to_string()).collect()))
        }
    }

    fn bad_is_invalid() -> Arc<dyn Checker> {
        Arc::new(FnChecker::new(|_p: &str, path: &ThoughtPath| {
            if path.last().is_some_and(|t| t.starts_with("bad")) {
                ThoughtValidity::Invalid
            } else {
                ThoughtValidity::ValidIntermediate
            }
        }))
    }

    #[tokio::test]
    async fn skips_invalid_candidates_without_requeueing() {
        let oracle = Arc::new(Fixed {
            items: vec!["bad-1", "good-1", "bad-2", "good-2"],
            calls: AtomicUsize::new(0),
        });
        let mut gen = CheckedProposeStrategy::new(
            ProposeStrategy::new(oracle.clone(), 4),
            bad_is_invalid(),
        );
        let root = ThoughtPath::root();
        assert_eq!(gen.next_thought("p", &root).await.unwrap(), "good-1");
        assert_eq!(gen.next_thought("p", &root).await.unwrap(), "good-2");
        assert_eq!(gen.proposals().cache().pending(&root), 0);
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn all_invalid_yields_empty() {
        let oracle = Arc::new(Fixed {
            items: vec!["bad-1", "bad-2"],
            calls: AtomicUsize::new(0),
        });
        let mut gen =
            CheckedProposeStrategy::new(ProposeStrategy::new(oracle.clone(), 2), bad_is_invalid());
        assert_eq!(gen.next_thought("p", &ThoughtPath::root()).await.unwrap(), "");
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 1);
    }
}

//! Validity checking: [`Checker`] classifies the newest thought of a path.
//!
//! [`OracleChecker`] asks a [`ValidityOracle`] and reads the keyword on the first line of
//! its reply. When the oracle drifts from the keywords, the first line is compared to
//! the canonical labels by [`LabelMatcher`]; that fallback never fails.
//! [`FnChecker`] wraps a plain function for deterministic checkers.

mod similarity;

pub use similarity::{cosine_similarity, Embedder, HashEmbedder, LabelMatcher, OpenAIEmbedder};

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::SearchError;
use crate::oracle::{PromptContext, ValidityOracle};
use crate::thought::{ThoughtPath, ThoughtValidity};

/// Labels compared against a drifting first line, aligned with [`ThoughtValidity::ALL`].
const CANONICAL_LABELS: [&str; 3] = ["FINAL", "INTERMEDIATE", "INVALID"];

/// Classifies the last thought of `path` (the candidate) given the accepted ones before it.
#[async_trait]
pub trait Checker: Send + Sync {
    async fn evaluate(
        &self,
        problem: &str,
        path: &ThoughtPath,
    ) -> Result<ThoughtValidity, SearchError>;
}

#[async_trait]
impl<T: Checker + ?Sized> Checker for Arc<T> {
    async fn evaluate(
        &self,
        problem: &str,
        path: &ThoughtPath,
    ) -> Result<ThoughtValidity, SearchError> {
        (**self).evaluate(problem, path).await
    }
}

/// Checker backed by a [`ValidityOracle`].
pub struct OracleChecker<V> {
    oracle: V,
    matcher: LabelMatcher,
}

impl<V: ValidityOracle> OracleChecker<V> {
    pub fn new(oracle: V) -> Self {
        Self {
            oracle,
            matcher: LabelMatcher::new(),
        }
    }

    /// Replaces the nearest-label matcher (e.g. one backed by a model embedder).
    pub fn with_matcher(mut self, matcher: LabelMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    /// Classifies an oracle reply. Exact keyword on the first line wins; otherwise the
    /// nearest canonical label; with no similarity at all the thought is `Invalid`.
    pub async fn judge_output(&self, output: &str) -> ThoughtValidity {
        let first_line = output.trim_start().lines().next().unwrap_or("");
        if let Some(v) = exact_keyword(first_line) {
            return v;
        }
        match self.matcher.nearest(first_line, &CANONICAL_LABELS).await {
            Some(i) => {
                let v = ThoughtValidity::ALL[i];
                warn!(first_line, validity = %v, "no validity keyword, using nearest label");
                v
            }
            None => {
                warn!(first_line, "no validity keyword and no similar label, treating as INVALID");
                ThoughtValidity::Invalid
            }
        }
    }
}

/// First keyword found in `line`, checked in `VALID_FINAL`, `VALID_INTERMEDIATE`,
/// `INVALID` order. Case-sensitive: lower-case prose goes to the nearest-label fallback.
fn exact_keyword(line: &str) -> Option<ThoughtValidity> {
    ThoughtValidity::ALL
        .into_iter()
        .find(|v| line.contains(v.as_label()))
}

#[async_trait]
impl<V: ValidityOracle> Checker for OracleChecker<V> {
    async fn evaluate(
        &self,
        problem: &str,
        path: &ThoughtPath,
    ) -> Result<ThoughtValidity, SearchError> {
        let output = self.oracle.judge(&PromptContext::new(problem, path)).await?;
        let validity = self.judge_output(&output).await;
        debug!(path_len = path.len(), validity = %validity, "checked thought");
        Ok(validity)
    }
}

/// Checker from a synchronous function, e.g. comparing against a known solution.
pub struct FnChecker<F> {
    f: F,
}

impl<F> FnChecker<F>
where
    F: Fn(&str, &ThoughtPath) -> ThoughtValidity + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F> Checker for FnChecker<F>
where
    F: Fn(&str, &ThoughtPath) -> ThoughtValidity + Send + Sync,
{
    async fn evaluate(
        &self,
        problem: &str,
        path: &ThoughtPath,
    ) -> Result<ThoughtValidity, SearchError> {
        Ok((self.f)(problem, path))
    }
}

//! Thought generation strategies.
//!
//! A [`ThoughtGenerator`] returns the next candidate text for a problem and the current
//! accepted path. An empty string means "no candidate available at this path"; the search
//! loop treats it as an invalid step.
//!
//! - [`SampleStrategy`]: one fresh oracle call per thought (rich, paragraph-sized thoughts).
//! - [`ProposeStrategy`]: one oracle call proposes `c` thoughts that are handed out one per
//!   step from a [`GeneratorCache`] (constrained, line-sized thoughts).
//! - [`CheckedProposeStrategy`]: like propose, but screens candidates through a
//!   [`Checker`] and skips invalid ones.

mod checked;
mod propose;
mod sample;

pub use checked::CheckedProposeStrategy;
pub use propose::{GeneratorCache, ProposeStrategy};
pub use sample::SampleStrategy;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::checker::Checker;
use crate::error::SearchError;
use crate::oracle::GenerationOracle;
use crate::thought::ThoughtPath;

/// Produces the next candidate thought. Stateful strategies take `&mut self`.
#[async_trait]
pub trait ThoughtGenerator: Send + Sync {
    async fn next_thought(
        &mut self,
        problem: &str,
        path: &ThoughtPath,
    ) -> Result<String, SearchError>;

    /// Drops per-search state. Called before every search.
    fn reset(&mut self) {}
}

#[async_trait]
impl<T: ThoughtGenerator + ?Sized> ThoughtGenerator for Box<T> {
    async fn next_thought(
        &mut self,
        problem: &str,
        path: &ThoughtPath,
    ) -> Result<String, SearchError> {
        (**self).next_thought(problem, path).await
    }

    fn reset(&mut self) {
        (**self).reset()
    }
}

/// Generation strategy, chosen at configuration time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    Sample,
    #[default]
    Propose,
    CheckedPropose,
}

impl Strategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sample => "sample",
            Self::Propose => "propose",
            Self::CheckedPropose => "checked-propose",
        }
    }

    /// Builds the generator for this strategy. `checker` is only used by `CheckedPropose`.
    pub fn build(
        self,
        oracle: Arc<dyn GenerationOracle>,
        checker: Arc<dyn Checker>,
        c: usize,
    ) -> Box<dyn ThoughtGenerator> {
        match self {
            Self::Sample => Box::new(SampleStrategy::new(oracle)),
            Self::Propose => Box::new(ProposeStrategy::new(oracle, c)),
            Self::CheckedPropose => Box::new(CheckedProposeStrategy::new(
                ProposeStrategy::new(oracle, c),
                checker,
            )),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "sample" => Ok(Self::Sample),
            "propose" => Ok(Self::Propose),
            "checked-propose" => Ok(Self::CheckedPropose),
            _ => Err(format!(
                "unknown strategy: {} (use sample, propose, or checked-propose)",
                s
            )),
        }
    }
}

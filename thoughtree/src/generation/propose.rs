//! PROPOSE strategy and its per-path candidate cache.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::SearchError;
use crate::oracle::{GenerationOracle, PromptContext, Proposal};
use crate::thought::ThoughtPath;

use super::ThoughtGenerator;

/// Unconsumed proposals per path.
///
/// Each queue is stored reversed so `pop` hands candidates out in proposal order. A
/// path's queue is refilled only once it is empty. Owned by one strategy instance and
/// cleared at the start of every search.
#[derive(Clone, Debug, Default)]
pub struct GeneratorCache {
    queues: HashMap<ThoughtPath, Vec<String>>,
}

impl GeneratorCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` when `path` has no entry or its queue is empty.
    pub fn is_exhausted(&self, path: &ThoughtPath) -> bool {
        self.queues.get(path).map_or(true, Vec::is_empty)
    }

    /// Candidates still queued for `path`.
    pub fn pending(&self, path: &ThoughtPath) -> usize {
        self.queues.get(path).map_or(0, Vec::len)
    }

    /// Stores `candidates` (in proposal order) for `path`, replacing an empty queue.
    pub fn refill(&mut self, path: ThoughtPath, mut candidates: Vec<String>) {
        candidates.reverse();
        self.queues.insert(path, candidates);
    }

    /// Next candidate for `path`, in proposal order.
    pub fn pop(&mut self, path: &ThoughtPath) -> Option<String> {
        self.queues.get_mut(path).and_then(Vec::pop)
    }

    pub fn clear(&mut self) {
        self.queues.clear();
    }
}

/// Asks the oracle for `c` candidates at once and hands them out one per call.
pub struct ProposeStrategy {
    oracle: Arc<dyn GenerationOracle>,
    c: usize,
    cache: GeneratorCache,
}

impl ProposeStrategy {
    pub fn new(oracle: Arc<dyn GenerationOracle>, c: usize) -> Self {
        Self {
            oracle,
            c,
            cache: GeneratorCache::new(),
        }
    }

    pub fn cache(&self) -> &GeneratorCache {
        &self.cache
    }

    /// Refills the queue for `path` if it is empty. Returns `false` when the oracle gave
    /// nothing usable (empty list or not a list).
    pub(crate) async fn ensure_candidates(
        &mut self,
        problem: &str,
        path: &ThoughtPath,
    ) -> Result<bool, SearchError> {
        if !self.cache.is_exhausted(path) {
            return Ok(true);
        }
        let ctx = PromptContext::new(problem, path).with_n(self.c);
        match self.oracle.propose_many(&ctx).await? {
            Proposal::List(items) if !items.is_empty() => {
                debug!(path_len = path.len(), proposed = items.len(), "proposal cache refilled");
                self.cache.refill(path.clone(), items);
                Ok(true)
            }
            Proposal::List(_) => {
                debug!(path_len = path.len(), "oracle proposed no thoughts");
                Ok(false)
            }
            Proposal::Text(text) => {
                warn!(path_len = path.len(), reply = %text, "proposal reply is not a list");
                Ok(false)
            }
        }
    }

    pub(crate) fn pop(&mut self, path: &ThoughtPath) -> Option<String> {
        self.cache.pop(path)
    }
}

#[async_trait]
impl ThoughtGenerator for ProposeStrategy {
    async fn next_thought(
        &mut self,
        problem: &str,
        path: &ThoughtPath,
    ) -> Result<String, SearchError> {
        if !self.ensure_candidates(problem, path).await? {
            return Ok(String::new());
        }
        Ok(self.pop(path).unwrap_or_default())
    }

    fn reset(&mut self) {
        self.cache.clear();
    }
}

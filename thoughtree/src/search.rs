//! The search loop.
//!
//! [`TreeOfThought::search`] runs at most `k` generate/check cycles:
//!
//! - empty candidate: counted as an invalid step, the checker is not called;
//! - `VALID_FINAL`: returns immediately with the candidate as the answer;
//! - `VALID_INTERMEDIATE`: stored, the next step is conditioned on the extended path;
//! - `INVALID`: path unchanged.
//!
//! After each step the [`SearchController`] may pop accepted thoughts. Running out of
//! budget yields [`SearchOutcome::Exhausted`]; oracle failures (after the retry policy)
//! propagate as errors. Progress is reported as [`SearchEvent`]s when a sender is set,
//! like a graph run streaming its events.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::checker::{Checker, LabelMatcher, OracleChecker};
use crate::config::SearchConfig;
use crate::controller::SearchController;
use crate::error::SearchError;
use crate::generation::ThoughtGenerator;
use crate::llm::LlmClient;
use crate::memory::SearchMemory;
use crate::oracle::{LlmGenerationOracle, LlmValidityOracle, OracleGuard};
use crate::thought::{Thought, ThoughtValidity};

/// Result text when the budget runs out.
pub const NO_SOLUTION: &str = "No solution found";

/// Terminal state of one search.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SearchOutcome {
    Solved { answer: String, steps: usize },
    Exhausted { steps: usize },
}

impl SearchOutcome {
    /// The final thought, or `None` when the search ran out of budget.
    pub fn answer(&self) -> Option<&str> {
        match self {
            Self::Solved { answer, .. } => Some(answer),
            Self::Exhausted { .. } => None,
        }
    }

    pub fn is_solved(&self) -> bool {
        matches!(self, Self::Solved { .. })
    }

    /// Steps consumed, including the final one.
    pub fn steps(&self) -> usize {
        match self {
            Self::Solved { steps, .. } | Self::Exhausted { steps } => *steps,
        }
    }
}

impl fmt::Display for SearchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Solved { answer, .. } => f.write_str(answer),
            Self::Exhausted { .. } => f.write_str(NO_SOLUTION),
        }
    }
}

/// Progress of a running search.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SearchEvent {
    Started {
        problem: String,
        k: usize,
    },
    /// One step: the candidate, the level it was generated at and its classification.
    Thought {
        step: usize,
        level: usize,
        text: String,
        validity: ThoughtValidity,
    },
    Backtracked {
        to_level: usize,
    },
    Finished {
        outcome: SearchOutcome,
    },
}

/// Tree-of-Thought driver: a generator, a checker and a controller under a step budget.
pub struct TreeOfThought {
    generator: Box<dyn ThoughtGenerator>,
    checker: Arc<dyn Checker>,
    controller: SearchController,
    k: usize,
    events: Option<mpsc::Sender<SearchEvent>>,
    cancel: CancellationToken,
}

impl TreeOfThought {
    pub fn new(generator: Box<dyn ThoughtGenerator>, checker: Arc<dyn Checker>, k: usize) -> Self {
        Self {
            generator,
            checker,
            controller: SearchController::DepthFirst,
            k,
            events: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Builds the configured strategy and checker over LLM-backed oracles. Every oracle
    /// call runs under the configured deadline and retry policy and stops retrying once
    /// [`cancellation_token`](Self::cancellation_token) is cancelled.
    pub fn from_config(config: &SearchConfig, llm: Arc<dyn LlmClient>) -> Result<Self, SearchError> {
        Self::from_config_with_matcher(config, llm, LabelMatcher::new())
    }

    /// Like [`from_config`](Self::from_config); `matcher` classifies validity replies that
    /// carry no keyword.
    pub fn from_config_with_matcher(
        config: &SearchConfig,
        llm: Arc<dyn LlmClient>,
        matcher: LabelMatcher,
    ) -> Result<Self, SearchError> {
        config.validate()?;
        let cancel = CancellationToken::new();
        let guard = OracleGuard::new(config.oracle_timeout(), config.retry_policy())
            .with_cancellation(cancel.child_token());

        let checker: Arc<dyn Checker> = Arc::new(
            OracleChecker::new(
                LlmValidityOracle::new(llm.clone(), config.language).with_guard(guard.clone()),
            )
            .with_matcher(matcher),
        );
        let oracle = Arc::new(LlmGenerationOracle::new(llm, config.language).with_guard(guard));
        let generator = config.strategy.build(oracle, checker.clone(), config.c);

        let controller = if config.backtracking {
            SearchController::Backtracking { c: config.c }
        } else {
            SearchController::DepthFirst
        };
        Ok(Self::new(generator, checker, config.k)
            .with_controller(controller)
            .with_cancellation(cancel))
    }

    pub fn with_controller(mut self, controller: SearchController) -> Self {
        self.controller = controller;
        self
    }

    /// Streams [`SearchEvent`]s to `tx`. A closed receiver does not stop the search.
    pub fn with_events(mut self, tx: mpsc::Sender<SearchEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Token checked between steps; cancel it to stop the search.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    async fn emit(&self, event: SearchEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event).await;
        }
    }

    /// Runs one search with a fresh memory and a reset generator, so nothing proposed for
    /// an earlier problem is handed out again.
    pub async fn search(&mut self, problem: &str) -> Result<SearchOutcome, SearchError> {
        let mut memory = SearchMemory::new();
        self.generator.reset();
        info!(k = self.k, controller = ?self.controller, "search started");
        self.emit(SearchEvent::Started {
            problem: problem.to_string(),
            k: self.k,
        })
        .await;

        for step in 1..=self.k {
            if self.cancel.is_cancelled() {
                info!(step, "search cancelled");
                return Err(SearchError::Cancelled);
            }

            let path = memory.current_path();
            let text = self.generator.next_thought(problem, &path).await?;
            let validity = if text.trim().is_empty() {
                debug!(step, level = memory.level(), "no candidate at this path");
                ThoughtValidity::Invalid
            } else {
                self.checker
                    .evaluate(problem, &path.extended(text.as_str()))
                    .await?
            };
            debug!(step, k = self.k, level = memory.level(), validity = %validity, "step");
            self.emit(SearchEvent::Thought {
                step,
                level: memory.level(),
                text: text.clone(),
                validity,
            })
            .await;

            match validity {
                ThoughtValidity::ValidFinal => {
                    let outcome = SearchOutcome::Solved {
                        answer: text,
                        steps: step,
                    };
                    info!(steps = step, "search solved");
                    self.emit(SearchEvent::Finished {
                        outcome: outcome.clone(),
                    })
                    .await;
                    return Ok(outcome);
                }
                ThoughtValidity::ValidIntermediate => memory.store(Thought::new(text, validity)),
                ThoughtValidity::Invalid => {}
            }

            if let Some(to_level) = self.controller.apply(&mut memory, validity) {
                debug!(
                    step,
                    to_level,
                    resume_from = memory.top().map(Thought::text).unwrap_or("<root>"),
                    "backtracked"
                );
                self.emit(SearchEvent::Backtracked { to_level }).await;
            }
        }

        let outcome = SearchOutcome::Exhausted { steps: self.k };
        info!(
            k = self.k,
            level = memory.level(),
            deepest = memory.top().map(Thought::text).unwrap_or("<root>"),
            "search exhausted"
        );
        self.emit(SearchEvent::Finished {
            outcome: outcome.clone(),
        })
        .await;
        Ok(outcome)
    }
}

/// Runs one search over `llm` with the strategy, language and resilience settings of
/// `config`.
pub async fn search(
    problem: &str,
    config: &SearchConfig,
    llm: Arc<dyn LlmClient>,
) -> Result<SearchOutcome, SearchError> {
    TreeOfThought::from_config(config, llm)?.search(problem).await
}

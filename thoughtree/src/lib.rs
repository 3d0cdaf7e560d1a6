//! # Thoughtree
//!
//! Bounded Tree-of-Thought search. A problem is solved by repeatedly asking a
//! **generation oracle** for the next candidate thought, asking a **validity oracle** to
//! classify it (`VALID_FINAL`, `VALID_INTERMEDIATE` or `INVALID`), and descending depth
//! first along accepted thoughts until a final thought appears or the step budget `k`
//! runs out.
//!
//! ## Features
//!
//! - **Strategies**: [`SampleStrategy`] (one thought per call), [`ProposeStrategy`] (`c`
//!   thoughts per call, served from a per-path [`GeneratorCache`]) and
//!   [`CheckedProposeStrategy`] (proposals screened by the checker).
//! - **Checker**: keyword parsing with a nearest-label fallback ([`OracleChecker`],
//!   [`LabelMatcher`]) that never fails on a drifting reply.
//! - **Controller**: as-is depth-first descent or opt-in backtracking ([`SearchController`]).
//! - **Resilience**: per-call deadline, bounded retry with backoff ([`OracleGuard`],
//!   [`RetryPolicy`]) and cancellation between steps.
//! - **LLM integration**: [`LlmClient`] with [`MockLlm`] and OpenAI-compatible [`ChatOpenAI`].
//! - **Events**: per-step [`SearchEvent`]s over an `mpsc` channel.
//!
//! ## Main modules
//!
//! - [`search`]: [`TreeOfThought`], [`SearchOutcome`], [`SearchEvent`], [`search()`](search::search).
//! - [`generation`]: [`ThoughtGenerator`], [`Strategy`].
//! - [`checker`]: [`Checker`], [`OracleChecker`], [`FnChecker`], embedders.
//! - [`oracle`]: [`GenerationOracle`], [`ValidityOracle`] and their LLM-backed versions.
//! - [`memory`] / [`controller`]: [`SearchMemory`], [`SearchController`].
//! - [`config`]: [`SearchConfig`] and `THOUGHTREE_*` environment overrides.
//! - [`prompt`]: English and Japanese templates ([`Language`]).

pub mod checker;
pub mod config;
pub mod controller;
pub mod error;
pub mod generation;
pub mod llm;
pub mod memory;
pub mod message;
pub mod oracle;
pub mod prompt;
pub mod search;
pub mod thought;

pub use checker::{
    cosine_similarity, Checker, Embedder, FnChecker, HashEmbedder, LabelMatcher, OpenAIEmbedder,
    OracleChecker,
};
pub use config::{ConfigError, SearchConfig};
pub use controller::SearchController;
pub use error::{OracleError, SearchError};
pub use generation::{
    CheckedProposeStrategy, GeneratorCache, ProposeStrategy, SampleStrategy, Strategy,
    ThoughtGenerator,
};
pub use llm::{ChatOpenAI, LlmClient, LlmResponse, LlmUsage, MockLlm};
pub use memory::SearchMemory;
pub use message::Message;
pub use oracle::{
    GenerationOracle, LlmGenerationOracle, LlmValidityOracle, OracleGuard, PromptContext,
    Proposal, RetryPolicy, ValidityOracle,
};
pub use prompt::Language;
pub use search::{search, SearchEvent, SearchOutcome, TreeOfThought, NO_SOLUTION};
pub use thought::{Thought, ThoughtPath, ThoughtValidity};

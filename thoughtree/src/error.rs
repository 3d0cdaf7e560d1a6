//! Search error types.
//!
//! `OracleError` is what the two external boundaries (generation and validity) can
//! fail with; `SearchError` is what `TreeOfThought::search` returns. Running out of
//! step budget is not an error: it is `SearchOutcome::Exhausted`.

use std::time::Duration;

use thiserror::Error;

use crate::config::ConfigError;

/// Failure of one oracle call (transport, parse, deadline).
#[derive(Debug, Error)]
pub enum OracleError {
    /// The underlying model call failed (HTTP error, empty choices, request build).
    #[error("llm call failed: {0}")]
    Llm(String),

    /// The call did not complete before its deadline.
    #[error("oracle call timed out after {0:?}")]
    Timeout(Duration),

    /// The search was cancelled while the call was waiting for a retry.
    #[error("oracle call cancelled")]
    Cancelled,
}

/// Search error.
///
/// Oracle outages propagate here unrecovered after the retry policy gives up.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("oracle failure: {0}")]
    Oracle(#[from] OracleError),

    #[error("invalid search config: {0}")]
    Config(#[from] ConfigError),

    /// The cancellation token fired between two steps.
    #[error("search cancelled")]
    Cancelled,
}

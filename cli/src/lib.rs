//! Library side of the `thoughtree` binary: runs one search with optional progress output
//! and maps the result to an exit code.

pub mod display;

use std::sync::Arc;

use thoughtree::{
    LabelMatcher, LlmClient, SearchConfig, SearchError, SearchOutcome, TreeOfThought,
};
use tokio::sync::mpsc;

/// Exit status when the budget ran out without a final thought.
pub const EXIT_EXHAUSTED: i32 = 2;

/// Options for one CLI run.
#[derive(Clone, Debug)]
pub struct RunOptions {
    pub problem: String,
    pub config: SearchConfig,
    /// Print every step to stderr.
    pub verbose: bool,
}

/// Runs one search over `llm`. Ctrl-C cancels the search between steps.
/// `matcher` classifies validity replies without a keyword.
pub async fn run_search(
    opts: &RunOptions,
    llm: Arc<dyn LlmClient>,
    matcher: LabelMatcher,
) -> Result<SearchOutcome, SearchError> {
    let mut tot = TreeOfThought::from_config_with_matcher(&opts.config, llm, matcher)?;
    let token = tot.cancellation_token();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    });

    let result = if opts.verbose {
        let (tx, mut rx) = mpsc::channel(64);
        let printer = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                eprintln!("{}", display::format_event(&event));
            }
        });
        let mut tot = tot.with_events(tx);
        let result = tot.search(&opts.problem).await;
        drop(tot);
        let _ = printer.await;
        result
    } else {
        tot.search(&opts.problem).await
    };

    interrupt.abort();
    result
}

/// 0 solved, 2 exhausted, 1 error.
pub fn exit_code(result: &Result<SearchOutcome, SearchError>) -> i32 {
    match result {
        Ok(SearchOutcome::Solved { .. }) => 0,
        Ok(SearchOutcome::Exhausted { .. }) => EXIT_EXHAUSTED,
        Err(_) => 1,
    }
}

//! Search loop properties and end-to-end scenarios with deterministic stubs.
//!
//! Run: `cargo test -p thoughtree --test search_loop -- --nocapture`


use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use thoughtree::{
    Checker, FnChecker, SearchController, SearchError, SearchEvent, SearchOutcome,
    ThoughtGenerator, ThoughtPath, ThoughtValidity, TreeOfThought, NO_SOLUTION,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

const PUZZLE: &str = "3,*,*,2|1,*,3,*|*,1,*,3|4,*,*,1";
const SOLUTION: &str = "3,4,1,2|1,2,3,4|2,1,4,3|4,3,2,1";

/// Fills the first blank cell of the latest grid, optionally guessing wrong on every
/// other call. Records every path it is asked to extend.
struct SudokuStub {
    calls: usize,
    blunder_every_other: bool,
    paths: Arc<Mutex<Vec<ThoughtPath>>>,
}

impl SudokuStub {
    fn new(blunder_every_other: bool) -> (Self, Arc<Mutex<Vec<ThoughtPath>>>) {
        let paths = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                calls: 0,
                blunder_every_other,
                paths: paths.clone(),
            },
            paths,
        )
    }
}

#[async_trait]
impl ThoughtGenerator for SudokuStub {
    async fn next_thought(
        &mut self,
        _problem: &str,
        path: &ThoughtPath,
    ) -> Result<String, SearchError> {
        self.paths.lock().unwrap().push(path.clone());
        self.calls += 1;
        let grid = path.last().unwrap_or(PUZZLE);
        let blank = match grid.find('*') {
            Some(i) => i,
            None => return Ok(grid.to_string()),
        };
        let right = &SOLUTION[blank..blank + 1];
        let cell = if self.blunder_every_other && self.calls % 2 == 1 {
            if right == "1" { "2" } else { "1" }
        } else {
            right
        };
        let mut next = grid.to_string();
        next.replace_range(blank..blank + 1, cell);
        Ok(next)
    }
}

/// Exact comparison against the known solution; partial grids must agree on every
/// filled cell.
fn sudoku_checker() -> Arc<dyn Checker> {
    Arc::new(FnChecker::new(|_p: &str, path: &ThoughtPath| {
        let grid = path.last().unwrap_or("");
        if grid == SOLUTION {
            return ThoughtValidity::ValidFinal;
        }
        let consistent = grid.len() == SOLUTION.len()
            && grid
                .chars()
                .zip(SOLUTION.chars())
                .all(|(g, s)| g == '*' || g == s);
        if consistent {
            ThoughtValidity::ValidIntermediate
        } else {
            ThoughtValidity::Invalid
        }
    }))
}

struct Constant {
    text: &'static str,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl ThoughtGenerator for Constant {
    async fn next_thought(
        &mut self,
        _problem: &str,
        _path: &ThoughtPath,
    ) -> Result<String, SearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.text.to_string())
    }
}

fn constant(text: &'static str) -> (Box<dyn ThoughtGenerator>, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    (
        Box::new(Constant {
            text,
            calls: calls.clone(),
        }),
        calls,
    )
}

fn counting_checker(v: ThoughtValidity) -> (Arc<dyn Checker>, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = calls.clone();
    let checker = FnChecker::new(move |_p: &str, _path: &ThoughtPath| {
        seen.fetch_add(1, Ordering::SeqCst);
        v
    });
    (Arc::new(checker), calls)
}

async fn collect(mut rx: mpsc::Receiver<SearchEvent>) -> Vec<SearchEvent> {
    let mut events = Vec::new();
    while let Some(e) = rx.recv().await {
        events.push(e);
    }
    events
}

/// **Scenario A**: a stub converging on the unique solution is accepted cell by cell and
/// the loop stops on the final grid.
#[tokio::test]
async fn scenario_a_sudoku_converges() {
    let (gen, _) = SudokuStub::new(false);
    let mut tot = TreeOfThought::new(Box::new(gen), sudoku_checker(), 30);
    let outcome = tot.search(PUZZLE).await.unwrap();
    assert_eq!(
        outcome,
        SearchOutcome::Solved {
            answer: SOLUTION.to_string(),
            steps: 8
        }
    );
}

#[tokio::test]
async fn scenario_a_with_rejected_guesses() {
    let (gen, paths) = SudokuStub::new(true);
    let mut tot = TreeOfThought::new(Box::new(gen), sudoku_checker(), 30);
    let outcome = tot.search(PUZZLE).await.unwrap();
    assert_eq!(outcome.answer(), Some(SOLUTION));
    assert_eq!(outcome.steps(), 16);
    // every wrong guess leaves the path unchanged
    let paths = paths.lock().unwrap();
    for pair in paths.chunks(2) {
        assert_eq!(pair[0], pair[1]);
    }
}

/// **Scenario B**: an always-empty generator exhausts the budget without ever calling
/// the checker.
#[tokio::test]
async fn scenario_b_empty_generator_exhausts() {
    let (gen, gen_calls) = constant("");
    let (checker, checks) = counting_checker(ThoughtValidity::ValidFinal);
    let mut tot = TreeOfThought::new(gen, checker, 7);
    let outcome = tot.search("anything").await.unwrap();
    assert_eq!(outcome, SearchOutcome::Exhausted { steps: 7 });
    assert_eq!(outcome.to_string(), NO_SOLUTION);
    assert_eq!(gen_calls.load(Ordering::SeqCst), 7);
    assert_eq!(checks.load(Ordering::SeqCst), 0);
}

/// **Scenario C**: an always-invalid checker never stores a thought.
#[tokio::test]
async fn scenario_c_invalid_checker_stays_at_root() {
    let (gen, _) = constant("guess");
    let (checker, checks) = counting_checker(ThoughtValidity::Invalid);
    let (tx, rx) = mpsc::channel(64);
    let mut tot = TreeOfThought::new(gen, checker, 5).with_events(tx);
    let outcome = tot.search("p").await.unwrap();
    drop(tot);

    assert_eq!(outcome, SearchOutcome::Exhausted { steps: 5 });
    assert_eq!(checks.load(Ordering::SeqCst), 5);
    let levels: Vec<usize> = collect(rx)
        .await
        .into_iter()
        .filter_map(|e| match e {
            SearchEvent::Thought { level, .. } => Some(level),
            _ => None,
        })
        .collect();
    assert_eq!(levels, vec![0; 5]);
}

#[tokio::test]
async fn zero_budget_returns_without_calls() {
    let (gen, gen_calls) = constant("x");
    let (checker, checks) = counting_checker(ThoughtValidity::ValidFinal);
    let mut tot = TreeOfThought::new(gen, checker, 0);
    assert_eq!(
        tot.search("p").await.unwrap(),
        SearchOutcome::Exhausted { steps: 0 }
    );
    assert_eq!(gen_calls.load(Ordering::SeqCst), 0);
    assert_eq!(checks.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn first_final_thought_exits_early() {
    let (gen, gen_calls) = constant("done");
    let (checker, checks) = counting_checker(ThoughtValidity::ValidFinal);
    let mut tot = TreeOfThought::new(gen, checker, 10);
    let outcome = tot.search("p").await.unwrap();
    assert_eq!(
        outcome,
        SearchOutcome::Solved {
            answer: "done".into(),
            steps: 1
        }
    );
    assert_eq!(gen_calls.load(Ordering::SeqCst), 1);
    assert_eq!(checks.load(Ordering::SeqCst), 1);
}

/// Numbers its thoughts `t0, t1, ...` and records the path of each call.
struct Numbered {
    n: usize,
    paths: Arc<Mutex<Vec<ThoughtPath>>>,
}

#[async_trait]
impl ThoughtGenerator for Numbered {
    async fn next_thought(
        &mut self,
        _problem: &str,
        path: &ThoughtPath,
    ) -> Result<String, SearchError> {
        self.paths.lock().unwrap().push(path.clone());
        let t = format!("t{}", self.n);
        self.n += 1;
        Ok(t)
    }
}

/// Path for step n+1 is step n's path extended by t_n exactly when t_n was intermediate.
#[tokio::test]
async fn path_extends_only_on_intermediate() {
    let paths = Arc::new(Mutex::new(Vec::new()));
    let gen = Numbered {
        n: 0,
        paths: paths.clone(),
    };
    let every_third_invalid = |_p: &str, path: &ThoughtPath| {
        let n: usize = path.last().unwrap_or("t0")[1..].parse().unwrap_or(0);
        if n % 3 == 0 {
            ThoughtValidity::Invalid
        } else {
            ThoughtValidity::ValidIntermediate
        }
    };
    let (tx, rx) = mpsc::channel(64);
    let mut tot = TreeOfThought::new(Box::new(gen), Arc::new(FnChecker::new(every_third_invalid)), 9)
        .with_events(tx);
    tot.search("p").await.unwrap();
    drop(tot);

    let steps: Vec<(String, ThoughtValidity)> = collect(rx)
        .await
        .into_iter()
        .filter_map(|e| match e {
            SearchEvent::Thought { text, validity, .. } => Some((text, validity)),
            _ => None,
        })
        .collect();
    let paths = paths.lock().unwrap();
    assert_eq!(paths.len(), 9);
    for n in 0..8 {
        let (text, validity) = &steps[n];
        let expected = if *validity == ThoughtValidity::ValidIntermediate {
            paths[n].extended(text.as_str())
        } else {
            paths[n].clone()
        };
        assert_eq!(paths[n + 1], expected, "step {}", n);
    }
    assert_eq!(paths[8].len(), 5);
}

/// Walks into a dead end first: "bad" is accepted but nothing after it is.
struct DeadEnd {
    root_calls: usize,
}

#[async_trait]
impl ThoughtGenerator for DeadEnd {
    async fn next_thought(
        &mut self,
        _problem: &str,
        path: &ThoughtPath,
    ) -> Result<String, SearchError> {
        let t = match path.last() {
            None => {
                self.root_calls += 1;
                if self.root_calls == 1 { "bad" } else { "good" }
            }
            Some("good") => "done",
            Some(_) => "stuck",
        };
        Ok(t.to_string())
    }
}

fn dead_end_checker() -> Arc<dyn Checker> {
    Arc::new(FnChecker::new(|_p: &str, path: &ThoughtPath| match path.last() {
        Some("bad") | Some("good") => ThoughtValidity::ValidIntermediate,
        Some("done") => ThoughtValidity::ValidFinal,
        _ => ThoughtValidity::Invalid,
    }))
}

#[tokio::test]
async fn depth_first_stays_in_dead_branch() {
    let mut tot = TreeOfThought::new(Box::new(DeadEnd { root_calls: 0 }), dead_end_checker(), 10);
    assert_eq!(
        tot.search("p").await.unwrap(),
        SearchOutcome::Exhausted { steps: 10 }
    );
}

#[tokio::test]
async fn backtracking_leaves_dead_branch() {
    let (tx, rx) = mpsc::channel(64);
    let mut tot = TreeOfThought::new(Box::new(DeadEnd { root_calls: 0 }), dead_end_checker(), 10)
        .with_controller(SearchController::Backtracking { c: 2 })
        .with_events(tx);
    let outcome = tot.search("p").await.unwrap();
    drop(tot);

    assert_eq!(
        outcome,
        SearchOutcome::Solved {
            answer: "done".into(),
            steps: 5
        }
    );
    let backtracks: Vec<usize> = collect(rx)
        .await
        .into_iter()
        .filter_map(|e| match e {
            SearchEvent::Backtracked { to_level } => Some(to_level),
            _ => None,
        })
        .collect();
    assert_eq!(backtracks, vec![0]);
}

#[tokio::test]
async fn cancellation_is_checked_between_steps() {
    let token = CancellationToken::new();
    let trigger = token.clone();
    let checks = Arc::new(AtomicUsize::new(0));
    let seen = checks.clone();
    let checker = FnChecker::new(move |_p: &str, _path: &ThoughtPath| {
        if seen.fetch_add(1, Ordering::SeqCst) + 1 == 3 {
            trigger.cancel();
        }
        ThoughtValidity::Invalid
    });
    let (gen, gen_calls) = constant("x");
    let mut tot = TreeOfThought::new(gen, Arc::new(checker), 100).with_cancellation(token);

    assert!(matches!(tot.search("p").await, Err(SearchError::Cancelled)));
    assert_eq!(gen_calls.load(Ordering::SeqCst), 3);
    assert_eq!(checks.load(Ordering::SeqCst), 3);
}

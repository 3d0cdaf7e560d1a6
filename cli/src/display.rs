//! One-line renderings of search events for `--verbose`.

use thoughtree::{SearchEvent, SearchOutcome};

const MAX_THOUGHT_CHARS: usize = 160;

/// Collapses whitespace and truncates long thoughts with `...`.
fn one_line(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= MAX_THOUGHT_CHARS {
        return flat;
    }
    let cut: String = flat.chars().take(MAX_THOUGHT_CHARS).collect();
    format!("{}...", cut)
}

pub fn format_event(event: &SearchEvent) -> String {
    match event {
        SearchEvent::Started { k, .. } => format!("searching (k = {})", k),
        SearchEvent::Thought {
            step,
            level,
            text,
            validity,
        } => {
            if text.trim().is_empty() {
                format!("[{:>3}] level {} {}: (no candidate)", step, level, validity)
            } else {
                format!("[{:>3}] level {} {}: {}", step, level, validity, one_line(text))
            }
        }
        SearchEvent::Backtracked { to_level } => format!("      backtracked to level {}", to_level),
        SearchEvent::Finished { outcome } => match outcome {
            SearchOutcome::Solved { steps, .. } => format!("solved in {} steps", steps),
            SearchOutcome::Exhausted { steps } => format!("no solution after {} steps", steps),
        },
    }
}

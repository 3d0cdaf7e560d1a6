//! Search memory: the stack of accepted intermediate thoughts.
//!
//! Every node remembers how many children were stored beneath it and how many
//! consecutive invalid candidates were produced at its path. The root (empty path) is
//! implicit and carries the same counters.

use crate::thought::{Thought, ThoughtPath};

#[derive(Clone, Debug, Default)]
struct Counters {
    children: usize,
    invalid_streak: usize,
}

#[derive(Clone, Debug)]
struct Node {
    thought: Thought,
    counters: Counters,
}

/// DFS stack owned by one search invocation.
#[derive(Clone, Debug, Default)]
pub struct SearchMemory {
    stack: Vec<Node>,
    root: Counters,
}

impl SearchMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of accepted thoughts on the active path.
    pub fn level(&self) -> usize {
        self.stack.len()
    }

    /// Pushes an accepted thought, counting it as a child of the current top.
    pub fn store(&mut self, thought: Thought) {
        let parent = self.top_counters_mut();
        parent.children += 1;
        parent.invalid_streak = 0;
        self.stack.push(Node {
            thought,
            counters: Counters::default(),
        });
    }

    /// Newest accepted thought; `None` at the root.
    pub fn top(&self) -> Option<&Thought> {
        self.stack.last().map(|n| &n.thought)
    }

    /// Children stored under the current top (the root when the stack is empty).
    pub fn children(&self) -> usize {
        self.stack
            .last()
            .map_or(self.root.children, |n| n.counters.children)
    }

    /// Children stored under the top's parent; `None` below level 2.
    pub fn parent_children(&self) -> Option<usize> {
        self.stack
            .len()
            .checked_sub(2)
            .map(|i| self.stack[i].counters.children)
    }

    /// Records an invalid candidate at the current path and returns the streak length.
    pub fn note_invalid(&mut self) -> usize {
        let top = self.top_counters_mut();
        top.invalid_streak += 1;
        top.invalid_streak
    }

    /// Removes up to `n` thoughts from the top and returns how many were removed. The
    /// node that becomes the new top starts a fresh invalid streak.
    pub fn pop(&mut self, n: usize) -> usize {
        let n = n.min(self.stack.len());
        self.stack.truncate(self.stack.len() - n);
        if n > 0 {
            self.top_counters_mut().invalid_streak = 0;
        }
        n
    }

    /// Texts of the active path, root first.
    pub fn current_path(&self) -> ThoughtPath {
        self.stack.iter().map(|n| n.thought.text().to_string()).collect()
    }

    fn top_counters_mut(&mut self) -> &mut Counters {
        match self.stack.last_mut() {
            Some(node) => &mut node.counters,
            None => &mut self.root,
        }
    }
}

//! Search controller: decides which path conditions the next generation call.

use serde::{Deserialize, Serialize};

use crate::memory::SearchMemory;
use crate::thought::ThoughtValidity;

/// Backtracking policy applied after every step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "policy")]
pub enum SearchController {
    /// Pure depth-first descent; accepted thoughts are never abandoned.
    #[default]
    DepthFirst,
    /// Leaves a branch once `c` siblings were accepted under the parent, or once `c`
    /// consecutive invalid candidates were produced at the current path.
    Backtracking { c: usize },
}

impl SearchController {
    /// Applies the policy to `memory` after a step classified as `validity`. Returns the
    /// new level when thoughts were popped.
    pub fn apply(&self, memory: &mut SearchMemory, validity: ThoughtValidity) -> Option<usize> {
        let c = match *self {
            Self::DepthFirst => {
                if validity == ThoughtValidity::Invalid {
                    memory.note_invalid();
                }
                return None;
            }
            Self::Backtracking { c } => c.max(1),
        };
        let popped = match validity {
            ThoughtValidity::ValidFinal => 0,
            ThoughtValidity::ValidIntermediate => match memory.parent_children() {
                Some(siblings) if siblings >= c => memory.pop(2),
                _ => 0,
            },
            ThoughtValidity::Invalid => {
                if memory.note_invalid() >= c {
                    memory.pop(1)
                } else {
                    0
                }
            }
        };
        (popped > 0).then(|| memory.level())
    }
}

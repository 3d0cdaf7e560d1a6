//! Thought data model: [`ThoughtValidity`], [`Thought`], [`ThoughtPath`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Three-way classification of a candidate thought.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ThoughtValidity {
    /// The thought solves the problem.
    ValidFinal,
    /// Valid partial progress; the search continues beneath it.
    ValidIntermediate,
    /// Contradicts the problem or earlier thoughts.
    Invalid,
}

impl ThoughtValidity {
    /// All classes in keyword-matching order.
    pub const ALL: [ThoughtValidity; 3] = [
        ThoughtValidity::ValidFinal,
        ThoughtValidity::ValidIntermediate,
        ThoughtValidity::Invalid,
    ];

    /// Keyword the validity oracle is asked to answer with.
    pub fn as_label(self) -> &'static str {
        match self {
            Self::ValidFinal => "VALID_FINAL",
            Self::ValidIntermediate => "VALID_INTERMEDIATE",
            Self::Invalid => "INVALID",
        }
    }

    pub fn is_valid(self) -> bool {
        !matches!(self, Self::Invalid)
    }
}

impl fmt::Display for ThoughtValidity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

impl FromStr for ThoughtValidity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "VALID_FINAL" => Ok(Self::ValidFinal),
            "VALID_INTERMEDIATE" => Ok(Self::ValidIntermediate),
            "INVALID" => Ok(Self::Invalid),
            _ => Err(format!(
                "unknown validity: {} (use VALID_FINAL, VALID_INTERMEDIATE or INVALID)",
                s
            )),
        }
    }
}

/// One generated candidate step and its classification. Immutable once created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thought {
    text: String,
    validity: ThoughtValidity,
}

impl Thought {
    pub fn new(text: impl Into<String>, validity: ThoughtValidity) -> Self {
        Self {
            text: text.into(),
            validity,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn validity(&self) -> ThoughtValidity {
        self.validity
    }
}

/// Ordered sequence of accepted thought texts that conditions the next generation call.
///
/// Never contains an invalid thought: only [`SearchMemory`](crate::SearchMemory) and
/// [`ThoughtPath::extended`] build paths, and both are fed accepted thoughts only.
/// Hashable so it can key the proposal cache.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThoughtPath(Vec<String>);

impl ThoughtPath {
    /// The empty path (search root).
    pub fn root() -> Self {
        Self::default()
    }

    /// Returns a new path with `text` appended; `self` is left untouched.
    pub fn extended(&self, text: impl Into<String>) -> Self {
        let mut next = self.0.clone();
        next.push(text.into());
        Self(next)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for ThoughtPath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

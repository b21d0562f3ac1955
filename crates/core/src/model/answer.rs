use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::model::ids::QuestionId;

/// An answer value: one option index, or a collection of option indices.
///
/// On the wire and in storage this is either a bare integer or a list of
/// integers, so the same field carries both shapes:
///
/// ```
/// use quiz_core::model::Answer;
/// let single: Answer = serde_json::from_str("1").unwrap();
/// let multi: Answer = serde_json::from_str("[0, 2]").unwrap();
/// assert_eq!(single, Answer::Single(1));
/// assert_eq!(multi, Answer::Multiple(vec![0, 2]));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Single(i64),
    Multiple(Vec<i64>),
}

impl Answer {
    /// Indices as a set; a scalar becomes a one-element set.
    #[must_use]
    pub fn index_set(&self) -> BTreeSet<i64> {
        match self {
            Answer::Single(index) => BTreeSet::from([*index]),
            Answer::Multiple(indices) => indices.iter().copied().collect(),
        }
    }
}

impl From<i64> for Answer {
    fn from(index: i64) -> Self {
        Answer::Single(index)
    }
}

impl From<Vec<i64>> for Answer {
    fn from(indices: Vec<i64>) -> Self {
        Answer::Multiple(indices)
    }
}

/// Submitted or in-progress answers keyed by question.
pub type AnswerSheet = BTreeMap<QuestionId, Answer>;

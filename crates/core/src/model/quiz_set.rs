use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::QuizSetId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizSetError {
    #[error("quiz set title cannot be empty")]
    EmptyTitle,

    #[error("quiz set category cannot be empty")]
    EmptyCategory,

    #[error("invalid difficulty: {0}")]
    InvalidDifficulty(String),
}

//
// ─── DIFFICULTY ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = QuizSetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(QuizSetError::InvalidDifficulty(other.to_owned())),
        }
    }
}

//
// ─── QUIZ SET ──────────────────────────────────────────────────────────────────
//

/// A named collection of questions sharing a category and difficulty.
///
/// `total_questions` is a denormalized counter kept in step with the owned
/// questions by the storage layer; it is never derived here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizSet {
    pub id: QuizSetId,
    pub title: String,
    pub description: String,
    pub category: String,
    pub difficulty: Difficulty,
    /// Estimated duration in minutes.
    pub estimated_time: u32,
    pub total_questions: u32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Fields supplied when creating a quiz set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewQuizSet {
    pub title: String,
    pub description: String,
    pub category: String,
    pub difficulty: Difficulty,
    pub estimated_time: u32,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl QuizSet {
    /// Build a fresh quiz set with zero questions.
    ///
    /// # Errors
    ///
    /// Returns `QuizSetError` if the title or category is blank.
    pub fn new(id: QuizSetId, draft: NewQuizSet, now: DateTime<Utc>) -> Result<Self, QuizSetError> {
        let quiz_set = Self {
            id,
            title: draft.title,
            description: draft.description,
            category: draft.category,
            difficulty: draft.difficulty,
            estimated_time: draft.estimated_time,
            total_questions: 0,
            is_active: draft.is_active,
            created_at: now,
            updated_at: None,
        };
        quiz_set.validate()?;
        Ok(quiz_set)
    }

    fn validate(&self) -> Result<(), QuizSetError> {
        if self.title.trim().is_empty() {
            return Err(QuizSetError::EmptyTitle);
        }
        if self.category.trim().is_empty() {
            return Err(QuizSetError::EmptyCategory);
        }
        Ok(())
    }
}

//
// ─── PATCH ─────────────────────────────────────────────────────────────────────
//

/// Partial update: only the fields that are `Some` are written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuizSetPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub estimated_time: Option<u32>,
    pub is_active: Option<bool>,
}

impl QuizSetPatch {
    /// Merge the set fields into `quiz_set` and stamp `updated_at`.
    ///
    /// The target is left untouched when the merged result fails validation.
    ///
    /// # Errors
    ///
    /// Returns `QuizSetError` if the merged quiz set is invalid.
    pub fn apply(self, quiz_set: &mut QuizSet, now: DateTime<Utc>) -> Result<(), QuizSetError> {
        let mut merged = quiz_set.clone();
        if let Some(title) = self.title {
            merged.title = title;
        }
        if let Some(description) = self.description {
            merged.description = description;
        }
        if let Some(category) = self.category {
            merged.category = category;
        }
        if let Some(difficulty) = self.difficulty {
            merged.difficulty = difficulty;
        }
        if let Some(estimated_time) = self.estimated_time {
            merged.estimated_time = estimated_time;
        }
        if let Some(is_active) = self.is_active {
            merged.is_active = is_active;
        }
        merged.validate()?;
        merged.updated_at = Some(now);
        *quiz_set = merged;
        Ok(())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn draft(title: &str) -> NewQuizSet {
        NewQuizSet {
            title: title.to_owned(),
            description: "desc".to_owned(),
            category: "MuleSoft".to_owned(),
            difficulty: Difficulty::Easy,
            estimated_time: 10,
            is_active: true,
        }
    }

    #[test]
    fn new_quiz_set_starts_empty() {
        let qs = QuizSet::new(QuizSetId::generate(), draft("T"), fixed_now()).unwrap();
        assert_eq!(qs.total_questions, 0);
        assert!(qs.is_active);
        assert!(qs.updated_at.is_none());
    }

    #[test]
    fn blank_title_is_rejected() {
        let err = QuizSet::new(QuizSetId::generate(), draft("  "), fixed_now()).unwrap_err();
        assert_eq!(err, QuizSetError::EmptyTitle);
    }

    #[test]
    fn patch_only_touches_set_fields() {
        let mut qs = QuizSet::new(QuizSetId::generate(), draft("T"), fixed_now()).unwrap();
        let patch = QuizSetPatch {
            title: Some("Renamed".into()),
            difficulty: Some(Difficulty::Hard),
            ..QuizSetPatch::default()
        };
        patch.apply(&mut qs, fixed_now()).unwrap();
        assert_eq!(qs.title, "Renamed");
        assert_eq!(qs.difficulty, Difficulty::Hard);
        assert_eq!(qs.category, "MuleSoft");
        assert_eq!(qs.estimated_time, 10);
        assert_eq!(qs.updated_at, Some(fixed_now()));
    }

    #[test]
    fn invalid_patch_leaves_target_untouched() {
        let mut qs = QuizSet::new(QuizSetId::generate(), draft("T"), fixed_now()).unwrap();
        let before = qs.clone();
        let patch = QuizSetPatch {
            category: Some(String::new()),
            ..QuizSetPatch::default()
        };
        assert_eq!(patch.apply(&mut qs, fixed_now()), Err(QuizSetError::EmptyCategory));
        assert_eq!(qs, before);
    }

    #[test]
    fn difficulty_parses_lowercase_names() {
        assert_eq!("hard".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert!("extreme".parse::<Difficulty>().is_err());
    }
}

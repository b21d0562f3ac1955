use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::answer::Answer;
use crate::model::ids::{QuestionId, QuizSetId};
use crate::model::quiz_set::Difficulty;

const DEFAULT_TIME_LIMIT_SECS: u32 = 120;
const DEFAULT_POINTS: u32 = 10;
const DEFAULT_REVIEW_STATUS: &str = "pending";

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text cannot be empty")]
    EmptyPrompt,

    #[error("question must have at least one option")]
    NoOptions,

    #[error("correct answer shape does not match question type {kind}")]
    ShapeMismatch { kind: &'static str },

    #[error("multi-select question needs at least one correct option")]
    EmptyCorrectSet,

    #[error("correct answer index {index} is outside 0..{options}")]
    IndexOutOfRange { index: i64, options: usize },

    #[error("invalid question type: {0}")]
    InvalidKind(String),
}

//
// ─── QUESTION KIND ─────────────────────────────────────────────────────────────
//

/// Selection mode. Wire names follow the form controls that render them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestionKind {
    #[serde(rename = "radio", alias = "single")]
    Single,
    #[serde(rename = "checkbox", alias = "multi")]
    Multiple,
}

impl QuestionKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            QuestionKind::Single => "radio",
            QuestionKind::Multiple => "checkbox",
        }
    }

    /// Parses the storage representation.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::InvalidKind` for unknown names.
    pub fn parse(s: &str) -> Result<Self, QuestionError> {
        match s {
            "radio" | "single" => Ok(QuestionKind::Single),
            "checkbox" | "multi" => Ok(QuestionKind::Multiple),
            other => Err(QuestionError::InvalidKind(other.to_owned())),
        }
    }
}

//
// ─── RESOURCES ─────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceLink {
    pub title: String,
    pub url: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoResource {
    pub title: String,
    pub url: String,
    pub description: String,
    pub duration: String,
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A question owned by exactly one quiz set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub quiz_set_id: QuizSetId,
    #[serde(rename = "question")]
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_answer: Answer,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    pub justification: String,
    pub difficulty: Difficulty,
    pub category: Option<String>,
    pub tags: Vec<String>,
    /// Seconds.
    pub time_limit: u32,
    pub points: u32,
    pub explanation: Option<String>,
    pub hints: Vec<String>,
    pub screenshots: Vec<String>,
    pub reference_links: Vec<ReferenceLink>,
    pub videos: Vec<VideoResource>,
    pub review_status: String,
    pub difficulty_rating: Option<f64>,
    pub success_rate: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub last_updated: Option<DateTime<Utc>>,
}

/// Fields supplied when creating a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: Answer,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    pub justification: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_time_limit")]
    pub time_limit: u32,
    #[serde(default = "default_points")]
    pub points: u32,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub hints: Vec<String>,
    #[serde(default)]
    pub screenshots: Vec<String>,
    #[serde(default)]
    pub reference_links: Vec<ReferenceLink>,
    #[serde(default)]
    pub videos: Vec<VideoResource>,
}

fn default_time_limit() -> u32 {
    DEFAULT_TIME_LIMIT_SECS
}

fn default_points() -> u32 {
    DEFAULT_POINTS
}

impl NewQuestion {
    /// Minimal draft with metadata defaults; handy for seeding and tests.
    #[must_use]
    pub fn basic(
        question: impl Into<String>,
        options: Vec<String>,
        correct_answer: Answer,
        kind: QuestionKind,
    ) -> Self {
        Self {
            question: question.into(),
            options,
            correct_answer,
            kind,
            justification: String::new(),
            difficulty: Difficulty::default(),
            category: None,
            tags: Vec::new(),
            time_limit: DEFAULT_TIME_LIMIT_SECS,
            points: DEFAULT_POINTS,
            explanation: None,
            hints: Vec::new(),
            screenshots: Vec::new(),
            reference_links: Vec::new(),
            videos: Vec::new(),
        }
    }
}

impl Question {
    /// Build a validated question for `quiz_set_id`.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the correct answer does not fit the options
    /// or the question type.
    pub fn new(
        id: QuestionId,
        quiz_set_id: QuizSetId,
        draft: NewQuestion,
        now: DateTime<Utc>,
    ) -> Result<Self, QuestionError> {
        let question = Self {
            id,
            quiz_set_id,
            prompt: draft.question,
            options: draft.options,
            correct_answer: draft.correct_answer,
            kind: draft.kind,
            justification: draft.justification,
            difficulty: draft.difficulty,
            category: draft.category,
            tags: draft.tags,
            time_limit: draft.time_limit,
            points: draft.points,
            explanation: draft.explanation,
            hints: draft.hints,
            screenshots: draft.screenshots,
            reference_links: draft.reference_links,
            videos: draft.videos,
            review_status: DEFAULT_REVIEW_STATUS.to_owned(),
            difficulty_rating: None,
            success_rate: None,
            created_at: now,
            updated_at: None,
            last_updated: None,
        };
        question.validate()?;
        Ok(question)
    }

    /// Check the correct-answer shape against the type tag and option bounds.
    ///
    /// # Errors
    ///
    /// Returns the first violated rule as a `QuestionError`.
    pub fn validate(&self) -> Result<(), QuestionError> {
        if self.prompt.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }
        if self.options.is_empty() {
            return Err(QuestionError::NoOptions);
        }

        let indices = match (self.kind, &self.correct_answer) {
            (QuestionKind::Single, Answer::Single(index)) => vec![*index],
            (QuestionKind::Multiple, Answer::Multiple(indices)) => {
                if indices.is_empty() {
                    return Err(QuestionError::EmptyCorrectSet);
                }
                indices.clone()
            }
            (kind, _) => {
                return Err(QuestionError::ShapeMismatch {
                    kind: kind.as_str(),
                });
            }
        };

        let options = self.options.len();
        for index in indices {
            let in_range = usize::try_from(index).is_ok_and(|i| i < options);
            if !in_range {
                return Err(QuestionError::IndexOutOfRange { index, options });
            }
        }
        Ok(())
    }
}

//
// ─── PATCH ─────────────────────────────────────────────────────────────────────
//

/// Partial update for a question; `None` fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestionPatch {
    pub question: Option<String>,
    pub options: Option<Vec<String>>,
    pub correct_answer: Option<Answer>,
    #[serde(rename = "type")]
    pub kind: Option<QuestionKind>,
    pub justification: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub time_limit: Option<u32>,
    pub points: Option<u32>,
    pub explanation: Option<String>,
    pub hints: Option<Vec<String>>,
    pub screenshots: Option<Vec<String>>,
    pub reference_links: Option<Vec<ReferenceLink>>,
    pub videos: Option<Vec<VideoResource>>,
}

impl QuestionPatch {
    /// Merge into `question`, re-validate, and stamp `updated_at`/`last_updated`.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the merged question is invalid; `question`
    /// is unchanged in that case.
    pub fn apply(self, question: &mut Question, now: DateTime<Utc>) -> Result<(), QuestionError> {
        let mut merged = question.clone();
        if let Some(prompt) = self.question {
            merged.prompt = prompt;
        }
        if let Some(options) = self.options {
            merged.options = options;
        }
        if let Some(correct_answer) = self.correct_answer {
            merged.correct_answer = correct_answer;
        }
        if let Some(kind) = self.kind {
            merged.kind = kind;
        }
        if let Some(justification) = self.justification {
            merged.justification = justification;
        }
        if let Some(difficulty) = self.difficulty {
            merged.difficulty = difficulty;
        }
        if let Some(category) = self.category {
            merged.category = Some(category);
        }
        if let Some(tags) = self.tags {
            merged.tags = tags;
        }
        if let Some(time_limit) = self.time_limit {
            merged.time_limit = time_limit;
        }
        if let Some(points) = self.points {
            merged.points = points;
        }
        if let Some(explanation) = self.explanation {
            merged.explanation = Some(explanation);
        }
        if let Some(hints) = self.hints {
            merged.hints = hints;
        }
        if let Some(screenshots) = self.screenshots {
            merged.screenshots = screenshots;
        }
        if let Some(reference_links) = self.reference_links {
            merged.reference_links = reference_links;
        }
        if let Some(videos) = self.videos {
            merged.videos = videos;
        }

        merged.validate()?;
        merged.updated_at = Some(now);
        merged.last_updated = Some(now);
        *question = merged;
        Ok(())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

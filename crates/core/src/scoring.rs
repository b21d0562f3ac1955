//! Answer matching and score computation.
//!
//! Everything here is pure: the caller fetches the questions, hands over the
//! submitted sheet, and persists whatever comes back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    Answer, AnswerSheet, AttemptId, DetailedResult, Question, QuizAttempt, QuizSetId, UserId,
};

/// Outcome of scoring one submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scorecard {
    pub score: f64,
    pub correct_answers: u32,
    pub total_questions: u32,
    /// Seconds. Always 0 until the client reports elapsed time.
    pub time_spent: u32,
    pub detailed_results: Vec<DetailedResult>,
}

impl Scorecard {
    /// Turn the scorecard into the attempt row recorded for `user_id`.
    #[must_use]
    pub fn to_attempt(
        &self,
        id: AttemptId,
        user_id: UserId,
        quiz_set_id: QuizSetId,
        answers: AnswerSheet,
        now: DateTime<Utc>,
    ) -> QuizAttempt {
        QuizAttempt {
            id,
            user_id,
            quiz_set_id,
            answers,
            score: self.score,
            correct_answers: self.correct_answers,
            total_questions: self.total_questions,
            time_spent: self.time_spent,
            detailed_results: self.detailed_results.clone(),
            completed_at: Some(now),
            created_at: now,
        }
    }
}

/// Does `submitted` match `correct`?
///
/// A list-shaped correct answer compares as a set: order and duplicates in
/// the submission are ignored and a bare index counts as a one-element list.
/// A scalar correct answer only matches the identical scalar.
/// Matching by length plus membership is deliberately not used, so `[0, 0]`
/// never matches `[0, 2]` while `[0, 2, 2]` does.
#[must_use]
pub fn is_correct(correct: &Answer, submitted: &Answer) -> bool {
    match correct {
        Answer::Multiple(_) => submitted.index_set() == correct.index_set(),
        Answer::Single(index) => *submitted == Answer::Single(*index),
    }
}

/// `correct / total * 100`, or 0 when there is nothing to score.
#[must_use]
pub fn percentage(correct: u32, total: u32) -> f64 {
    if total == 0 {
        0.0
    } else {
        f64::from(correct) / f64::from(total) * 100.0
    }
}

/// Score `answers` against every question of a quiz set.
///
/// Unanswered questions count toward the total but produce no detailed
/// result. Answers for ids that are not among `questions` are ignored.
#[must_use]
pub fn score_submission(questions: &[Question], answers: &AnswerSheet) -> Scorecard {
    let mut correct_answers = 0u32;
    let mut detailed_results = Vec::new();

    for question in questions {
        let Some(submitted) = answers.get(&question.id) else {
            continue;
        };
        let correct = is_correct(&question.correct_answer, submitted);
        if correct {
            correct_answers += 1;
        }
        detailed_results.push(DetailedResult {
            question_id: question.id,
            correct,
            user_answer: submitted.clone(),
            correct_answer: question.correct_answer.clone(),
        });
    }

    let total_questions = u32::try_from(questions.len()).unwrap_or(u32::MAX);
    Scorecard {
        score: percentage(correct_answers, total_questions),
        correct_answers,
        total_questions,
        time_spent: 0,
        detailed_results,
    }
}

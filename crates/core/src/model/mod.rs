mod answer;
mod attempt;
mod ids;
mod progress;
mod question;
mod quiz_set;
mod user;

pub use answer::{Answer, AnswerSheet};
pub use attempt::{DetailedResult, QuizAttempt};
pub use ids::{AttemptId, ParseIdError, ProgressId, QuestionId, QuizSetId, UserId};
pub use progress::{ProgressDraft, UserProgress};
pub use question::{
    NewQuestion, Question, QuestionError, QuestionKind, QuestionPatch, ReferenceLink,
    VideoResource,
};
pub use quiz_set::{Difficulty, NewQuizSet, QuizSet, QuizSetError, QuizSetPatch};
pub use user::{Role, User, UserError, UserPatch, normalize_email};

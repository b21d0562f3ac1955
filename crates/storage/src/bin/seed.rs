use std::fmt;

use chrono::{DateTime, Utc};
use quiz_core::model::{
    Answer, Difficulty, NewQuestion, NewQuizSet, Question, QuestionId, QuestionKind, QuizSet,
    QuizSetId,
};
use storage::repository::{QuizSetFilter, Storage};

const SAMPLE_TITLE: &str = "Integration Fundamentals";

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    now: Option<DateTime<Utc>>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidNow { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidNow { raw } => {
                write!(f, "invalid --now value (expected RFC3339): {raw}")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://quiz.sqlite3".into());
        let mut now: Option<DateTime<Utc>> = None;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--now" => {
                    let value = require_value(&mut args, "--now")?;
                    let parsed = DateTime::parse_from_rfc3339(&value)
                        .map_err(|_| ArgsError::InvalidNow { raw: value.clone() })?
                        .with_timezone(&Utc);
                    now = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self { db_url, now })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>   SQLite URL (default: $DATABASE_URL or sqlite://quiz.sqlite3)");
    eprintln!("  --now <rfc3339>     Fixed current time for deterministic seeding");
    eprintln!("  -h, --help          Show this help");
}

fn options(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_owned()).collect()
}

fn sample_questions() -> Vec<NewQuestion> {
    let mut api = NewQuestion::basic(
        "Which HTTP method is idempotent and used to replace a resource?",
        options(&["POST", "PUT", "PATCH", "CONNECT"]),
        Answer::Single(1),
        QuestionKind::Single,
    );
    api.justification =
        "PUT replaces the target resource and repeating it has the same effect.".into();
    api.category = Some("HTTP".into());
    api.tags = vec!["http".into(), "rest".into()];

    let mut status = NewQuestion::basic(
        "Which status codes indicate a client error?",
        options(&["200", "404", "500", "400"]),
        Answer::Multiple(vec![1, 3]),
        QuestionKind::Multiple,
    );
    status.justification = "4xx codes are client errors; 5xx are server errors.".into();
    status.category = Some("HTTP".into());
    status.hints = vec!["Look at the first digit.".into()];

    let mut json = NewQuestion::basic(
        "Which of these are valid JSON value types?",
        options(&["string", "date", "number", "boolean"]),
        Answer::Multiple(vec![0, 2, 3]),
        QuestionKind::Multiple,
    );
    json.justification = "JSON has no date type; dates travel as strings.".into();
    json.difficulty = Difficulty::Hard;

    let mut sql = NewQuestion::basic(
        "Which SQL clause filters rows after aggregation?",
        options(&["WHERE", "GROUP BY", "HAVING", "ORDER BY"]),
        Answer::Single(2),
        QuestionKind::Single,
    );
    sql.justification = "HAVING applies to grouped rows.".into();
    sql.difficulty = Difficulty::Easy;

    vec![api, status, json, sql]
}

async fn already_seeded(storage: &Storage) -> Result<bool, Box<dyn std::error::Error>> {
    let existing = storage
        .quiz_sets
        .list_quiz_sets(QuizSetFilter::default(), 0, 1000)
        .await?;
    Ok(existing.iter().any(|qs| qs.title == SAMPLE_TITLE))
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;
    let now = args.now.unwrap_or_else(Utc::now);

    if already_seeded(&storage).await? {
        println!("{SAMPLE_TITLE} already present in {}", args.db_url);
        return Ok(());
    }

    let quiz_set = QuizSet::new(
        QuizSetId::generate(),
        NewQuizSet {
            title: SAMPLE_TITLE.into(),
            description: "HTTP, JSON and SQL basics".into(),
            category: "Integration".into(),
            difficulty: Difficulty::Medium,
            estimated_time: 15,
            is_active: true,
        },
        now,
    )?;
    storage.quiz_sets.insert_quiz_set(&quiz_set).await?;

    let drafts = sample_questions();
    let count = drafts.len();
    for draft in drafts {
        let question = Question::new(QuestionId::generate(), quiz_set.id, draft, now)?;
        storage.questions.insert_question(&question).await?;
    }

    println!(
        "Seeded quiz set {} with {count} questions into {}",
        quiz_set.id, args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

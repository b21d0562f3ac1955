use chrono::Duration;
use quiz_core::model::{
    Answer, AnswerSheet, Difficulty, NewQuestion, NewQuizSet, ProgressDraft, QuestionKind,
};
use quiz_core::time::fixed_now;
use services::{AppServices, AuthSettings, Clock, Registration};
use storage::repository::Storage;

fn services() -> AppServices {
    let settings = AuthSettings {
        secret: "flow-secret".into(),
        token_ttl: Duration::minutes(30),
        bcrypt_cost: 4,
    };
    AppServices::new(&Storage::in_memory(), Clock::fixed(fixed_now()), &settings)
}

#[tokio::test]
async fn register_build_quiz_take_it_and_read_stats() {
    let app = services();

    let user = app
        .auth()
        .register(Registration {
            name: "Ann".into(),
            email: "ann@example.com".into(),
            password: "pw".into(),
            role: None,
        })
        .await
        .unwrap();

    let catalog = app.catalog();
    let quiz_set = catalog
        .create_quiz_set(NewQuizSet {
            title: "T".into(),
            description: String::new(),
            category: "Arithmetic".into(),
            difficulty: Difficulty::Easy,
            estimated_time: 10,
            is_active: true,
        })
        .await
        .unwrap();
    let single = catalog
        .create_question(
            quiz_set.id,
            NewQuestion::basic(
                "2 + 2",
                vec!["3".into(), "4".into(), "5".into(), "6".into()],
                Answer::Single(1),
                QuestionKind::Single,
            ),
        )
        .await
        .unwrap();
    let multi = catalog
        .create_question(
            quiz_set.id,
            NewQuestion::basic(
                "evens",
                vec!["1".into(), "2".into(), "3".into(), "4".into()],
                Answer::Multiple(vec![1, 3]),
                QuestionKind::Multiple,
            ),
        )
        .await
        .unwrap();

    app.progress()
        .save_progress(user.id, ProgressDraft::empty(quiz_set.id))
        .await
        .unwrap();

    let mut answers = AnswerSheet::new();
    answers.insert(single.id, Answer::Single(1));
    answers.insert(multi.id, Answer::Multiple(vec![1]));
    let card = app.scoring().submit(user.id, quiz_set.id, answers).await.unwrap();
    assert_eq!(card.correct_answers, 1);
    assert_eq!(card.total_questions, 2);
    assert!((card.score - 50.0).abs() < f64::EPSILON);
    assert_eq!(card.detailed_results.len(), 2);

    let progress = app.progress().get_progress(user.id, quiz_set.id).await.unwrap();
    assert!(progress.is_completed());
    assert!((progress.score - 50.0).abs() < f64::EPSILON);

    let analytics = app.analytics().quiz_set_analytics(quiz_set.id).await.unwrap();
    assert_eq!(analytics.total_attempts, 1);
    let rates: Vec<f64> = analytics
        .question_stats
        .iter()
        .map(|s| s.correct_rate)
        .collect();
    assert_eq!(rates, vec![1.0, 0.0]);

    let stats = app.analytics().user_stats(user.id).await.unwrap();
    assert_eq!(stats.total_quizzes, 1);
    assert!(stats.strong_categories.is_empty());
    assert_eq!(stats.weak_categories, vec!["Arithmetic".to_owned()]);
}

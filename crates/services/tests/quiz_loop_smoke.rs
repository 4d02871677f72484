use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use quiz_core::engine::{StartMode, Transition};
use quiz_core::model::{Difficulty, Language, Question, QuestionDraft, SessionKey, TestConfig};
use quiz_core::time::fixed_now;
use services::error::GenerationError;
use services::{
    Clock, IdentityTranslator, QuestionBank, QuestionSupplier, QuizError, QuizLoopService,
    QuizSession, Translator,
};
use storage::repository::{InMemoryRepository, QuizStateRepository, ResultRepository};

fn question(id: &str) -> Question {
    QuestionDraft {
        id: id.into(),
        category: Some("Physics".into()),
        topic: format!("Topic {id}"),
        question: format!("Question {id}?"),
        options: vec!["right".into(), "wrong".into(), "wrong".into(), "wrong".into()],
        correct_answer: 0,
        explanation: Some("Because.".into()),
    }
    .validate()
    .unwrap()
}

fn config(subject: &str) -> TestConfig {
    TestConfig {
        competition: "CBSE Board".into(),
        class_name: "Class 10".into(),
        subject: subject.into(),
        chapters: vec!["Motion".into()],
        question_count: 4,
        difficulty: Difficulty::Medium,
    }
}

/// Hands out the same set every time and counts calls.
struct FixedSupplier {
    questions: Vec<Question>,
    calls: AtomicUsize,
}

impl FixedSupplier {
    fn new(n: usize) -> Self {
        Self {
            questions: (1..=n).map(|i| question(&format!("q{i}"))).collect(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl QuestionSupplier for FixedSupplier {
    async fn generate(&self, _config: &TestConfig) -> Result<Vec<Question>, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.questions.clone())
    }
}

struct FailingSupplier;

#[async_trait]
impl QuestionSupplier for FailingSupplier {
    async fn generate(&self, _config: &TestConfig) -> Result<Vec<Question>, GenerationError> {
        Err(GenerationError::Empty)
    }
}

/// Marks the text so tests can tell a translated question apart.
struct MarkingTranslator;

#[async_trait]
impl Translator for MarkingTranslator {
    async fn translate(&self, question: &Question, language: &Language) -> Question {
        question
            .translated(
                format!("[{language}] {}", question.text()),
                question.options().to_vec(),
                None,
            )
            .unwrap_or_else(|_| question.clone())
    }
}

/// Counts translate calls.
#[derive(Default)]
struct CountingTranslator {
    calls: AtomicUsize,
}

#[async_trait]
impl Translator for CountingTranslator {
    async fn translate(&self, question: &Question, language: &Language) -> Question {
        self.calls.fetch_add(1, Ordering::SeqCst);
        MarkingTranslator.translate(question, language).await
    }
}

struct Harness {
    repo: InMemoryRepository,
    supplier: Arc<FixedSupplier>,
    quiz: QuizLoopService,
}

fn harness(n: usize) -> Harness {
    harness_with(n, Arc::new(IdentityTranslator))
}

fn harness_with(n: usize, translator: Arc<dyn Translator>) -> Harness {
    let repo = InMemoryRepository::new();
    let supplier = Arc::new(FixedSupplier::new(n));
    let quiz = QuizLoopService::new(
        Clock::fixed(fixed_now()),
        supplier.clone(),
        translator,
        Arc::new(repo.clone()),
        Arc::new(repo.clone()),
    );
    Harness {
        repo,
        supplier,
        quiz,
    }
}

async fn answer(quiz: &QuizLoopService, session: &mut QuizSession, correct: bool) -> Transition {
    let selected = if correct { 0 } else { 1 };
    let submission = quiz.submit_answer(session, selected).await.unwrap();
    quiz.commit_feedback(session, &submission.ticket).await.unwrap()
}

fn key(name: &str) -> SessionKey {
    SessionKey::for_student(name).unwrap()
}

#[tokio::test]
async fn all_correct_run_stores_result_and_erases_state() {
    let h = harness(4);
    let mut session = h.quiz.start_session("Asha", config("Physics")).await.unwrap();
    assert_eq!(session.start_mode(), &StartMode::Fresh);
    assert!(h.repo.load_state(&key("asha")).await.unwrap().is_some());

    for _ in 0..3 {
        answer(&h.quiz, &mut session, true).await;
    }
    assert_eq!(answer(&h.quiz, &mut session, true).await, Transition::Completed);

    let result = session.result().expect("finalized").clone();
    assert_eq!(result.one_shot_accuracy(), 100);
    assert_eq!(result.rounds(), 1);
    assert!(h.repo.load_state(&key("Asha")).await.unwrap().is_none());
    assert_eq!(h.repo.list_recent(10).await.unwrap(), vec![result]);
}

#[tokio::test]
async fn missed_question_returns_next_round_and_scores_first_pass_only() {
    let h = harness(4);
    let mut session = h.quiz.start_session("Asha", config("Physics")).await.unwrap();

    answer(&h.quiz, &mut session, true).await;
    answer(&h.quiz, &mut session, false).await;
    answer(&h.quiz, &mut session, true).await;
    assert_eq!(
        answer(&h.quiz, &mut session, true).await,
        Transition::NewRound {
            round: 2,
            pool_size: 1
        }
    );
    assert_eq!(session.displayed_question().unwrap().id().as_str(), "q2");
    assert_eq!(answer(&h.quiz, &mut session, true).await, Transition::Completed);

    let result = session.result().unwrap();
    assert_eq!(result.one_shot_accuracy(), 75);
    assert_eq!(result.rounds(), 2);
    assert_eq!(result.attempts().len(), 5);
}

#[tokio::test]
async fn reopening_as_same_student_resumes_saved_progress() {
    let h = harness(4);
    let mut session = h.quiz.start_session("Ravi Kumar", config("Physics")).await.unwrap();
    answer(&h.quiz, &mut session, false).await;
    h.quiz.toggle_pause(&mut session).await.unwrap();
    h.quiz.leave(&mut session).await.unwrap();
    drop(session);

    let resumed = h
        .quiz
        .start_session("  ravi   KUMAR ", config("Physics"))
        .await
        .unwrap();
    assert_eq!(resumed.start_mode(), &StartMode::Resumed { settled: None });
    let progress = resumed.progress();
    assert_eq!(progress.attempted, 1);
    assert_eq!(progress.position, 2);
    assert_eq!(progress.carried_to_next_round, 1);
    assert!(progress.paused);
    assert_eq!(resumed.engine().state().start_time(), fixed_now());
}

#[tokio::test]
async fn different_subject_discards_saved_state() {
    let h = harness(4);
    let mut session = h.quiz.start_session("Asha", config("Mathematics")).await.unwrap();
    answer(&h.quiz, &mut session, true).await;
    drop(session);

    let fresh = h.quiz.start_session("Asha", config("Physics")).await.unwrap();
    assert!(matches!(fresh.start_mode(), StartMode::Discarded(_)));
    assert_eq!(fresh.engine().state().round(), 1);
    assert!(fresh.engine().state().attempts().is_empty());

    let saved = h.repo.load_state(&key("Asha")).await.unwrap().unwrap();
    assert_eq!(saved.subject(), "Physics");
}

#[tokio::test]
async fn cancelled_feedback_is_settled_on_resume_without_a_repeat() {
    let h = harness(3);
    let mut session = h.quiz.start_session("Asha", config("Physics")).await.unwrap();
    h.quiz.submit_answer(&mut session, 0).await.unwrap();
    assert!(h.quiz.cancel_feedback(&mut session).await.unwrap());
    drop(session);

    let resumed = h.quiz.start_session("Asha", config("Physics")).await.unwrap();
    assert_eq!(
        resumed.start_mode(),
        &StartMode::Resumed {
            settled: Some(Transition::Advanced { index: 1 })
        }
    );
    assert_eq!(resumed.displayed_question().unwrap().id().as_str(), "q2");
    assert_eq!(resumed.engine().state().attempts().len(), 1);
}

#[tokio::test]
async fn crash_after_submit_keeps_the_attempt() {
    let h = harness(3);
    let mut session = h.quiz.start_session("Asha", config("Physics")).await.unwrap();
    h.quiz.submit_answer(&mut session, 1).await.unwrap();
    // no leave, no cancel: the process goes away while feedback is on screen
    drop(session);

    let saved = h.repo.load_state(&key("Asha")).await.unwrap().unwrap();
    assert!(saved.pending().is_some());

    let resumed = h.quiz.start_session("Asha", config("Physics")).await.unwrap();
    assert_eq!(
        resumed.start_mode(),
        &StartMode::Resumed {
            settled: Some(Transition::Advanced { index: 1 })
        }
    );
    let state = resumed.engine().state();
    assert_eq!(state.attempts().len(), 1);
    assert!(!state.attempts()[0].is_correct);
    assert_eq!(state.miss_queue().len(), 1);
    assert_eq!(resumed.displayed_question().unwrap().id().as_str(), "q2");
}

#[tokio::test]
async fn resume_that_settles_the_last_answer_finalizes_immediately() {
    let h = harness(1);
    let mut session = h.quiz.start_session("Asha", config("Physics")).await.unwrap();
    h.quiz.submit_answer(&mut session, 0).await.unwrap();
    h.quiz.leave(&mut session).await.unwrap();
    drop(session);

    let resumed = h.quiz.start_session("Asha", config("Physics")).await.unwrap();
    assert!(resumed.is_finished());
    assert_eq!(resumed.result().unwrap().one_shot_accuracy(), 100);
    assert!(h.repo.load_state(&key("Asha")).await.unwrap().is_none());
    assert_eq!(h.repo.list_recent(10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn paused_session_rejects_answers_without_saving() {
    let h = harness(4);
    let mut session = h.quiz.start_session("Asha", config("Physics")).await.unwrap();
    assert!(h.quiz.toggle_pause(&mut session).await.unwrap());

    let err = h.quiz.submit_answer(&mut session, 0).await.unwrap_err();
    assert!(err.is_rejection());
    assert!(session.engine().state().attempts().is_empty());
    let saved = h.repo.load_state(&key("Asha")).await.unwrap().unwrap();
    assert!(saved.attempts().is_empty());
    assert!(saved.is_paused());
}

#[tokio::test]
async fn finishing_early_scores_attempted_questions_only() {
    let h = harness(10);
    let mut session = h.quiz.start_session("Asha", config("Physics")).await.unwrap();
    answer(&h.quiz, &mut session, true).await;
    answer(&h.quiz, &mut session, false).await;

    let result = h.quiz.finish_now(&mut session).await.unwrap();
    assert_eq!(result.one_shot_accuracy(), 50);
    assert!(h.repo.load_state(&key("Asha")).await.unwrap().is_none());
    assert!(h.quiz.finish_now(&mut session).await.unwrap_err().is_rejection());
}

#[tokio::test]
async fn invalid_config_never_reaches_the_supplier() {
    let h = harness(4);
    let mut bad = config("Physics");
    bad.chapters.clear();
    let err = h.quiz.start_session("Asha", bad).await.unwrap_err();
    assert!(matches!(err, QuizError::Config(_)));
    assert_eq!(h.supplier.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn supplier_failure_saves_nothing() {
    let repo = InMemoryRepository::new();
    let quiz = QuizLoopService::new(
        Clock::fixed(fixed_now()),
        Arc::new(FailingSupplier),
        Arc::new(IdentityTranslator),
        Arc::new(repo.clone()),
        Arc::new(repo.clone()),
    );
    let err = quiz.start_session("Asha", config("Physics")).await.unwrap_err();
    assert!(matches!(err, QuizError::Generation(GenerationError::Empty)));
    assert!(repo.load_state(&key("Asha")).await.unwrap().is_none());
}

#[tokio::test]
async fn late_translation_is_discarded() {
    let h = harness_with(3, Arc::new(MarkingTranslator));
    let mut session = h.quiz.start_session("Asha", config("Physics")).await.unwrap();
    let hindi = Language::parse("Hindi").unwrap();
    assert!(h.quiz.set_language(&mut session, hindi).await.unwrap());

    let stale = h.quiz.translate_current(&session).await.unwrap();
    answer(&h.quiz, &mut session, true).await;
    assert!(!h.quiz.apply_translation(&mut session, stale));
    assert_eq!(session.displayed_question().unwrap().text(), "Question q2?");

    let fresh = h.quiz.translate_current(&session).await.unwrap();
    assert!(h.quiz.apply_translation(&mut session, fresh));
    assert_eq!(session.displayed_question().unwrap().text(), "[Hindi] Question q2?");

    // language survives a resume
    drop(session);
    let resumed = h.quiz.start_session("Asha", config("Physics")).await.unwrap();
    assert_eq!(resumed.language().as_str(), "Hindi");
}

#[tokio::test]
async fn shown_translation_is_not_requested_again() {
    let translator = Arc::new(CountingTranslator::default());
    let h = harness_with(3, translator.clone());
    let mut session = h.quiz.start_session("Asha", config("Physics")).await.unwrap();
    assert!(h.quiz.translate_current(&session).await.is_none());

    let tamil = Language::parse("Tamil").unwrap();
    h.quiz.set_language(&mut session, tamil).await.unwrap();
    let translation = h.quiz.translate_current(&session).await.unwrap();
    assert!(h.quiz.apply_translation(&mut session, translation));
    assert!(session.has_current_translation());

    h.quiz.toggle_pause(&mut session).await.unwrap();
    h.quiz.toggle_pause(&mut session).await.unwrap();
    assert!(h.quiz.translate_current(&session).await.is_none());
    assert_eq!(translator.calls.load(Ordering::SeqCst), 1);

    answer(&h.quiz, &mut session, true).await;
    assert!(!session.has_current_translation());
    assert!(h.quiz.translate_current(&session).await.is_some());
    assert_eq!(translator.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn abandon_erases_without_a_result() {
    let h = harness(2);
    let mut session = h.quiz.start_session("Asha", config("Physics")).await.unwrap();
    answer(&h.quiz, &mut session, false).await;
    h.quiz.abandon(session).await.unwrap();

    assert!(h.repo.load_state(&key("Asha")).await.unwrap().is_none());
    assert!(h.repo.list_recent(10).await.unwrap().is_empty());
}

#[tokio::test]
async fn offline_bank_drives_a_full_session() {
    let repo = InMemoryRepository::new();
    let quiz = QuizLoopService::new(
        Clock::fixed(fixed_now()),
        Arc::new(QuestionBank::new()),
        Arc::new(IdentityTranslator),
        Arc::new(repo.clone()),
        Arc::new(repo.clone()),
    );
    let mut session = quiz.start_session("Meera", config("Biology")).await.unwrap();
    while !session.is_finished() {
        let correct = session.displayed_question().unwrap().correct_answer();
        let submission = quiz.submit_answer(&mut session, correct).await.unwrap();
        quiz.commit_feedback(&mut session, &submission.ticket).await.unwrap();
    }
    assert_eq!(session.result().unwrap().one_shot_accuracy(), 100);
    assert_eq!(session.result().unwrap().attempted_count(), 4);
}

use quiz_core::engine::{EnrichmentTag, Progress, QuizEngine, StartMode};
use quiz_core::model::{Language, Question, SessionKey, TestResult};

/// A translated rendering of one question, tagged with the position it was
/// requested for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub tag: EnrichmentTag,
    pub language: Language,
    pub question: Question,
}

/// One student's running quiz as handed out by `QuizLoopService`.
#[derive(Debug)]
pub struct QuizSession {
    pub(crate) key: SessionKey,
    pub(crate) engine: QuizEngine,
    pub(crate) mode: StartMode,
    pub(crate) display: Option<Translation>,
    pub(crate) result: Option<TestResult>,
}

impl QuizSession {
    pub(crate) fn new(key: SessionKey, engine: QuizEngine, mode: StartMode) -> Self {
        Self {
            key,
            engine,
            mode,
            display: None,
            result: None,
        }
    }

    #[must_use]
    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    #[must_use]
    pub fn engine(&self) -> &QuizEngine {
        &self.engine
    }

    /// Whether this session started fresh, resumed, or replaced a stale save.
    #[must_use]
    pub fn start_mode(&self) -> &StartMode {
        &self.mode
    }

    #[must_use]
    pub fn progress(&self) -> Progress {
        self.engine.progress()
    }

    #[must_use]
    pub fn language(&self) -> &Language {
        self.engine.state().language()
    }

    /// Set once the session has been scored and stored.
    #[must_use]
    pub fn result(&self) -> Option<&TestResult> {
        self.result.as_ref()
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.result.is_some()
    }

    /// The translation loaded for the current position and language, if any.
    fn current_translation(&self) -> Option<&Translation> {
        self.display
            .as_ref()
            .filter(|t| self.engine.is_current(&t.tag) && &t.language == self.language())
    }

    /// True when the current question is already shown in the chosen language.
    #[must_use]
    pub fn has_current_translation(&self) -> bool {
        self.current_translation().is_some()
    }

    /// The current question as it should be shown: the translation if one is
    /// loaded for this exact position and language, otherwise the original.
    #[must_use]
    pub fn displayed_question(&self) -> Option<&Question> {
        let original = self.engine.current_question()?;
        Some(self.current_translation().map_or(original, |t| &t.question))
    }

    /// Keep `translation` only if it still belongs to the current question
    /// and language. Returns false when it arrived too late.
    pub(crate) fn apply_translation(&mut self, translation: Translation) -> bool {
        if !self.engine.is_current(&translation.tag) || &translation.language != self.language() {
            return false;
        }
        self.display = Some(translation);
        true
    }
}

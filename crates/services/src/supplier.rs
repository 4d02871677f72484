//! Question suppliers: the remote generator and the built-in offline bank.

use std::collections::HashSet;

use async_trait::async_trait;
use rand::seq::SliceRandom;
use serde::Deserialize;
use tracing::{debug, info};

use quiz_core::model::{Question, QuestionDraft, TestConfig};

use crate::ai::ChatClient;
use crate::error::GenerationError;

/// Produces the ordered question set for a configuration.
#[async_trait]
pub trait QuestionSupplier: Send + Sync {
    /// # Errors
    ///
    /// Returns `GenerationError` if no valid question set can be produced.
    /// Malformed sets are rejected whole.
    async fn generate(&self, config: &TestConfig) -> Result<Vec<Question>, GenerationError>;
}

/// Validate every draft and reject sets with repeated ids.
///
/// # Errors
///
/// Returns `GenerationError` on the first invalid draft or duplicate id, or
/// `GenerationError::Empty` for an empty set.
pub fn validate_drafts(drafts: Vec<QuestionDraft>) -> Result<Vec<Question>, GenerationError> {
    if drafts.is_empty() {
        return Err(GenerationError::Empty);
    }
    let mut seen = HashSet::with_capacity(drafts.len());
    let mut questions = Vec::with_capacity(drafts.len());
    for draft in drafts {
        let question = draft.validate()?;
        if !seen.insert(question.id().clone()) {
            return Err(GenerationError::DuplicateId(question.id().to_string()));
        }
        questions.push(question);
    }
    Ok(questions)
}

//
// ─── REMOTE ────────────────────────────────────────────────────────────────────
//

/// Asks the chat provider for a fresh question set.
#[derive(Clone)]
pub struct ChatQuestionSupplier {
    client: ChatClient,
}

/// JSON mode only guarantees an object, so accept a bare array as well as a
/// `{"questions": [...]}` wrapper.
#[derive(Deserialize)]
#[serde(untagged)]
enum GeneratedSet {
    Wrapped { questions: Vec<QuestionDraft> },
    Bare(Vec<QuestionDraft>),
}

impl ChatQuestionSupplier {
    #[must_use]
    pub fn new(client: ChatClient) -> Self {
        Self { client }
    }

    fn prompt(config: &TestConfig) -> String {
        format!(
            "Generate a set of {count} multiple-choice questions for a student preparing for {competition}.\n\
             Level: {class}\n\
             Subject: {subject}\n\
             Selected Chapters: {chapters}\n\
             Difficulty: {difficulty}\n\n\
             Distribute the questions fairly across the selected chapters. The style should match the rigor of {competition} exams.\n\n\
             Respond with a JSON object {{\"questions\": [...]}} where each item has:\n\
             - id: string (unique)\n\
             - category: string (the subject)\n\
             - topic: string (chapter name from the selected list)\n\
             - question: string\n\
             - options: array of exactly 4 strings\n\
             - correctAnswer: number (index 0-3)\n\
             - explanation: string (a brief 1-2 sentence solution)",
            count = config.question_count,
            competition = config.competition,
            class = config.class_name,
            subject = config.subject,
            chapters = config.chapters.join(", "),
            difficulty = config.difficulty,
        )
    }
}

/// Parse a generator response into a validated question set.
///
/// # Errors
///
/// Returns `GenerationError` if the text is not a question array or any
/// question fails validation.
pub fn parse_generated(raw: &str) -> Result<Vec<Question>, GenerationError> {
    let drafts = match serde_json::from_str::<GeneratedSet>(raw)? {
        GeneratedSet::Wrapped { questions } | GeneratedSet::Bare(questions) => questions,
    };
    validate_drafts(drafts)
}

#[async_trait]
impl QuestionSupplier for ChatQuestionSupplier {
    async fn generate(&self, config: &TestConfig) -> Result<Vec<Question>, GenerationError> {
        let prompt = Self::prompt(config);
        let raw = self
            .client
            .complete_json(self.client.settings().model(), &prompt)
            .await?;
        let questions = parse_generated(&raw)?;
        info!(
            subject = %config.subject,
            questions = questions.len(),
            "generated question set"
        );
        Ok(questions)
    }
}

//
// ─── OFFLINE BANK ──────────────────────────────────────────────────────────────
//

/// (id, subject, topic, question, options, correct index)
type BankEntry = (&'static str, &'static str, &'static str, &'static str, [&'static str; 4], usize);

const BANK: [BankEntry; 16] = [
    ("p1", "Physics", "Mechanics", "What is the SI unit of force?", ["Newton", "Joule", "Pascal", "Watt"], 0),
    ("p2", "Physics", "Energy", "Kinetic energy is given by which formula?", ["mgh", "1/2 mv^2", "F*d", "P/t"], 1),
    ("p3", "Physics", "Optics", "Which lens is used to correct myopia?", ["Convex", "Concave", "Cylindrical", "Bifocal"], 1),
    ("p4", "Physics", "Electricity", "Unit of resistance is?", ["Ampere", "Volt", "Ohm", "Coulomb"], 2),
    ("c1", "Chemistry", "Organic", "Which of these is a saturated hydrocarbon?", ["Ethene", "Ethyne", "Ethane", "Benzene"], 2),
    ("c2", "Chemistry", "Periodic Table", "Which element is a noble gas?", ["Oxygen", "Helium", "Chlorine", "Sodium"], 1),
    ("c3", "Chemistry", "States of Matter", "Process of a solid changing directly to gas is?", ["Evaporation", "Melting", "Sublimation", "Condensation"], 2),
    ("c4", "Chemistry", "Atomic Structure", "Who discovered the electron?", ["Rutherford", "Bohr", "J.J. Thomson", "Chadwick"], 2),
    ("b1", "Biology", "Cell Biology", "Powerhouse of the cell is?", ["Nucleus", "Ribosome", "Mitochondria", "Golgi Body"], 2),
    ("b2", "Biology", "Genetics", "Who is the father of genetics?", ["Darwin", "Mendel", "Lamarck", "Watson"], 1),
    ("b3", "Biology", "Botany", "Which pigment gives green color to plants?", ["Xanthophyll", "Chlorophyll", "Carotene", "Anthocyanin"], 1),
    ("b4", "Biology", "Human Anatomy", "Largest organ in the human body?", ["Liver", "Brain", "Skin", "Lungs"], 2),
    ("m1", "Mathematics", "Algebra", "What is the value of x if 2x + 5 = 15?", ["5", "10", "15", "20"], 0),
    ("m2", "Mathematics", "Geometry", "Sum of angles in a triangle?", ["90°", "180°", "270°", "360°"], 1),
    ("m3", "Mathematics", "Trigonometry", "sin²θ + cos²θ = ?", ["0", "1", "2", "-1"], 1),
    ("m4", "Mathematics", "Calculus", "Derivative of x² with respect to x?", ["x", "2x", "x/2", "2"], 1),
];

/// Offline supplier over a small built-in bank. Used when no AI provider is
/// configured and in tests.
#[derive(Clone, Debug, Default)]
pub struct QuestionBank {
    shuffle: bool,
}

impl QuestionBank {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Subjects the bank has questions for.
    #[must_use]
    pub fn subjects() -> Vec<&'static str> {
        let mut subjects: Vec<&'static str> = Vec::new();
        for &(_, subject, ..) in &BANK {
            if !subjects.contains(&subject) {
                subjects.push(subject);
            }
        }
        subjects
    }

    fn drafts_for(subject: &str) -> Vec<QuestionDraft> {
        BANK.iter()
            .filter(|(_, s, ..)| s.eq_ignore_ascii_case(subject.trim()))
            .map(|(id, s, topic, text, options, correct)| QuestionDraft {
                id: (*id).to_owned(),
                category: Some((*s).to_owned()),
                topic: (*topic).to_owned(),
                question: (*text).to_owned(),
                options: options.iter().map(|o| (*o).to_owned()).collect(),
                correct_answer: *correct,
                explanation: None,
            })
            .collect()
    }
}

#[async_trait]
impl QuestionSupplier for QuestionBank {
    async fn generate(&self, config: &TestConfig) -> Result<Vec<Question>, GenerationError> {
        let mut drafts = Self::drafts_for(&config.subject);
        if self.shuffle {
            drafts.shuffle(&mut rand::rng());
        }
        let count = usize::try_from(config.question_count).unwrap_or(usize::MAX);
        drafts.truncate(count);
        debug!(subject = %config.subject, selected = drafts.len(), "offline bank selection");
        validate_drafts(drafts)
    }
}

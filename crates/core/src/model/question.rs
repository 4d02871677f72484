use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::QuestionId;

/// Every question is multiple choice with exactly this many options.
pub const OPTION_COUNT: usize = 4;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question id is empty")]
    EmptyId,

    #[error("question {id}: text is empty")]
    EmptyText { id: String },

    #[error("question {id}: topic is empty")]
    EmptyTopic { id: String },

    #[error("question {id}: expected {OPTION_COUNT} options, got {len}")]
    OptionCount { id: String, len: usize },

    #[error("question {id}: option {index} is empty")]
    EmptyOption { id: String, index: usize },

    #[error("question {id}: correct answer {index} is out of range")]
    CorrectAnswerOutOfRange { id: String, index: usize },
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// A question as it arrives from a supplier, before any checks.
///
/// Field names follow the camelCase JSON the generator emits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDraft {
    pub id: String,
    #[serde(default)]
    pub category: Option<String>,
    pub topic: String,
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
    #[serde(default)]
    pub explanation: Option<String>,
}

impl QuestionDraft {
    /// Check the draft and turn it into an immutable `Question`.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if any text is blank, the option count is not
    /// [`OPTION_COUNT`], or `correct_answer` does not index into the options.
    pub fn validate(self) -> Result<Question, QuestionError> {
        let id = self.id.trim().to_owned();
        if id.is_empty() {
            return Err(QuestionError::EmptyId);
        }
        if self.question.trim().is_empty() {
            return Err(QuestionError::EmptyText { id });
        }
        if self.topic.trim().is_empty() {
            return Err(QuestionError::EmptyTopic { id });
        }
        if self.options.len() != OPTION_COUNT {
            return Err(QuestionError::OptionCount {
                id,
                len: self.options.len(),
            });
        }
        if let Some(index) = self.options.iter().position(|o| o.trim().is_empty()) {
            return Err(QuestionError::EmptyOption { id, index });
        }
        if self.correct_answer >= self.options.len() {
            return Err(QuestionError::CorrectAnswerOutOfRange {
                id,
                index: self.correct_answer,
            });
        }

        let explanation = self
            .explanation
            .map(|e| e.trim().to_owned())
            .filter(|e| !e.is_empty());
        let category = self
            .category
            .map(|c| c.trim().to_owned())
            .filter(|c| !c.is_empty());

        Ok(Question {
            id: QuestionId::new(id),
            category,
            topic: self.topic.trim().to_owned(),
            question: self.question,
            options: self.options,
            correct_answer: self.correct_answer,
            explanation,
        })
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A validated multiple-choice question.
///
/// Deserialization goes back through [`QuestionDraft::validate`], so a
/// persisted session can never smuggle in a malformed question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "QuestionDraft")]
pub struct Question {
    id: QuestionId,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<String>,
    topic: String,
    question: String,
    options: Vec<String>,
    correct_answer: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    explanation: Option<String>,
}

impl TryFrom<QuestionDraft> for Question {
    type Error = QuestionError;

    fn try_from(draft: QuestionDraft) -> Result<Self, Self::Error> {
        draft.validate()
    }
}

impl Question {
    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.question
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_answer(&self) -> usize {
        self.correct_answer
    }

    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    #[must_use]
    pub fn is_correct(&self, selected: usize) -> bool {
        selected == self.correct_answer
    }

    /// Returns a copy carrying translated text.
    ///
    /// Identity, topic and the correct index are kept, so a translated copy
    /// grades exactly like the original.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the translated text does not form a valid question.
    pub fn translated(
        &self,
        question: String,
        options: Vec<String>,
        explanation: Option<String>,
    ) -> Result<Question, QuestionError> {
        QuestionDraft {
            id: self.id.as_str().to_owned(),
            category: self.category.clone(),
            topic: self.topic.clone(),
            question,
            options,
            correct_answer: self.correct_answer,
            explanation: explanation.or_else(|| self.explanation.clone()),
        }
        .validate()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> QuestionDraft {
        QuestionDraft {
            id: "p1".into(),
            category: Some("Physics".into()),
            topic: "Mechanics".into(),
            question: "What is the SI unit of force?".into(),
            options: vec!["Newton".into(), "Joule".into(), "Pascal".into(), "Watt".into()],
            correct_answer: 0,
            explanation: None,
        }
    }

    #[test]
    fn valid_draft_becomes_question() {
        let q = draft().validate().unwrap();
        assert_eq!(q.id(), &QuestionId::new("p1"));
        assert_eq!(q.options().len(), OPTION_COUNT);
        assert!(q.is_correct(0));
        assert!(!q.is_correct(2));
    }

    #[test]
    fn three_options_are_rejected() {
        let mut d = draft();
        d.options.pop();
        let err = d.validate().unwrap_err();
        assert!(matches!(err, QuestionError::OptionCount { len: 3, .. }));
    }

    #[test]
    fn correct_answer_must_index_options() {
        let mut d = draft();
        d.correct_answer = 4;
        let err = d.validate().unwrap_err();
        assert!(matches!(err, QuestionError::CorrectAnswerOutOfRange { index: 4, .. }));
    }

    #[test]
    fn blank_option_is_rejected() {
        let mut d = draft();
        d.options[2] = "  ".into();
        let err = d.validate().unwrap_err();
        assert!(matches!(err, QuestionError::EmptyOption { index: 2, .. }));
    }

    #[test]
    fn deserializing_goes_through_validation() {
        let json = r#"{"id":"x","topic":"T","question":"Q?","options":["a","b"],"correctAnswer":0}"#;
        let parsed: Result<Question, _> = serde_json::from_str(json);
        assert!(parsed.is_err());
    }

    #[test]
    fn translated_copy_keeps_identity_and_answer() {
        let q = draft().validate().unwrap();
        let t = q
            .translated(
                "बल की SI इकाई क्या है?".into(),
                vec!["न्यूटन".into(), "जूल".into(), "पास्कल".into(), "वाट".into()],
                None,
            )
            .unwrap();
        assert_eq!(t.id(), q.id());
        assert_eq!(t.correct_answer(), q.correct_answer());
        assert_eq!(t.topic(), "Mechanics");
    }
}

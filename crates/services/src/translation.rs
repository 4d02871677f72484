//! Fail-soft question translation.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use quiz_core::model::{Language, Question};

use crate::ai::ChatClient;
use crate::error::TranslationError;

/// Renders a question in another language.
///
/// Implementations never fail: when translation is impossible they hand back
/// the original question.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, question: &Question, language: &Language) -> Question;
}

/// Leaves every question as generated.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityTranslator;

#[async_trait]
impl Translator for IdentityTranslator {
    async fn translate(&self, question: &Question, _language: &Language) -> Question {
        question.clone()
    }
}

#[derive(Clone)]
pub struct ChatTranslator {
    client: ChatClient,
}

#[derive(Debug, Deserialize)]
struct TranslatedText {
    question: String,
    options: Vec<String>,
    #[serde(default)]
    explanation: Option<String>,
}

impl ChatTranslator {
    #[must_use]
    pub fn new(client: ChatClient) -> Self {
        Self { client }
    }

    fn prompt(question: &Question, language: &Language) -> String {
        format!(
            "Translate the following educational question, its options, and the brief explanation into {language}. \
             Keep the technical terms accurate.\n\
             Question: {text}\n\
             Options: {options}\n\
             Explanation: {explanation}\n\n\
             Return JSON with 'question' (string), 'options' (array of strings), and 'explanation' (string).",
            text = question.text(),
            options = question.options().join(" | "),
            explanation = question.explanation().unwrap_or(""),
        )
    }

    async fn try_translate(
        &self,
        question: &Question,
        language: &Language,
    ) -> Result<Question, TranslationError> {
        let raw = self
            .client
            .complete_json(
                self.client.settings().translate_model(),
                &Self::prompt(question, language),
            )
            .await?;
        merge_translation(question, &raw)
    }
}

/// Overlay translated text on a copy of `original`.
pub(crate) fn merge_translation(original: &Question, raw: &str) -> Result<Question, TranslationError> {
    let text: TranslatedText = serde_json::from_str(raw)?;
    if text.options.len() != original.options().len() {
        return Err(TranslationError::OptionCount {
            expected: original.options().len(),
            got: text.options.len(),
        });
    }
    let explanation = text.explanation.filter(|e| !e.trim().is_empty());
    Ok(original.translated(text.question, text.options, explanation)?)
}

#[async_trait]
impl Translator for ChatTranslator {
    async fn translate(&self, question: &Question, language: &Language) -> Question {
        if language.is_base() {
            return question.clone();
        }
        match self.try_translate(question, language).await {
            Ok(translated) => {
                debug!(question = %question.id(), %language, "question translated");
                translated
            }
            Err(e) => {
                warn!(
                    question = %question.id(),
                    %language,
                    error = %e,
                    "translation failed, showing original"
                );
                question.clone()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{AiSettings, QuestionDraft};

    fn question() -> Question {
        QuestionDraft {
            id: "p1".into(),
            category: Some("Physics".into()),
            topic: "Mechanics".into(),
            question: "What is the SI unit of force?".into(),
            options: vec!["Newton".into(), "Joule".into(), "Pascal".into(), "Watt".into()],
            correct_answer: 0,
            explanation: Some("F = ma".into()),
        }
        .validate()
        .unwrap()
    }

    #[test]
    fn merge_keeps_identity_and_answer() {
        let raw = r#"{"question":"बल की SI इकाई क्या है?","options":["न्यूटन","जूल","पास्कल","वाट"],"explanation":"F = ma"}"#;
        let merged = merge_translation(&question(), raw).unwrap();
        assert_eq!(merged.id(), question().id());
        assert_eq!(merged.topic(), "Mechanics");
        assert_eq!(merged.correct_answer(), 0);
        assert_eq!(merged.options()[0], "न्यूटन");
    }

    #[test]
    fn option_count_mismatch_is_refused() {
        let raw = r#"{"question":"x","options":["a","b"],"explanation":""}"#;
        assert!(matches!(
            merge_translation(&question(), raw),
            Err(TranslationError::OptionCount { expected: 4, got: 2 })
        ));
    }

    #[test]
    fn blank_explanation_keeps_original() {
        let raw = r#"{"question":"x","options":["a","b","c","d"],"explanation":"  "}"#;
        let merged = merge_translation(&question(), raw).unwrap();
        assert_eq!(merged.explanation(), Some("F = ma"));
    }

    #[tokio::test]
    async fn base_language_is_identity() {
        let translator = ChatTranslator::new(ChatClient::new(AiSettings::default()));
        let q = question();
        assert_eq!(translator.translate(&q, &Language::base()).await, q);
    }

    #[tokio::test]
    async fn failure_falls_back_to_original() {
        // no API key, so the request fails before leaving the process
        let translator = ChatTranslator::new(ChatClient::new(AiSettings::default()));
        let q = question();
        let hindi = Language::parse("hindi").unwrap();
        assert_eq!(translator.translate(&q, &hindi).await, q);
    }
}

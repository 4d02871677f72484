use std::env;

use thiserror::Error;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Connection settings for the question generator and translator.
///
/// Without an API key the remote collaborators are disabled and only the
/// offline question bank is usable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AiSettings {
    api_key: Option<String>,
    model: String,
    translate_model: String,
    base_url: String,
}

#[derive(Clone, Debug, Default)]
pub struct AiSettingsDraft {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub translate_model: Option<String>,
    pub base_url: Option<String>,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
}

impl AiSettingsDraft {
    /// Reads `QUIZ_AI_API_KEY`, `QUIZ_AI_BASE_URL`, `QUIZ_AI_MODEL` and
    /// `QUIZ_AI_TRANSLATE_MODEL`.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            api_key: env::var("QUIZ_AI_API_KEY").ok(),
            model: env::var("QUIZ_AI_MODEL").ok(),
            translate_model: env::var("QUIZ_AI_TRANSLATE_MODEL").ok(),
            base_url: env::var("QUIZ_AI_BASE_URL").ok(),
        }
    }

    /// Trim blanks, fill defaults and check the base URL.
    ///
    /// The translation model falls back to the generation model.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::InvalidBaseUrl` if the base URL does not parse.
    pub fn validate(self) -> Result<AiSettings, SettingsError> {
        let api_key = normalize_optional(self.api_key);
        let model = normalize_optional(self.model).unwrap_or_else(|| DEFAULT_MODEL.to_owned());
        let translate_model = normalize_optional(self.translate_model).unwrap_or_else(|| model.clone());
        let base_url =
            normalize_optional(self.base_url).unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());

        if Url::parse(&base_url).is_err() {
            return Err(SettingsError::InvalidBaseUrl(base_url));
        }

        Ok(AiSettings {
            api_key,
            model,
            translate_model,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }
}

impl AiSettings {
    /// # Errors
    ///
    /// Returns `SettingsError` if the environment holds an invalid base URL.
    pub fn from_env() -> Result<Self, SettingsError> {
        AiSettingsDraft::from_env().validate()
    }

    #[must_use]
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    #[must_use]
    pub fn translate_model(&self) -> &str {
        &self.translate_model
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.api_key.is_some()
    }
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_owned(),
            translate_model: DEFAULT_MODEL.to_owned(),
            base_url: DEFAULT_BASE_URL.to_owned(),
        }
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}

use quiz_core::model::AiSettings;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AiError;

#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    settings: AiSettings,
}

impl ChatClient {
    #[must_use]
    pub fn new(settings: AiSettings) -> Self {
        Self {
            client: Client::new(),
            settings,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &AiSettings {
        &self.settings
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.settings.enabled()
    }

    /// Send a single-message prompt in JSON response mode and return the raw
    /// content with any Markdown fence removed.
    ///
    /// # Errors
    ///
    /// Returns `AiError` when the client is disabled, the request fails,
    /// or the response is empty.
    pub async fn complete_json(&self, model: &str, prompt: &str) -> Result<String, AiError> {
        let api_key = self.settings.api_key().ok_or(AiError::Disabled)?;

        let url = format!("{}/chat/completions", self.settings.base_url());
        let payload = ChatRequest {
            model: model.to_owned(),
            messages: vec![ChatMessage {
                role: "user",
                content: prompt.to_owned(),
            }],
            temperature: 0.2,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        debug!(model, "sending chat completion");
        let response = self
            .client
            .post(url)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AiError::HttpStatus(response.status()));
        }

        let body: ChatResponse = response.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(AiError::EmptyResponse)?;

        let content = strip_code_fences(&content);
        if content.is_empty() {
            return Err(AiError::EmptyResponse);
        }
        Ok(content.to_owned())
    }
}

/// Some providers wrap JSON in ```json fences even in JSON mode.
#[must_use]
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // drop the info string ("json") on the opening line
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

//! Google Gemini `generateContent` provider.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::{classify_status, from_reqwest, http_client, prompt, Translation, Translator};
use crate::error::{Result, TransformError};

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateResponse {
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

pub struct GeminiTranslator {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiTranslator {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            api_key: api_key.into(),
            model: DEFAULT_MODEL.into(),
            base_url: DEFAULT_BASE_URL.into(),
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    fn url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

impl Translator for GeminiTranslator {
    fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<Translation, TransformError> {
        let body = json!({
            "contents": [{"parts": [{"text": prompt(text, source_lang, target_lang)}]}]
        });
        debug!(model = %self.model, chars = text.chars().count(), "gemini request");
        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .map_err(|e| from_reqwest(&e))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(classify_status(status, &body));
        }
        let parsed: GenerateResponse = response
            .json()
            .map_err(|e| TransformError::Permanent(format!("invalid gemini response: {e}")))?;
        Ok(Translation::from_output(&parsed.text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_text_joins_parts() {
        let parsed: GenerateResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{"content": {"parts": [{"text": "สวัส"}, {"text": "ดี"}]}}]
        }))
        .unwrap();
        assert_eq!(parsed.text(), "สวัสดี");
    }

    #[test]
    fn test_blocked_response_has_no_text() {
        let parsed: GenerateResponse =
            serde_json::from_value(serde_json::json!({"promptFeedback": {}})).unwrap();
        assert_eq!(parsed.text(), "");
    }

    #[test]
    fn test_url() {
        let client = GeminiTranslator::new("k", Duration::from_secs(5))
            .unwrap()
            .with_base_url("http://localhost:9/");
        assert_eq!(
            client.url(),
            "http://localhost:9/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }
}

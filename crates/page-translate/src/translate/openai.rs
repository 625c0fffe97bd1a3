//! OpenAI chat completions provider.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::{classify_status, from_reqwest, http_client, prompt, Translation, Translator};
use crate::error::{Result, TransformError};

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    content: Option<String>,
}

pub struct OpenAiTranslator {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    temperature: f64,
    max_tokens: u32,
}

impl OpenAiTranslator {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            api_key: api_key.into(),
            model: DEFAULT_MODEL.into(),
            base_url: DEFAULT_BASE_URL.into(),
            temperature: 0.3,
            max_tokens: 2000,
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

    fn system_prompt(source_lang: &str, target_lang: &str) -> String {
        format!(
            "You are a professional translator specializing in translating {source_lang} \
             content to {target_lang} with a focus on HR technology and business contexts."
        )
    }
}

impl Translator for OpenAiTranslator {
    fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<Translation, TransformError> {
        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": Self::system_prompt(source_lang, target_lang)},
                {"role": "user", "content": prompt(text, source_lang, target_lang)},
            ],
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
        });
        debug!(model = %self.model, chars = text.chars().count(), "openai request");
        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| from_reqwest(&e))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(classify_status(status, &body));
        }
        let parsed: ChatResponse = response
            .json()
            .map_err(|e| TransformError::Permanent(format!("invalid openai response: {e}")))?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        Ok(Translation::from_output(&content))
    }
}

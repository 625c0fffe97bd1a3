//! Translation phase: source mapping in, marked transformed mapping out.
//!
//! The service behind [`Translator`] is pluggable; [`gemini`] and [`openai`]
//! are the HTTP providers, [`session`] drives them over a mapping.

pub mod gemini;
pub mod openai;
pub mod session;

use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result, TransformError};

pub use session::{TranslateReport, TranslateSettings, TranslationSession};

/// Answer of the translation service for one string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Translation {
    Text(String),
    /// The service returned nothing usable; leave the entry out.
    Skip,
}

impl Translation {
    /// Clean `raw` and turn empty output into [`Translation::Skip`].
    pub fn from_output(raw: &str) -> Self {
        let cleaned = clean_output(raw);
        if cleaned.is_empty() {
            Translation::Skip
        } else {
            Translation::Text(cleaned.to_string())
        }
    }
}

pub trait Translator {
    fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<Translation, TransformError>;
}

impl<T: Translator + ?Sized> Translator for &T {
    fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<Translation, TransformError> {
        (**self).translate(text, source_lang, target_lang)
    }
}

impl<T: Translator + ?Sized> Translator for Box<T> {
    fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<Translation, TransformError> {
        (**self).translate(text, source_lang, target_lang)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Gemini,
    OpenAi,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TranslateConfig {
    pub provider: Provider,
    /// Provider default when unset.
    pub model: Option<String>,
    /// Provider default when unset.
    pub base_url: Option<String>,
    pub source_lang: String,
    pub target_lang: String,
    /// Language code used for the marker (`_th`) and the artifact name.
    pub target_suffix: String,
    pub delay_ms: u64,
    pub failure_delay_ms: u64,
    pub timeout_secs: u64,
    /// Path suffix patterns copied through without calling the service.
    pub passthrough: Vec<String>,
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            provider: Provider::Gemini,
            model: None,
            base_url: None,
            source_lang: "English".into(),
            target_lang: "Thai".into(),
            target_suffix: "th".into(),
            delay_ms: 2_000,
            failure_delay_ms: 5_000,
            timeout_secs: 60,
            passthrough: vec![
                "content_type".into(),
                "dnd_area.label".into(),
                "0.rows[0].0.label".into(),
            ],
        }
    }
}

/// Build the configured provider.
pub fn translator_for(config: &TranslateConfig, api_key: &str) -> Result<Box<dyn Translator>> {
    let timeout = Duration::from_secs(config.timeout_secs.max(1));
    let translator: Box<dyn Translator> = match config.provider {
        Provider::Gemini => {
            let mut client = gemini::GeminiTranslator::new(api_key, timeout)?;
            if let Some(model) = &config.model {
                client = client.with_model(model);
            }
            if let Some(url) = &config.base_url {
                client = client.with_base_url(url);
            }
            Box::new(client)
        }
        Provider::OpenAi => {
            let mut client = openai::OpenAiTranslator::new(api_key, timeout)?;
            if let Some(model) = &config.model {
                client = client.with_model(model);
            }
            if let Some(url) = &config.base_url {
                client = client.with_base_url(url);
            }
            Box::new(client)
        }
    };
    Ok(translator)
}

/// Prompt asking for a faithful, HTML-preserving translation.
pub fn prompt(text: &str, source_lang: &str, target_lang: &str) -> String {
    format!(
        "You are a professional website translator. \
         Translate the following text from {source_lang} to {target_lang}. \
         Preserve HTML tags, formatting, and tone. \
         Use natural, concise language suitable for a business website.\n\n\
         TEXT:\n{text}"
    )
}

/// Strip a surrounding Markdown code fence (with optional language tag).
///
/// # Example
///
/// ```
/// use page_translate::translate::clean_output;
///
/// assert_eq!(clean_output("```html\n<p>สวัสดี</p>\n```"), "<p>สวัสดี</p>");
/// assert_eq!(clean_output("  plain  "), "plain");
/// ```
pub fn clean_output(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```") {
        let tag_len = rest
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(rest.len());
        let rest = &rest[tag_len..];
        text = rest.strip_prefix('\n').unwrap_or(rest).trim();
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest.trim();
    }
    text
}

/// Map an HTTP status from a translation provider to a failure class.
pub(crate) fn classify_status(status: StatusCode, body: &str) -> TransformError {
    let detail = format!("HTTP {status}: {body}");
    match status.as_u16() {
        429 => TransformError::RateLimited(detail),
        408 | 500..=599 => TransformError::Transient(detail),
        _ => TransformError::Permanent(detail),
    }
}

pub(crate) fn from_reqwest(err: &reqwest::Error) -> TransformError {
    if err.is_timeout() || err.is_connect() || err.is_request() {
        TransformError::Transient(err.to_string())
    } else {
        TransformError::Permanent(err.to_string())
    }
}

pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::blocking::Client> {
    reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| Error::Config(format!("failed to create HTTP client: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_output_variants() {
        assert_eq!(clean_output("```\nhello\n```"), "hello");
        assert_eq!(clean_output("```html<b>x</b>```"), "<b>x</b>");
        assert_eq!(clean_output("no fence ```"), "no fence");
        assert_eq!(clean_output("```json\n```"), "");
    }

    #[test]
    fn test_empty_output_is_skip() {
        assert_eq!(Translation::from_output("  \n "), Translation::Skip);
        assert_eq!(Translation::from_output("```\n```"), Translation::Skip);
        assert_eq!(
            Translation::from_output("สวัสดี"),
            Translation::Text("สวัสดี".into())
        );
    }

    #[test]
    fn test_prompt_mentions_languages_and_text() {
        let p = prompt("<p>Hi</p>", "English", "Thai");
        assert!(p.contains("from English to Thai"));
        assert!(p.contains("Preserve HTML tags"));
        assert!(p.ends_with("TEXT:\n<p>Hi</p>"));
    }

    #[test]
    fn test_status_classes() {
        let class = |code: u16| classify_status(StatusCode::from_u16(code).unwrap(), "");
        assert!(matches!(class(429), TransformError::RateLimited(_)));
        assert!(matches!(class(500), TransformError::Transient(_)));
        assert!(matches!(class(408), TransformError::Transient(_)));
        assert!(matches!(class(400), TransformError::Permanent(_)));
        assert!(matches!(class(401), TransformError::Permanent(_)));
    }

    #[test]
    fn test_config_from_toml() {
        let config: TranslateConfig =
            toml::from_str("provider = \"openai\"\ntarget_suffix = \"ja\"").unwrap();
        assert_eq!(config.provider, Provider::OpenAi);
        assert_eq!(config.target_suffix, "ja");
        assert_eq!(config.delay_ms, 2_000);
    }
}

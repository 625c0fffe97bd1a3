#![allow(dead_code)]

use std::cell::RefCell;
use std::time::Duration;

use page_translate::error::TransformError;
use page_translate::mapper::PatchMapper;
use page_translate::mapping::FlatMapping;
use page_translate::policy::{EligibilityPolicy, PolicyConfig};
use page_translate::redact::{RedactConfig, Redaction};
use page_translate::retry::RetryConfig;
use page_translate::transfer::TransferSettings;
use page_translate::translate::{Translation, TranslateSettings, Translator};
use serde_json::{json, Value};

/// A site page shaped like the CMS returns it.
pub fn sample_page() -> Value {
    json!({
        "id": "123",
        "createdAt": "2024-01-01T00:00:00Z",
        "slug": "about",
        "state": "PUBLISHED",
        "name": "About us",
        "htmlTitle": "About us | Acme",
        "metaDescription": "Who we are",
        "layoutSections": {
            "dnd_area": {
                "label": "Main section",
                "rows": [
                    {"0": {
                        "name": "row-0",
                        "rows": [{"0": {"label": "Dynamic row label"}}],
                        "params": {"html": "<p>x</p>", "content_type": "module"}
                    }}
                ]
            }
        },
        "widgets": {
            "hero": {"body": {"title": "Welcome", "css_class": "hero", "text": "Lorem ipsum dolor"}}
        }
    })
}

/// Source keys the default policy collects from [`sample_page`].
pub const SAMPLE_KEYS: &[&str] = &[
    "root.htmlTitle",
    "root.metaDescription",
    "root.layoutSections.dnd_area.label",
    "root.layoutSections.dnd_area.rows[0].0.params.content_type",
    "root.widgets.hero.body.title",
];

pub fn mapping(pairs: &[(&str, &str)]) -> FlatMapping {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

pub fn fast_retry() -> RetryConfig {
    RetryConfig {
        max_attempts: 3,
        initial_backoff_ms: 10,
        max_backoff_ms: 40,
        backoff_multiplier: 2.0,
    }
}

pub fn hubspot_settings() -> TransferSettings {
    TransferSettings::new(
        EligibilityPolicy::new(&PolicyConfig::default()).unwrap(),
        PatchMapper::new("_th").unwrap(),
        Redaction::new(&RedactConfig::default()).unwrap(),
    )
    .with_root_label("root")
    .with_retry(fast_retry())
}

pub fn quick_translate_settings() -> TranslateSettings {
    TranslateSettings::new("English", "Thai")
        .with_delays(Duration::ZERO, Duration::ZERO)
        .with_retry(fast_retry())
}

/// Upper-cases text. Texts listed in `broken` always fail permanently.
#[derive(Default)]
pub struct Upper {
    pub broken: Vec<String>,
    pub calls: RefCell<Vec<String>>,
}

impl Upper {
    pub fn failing_on(texts: &[&str]) -> Self {
        Self {
            broken: texts.iter().map(|t| t.to_string()).collect(),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl Translator for Upper {
    fn translate(&self, text: &str, _: &str, _: &str) -> Result<Translation, TransformError> {
        self.calls.borrow_mut().push(text.to_string());
        if self.broken.iter().any(|b| b == text) {
            return Err(TransformError::Permanent(format!("cannot translate {text:?}")));
        }
        Ok(Translation::Text(text.to_uppercase()))
    }
}

/// Returns the input unchanged.
pub struct Identity;

impl Translator for Identity {
    fn translate(&self, text: &str, _: &str, _: &str) -> Result<Translation, TransformError> {
        Ok(Translation::Text(text.to_string()))
    }
}

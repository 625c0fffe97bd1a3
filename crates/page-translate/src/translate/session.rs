//! Drive a [`Translator`] over a source mapping.

use std::time::Duration;

use page_path::{decode, PathPattern};
use tracing::{debug, info, warn};

use super::{Translation, TranslateConfig, Translator};
use crate::error::{Error, Result, TransformError};
use crate::mapper::{MalformedKey, PatchMapper};
use crate::mapping::FlatMapping;
use crate::policy::{EligibilityPolicy, Verdict};
use crate::retry::{execute_with_backoff, RetryConfig, RetryError, Sleeper};

#[derive(Debug, Clone)]
pub struct TranslateSettings {
    pub source_lang: String,
    pub target_lang: String,
    /// Pause after every service call.
    pub delay: Duration,
    /// Pause after an entry that failed for good.
    pub failure_delay: Duration,
    pub passthrough: Vec<PathPattern>,
    pub retry: RetryConfig,
}

impl TranslateSettings {
    pub fn new(source_lang: impl Into<String>, target_lang: impl Into<String>) -> Self {
        Self {
            source_lang: source_lang.into(),
            target_lang: target_lang.into(),
            delay: Duration::from_secs(2),
            failure_delay: Duration::from_secs(5),
            passthrough: Vec::new(),
            retry: RetryConfig::default(),
        }
    }

    pub fn from_config(config: &TranslateConfig, retry: &RetryConfig) -> Result<Self> {
        let passthrough = config
            .passthrough
            .iter()
            .map(|p| PathPattern::parse(p).map_err(|e| Error::malformed(p.as_str(), e)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            source_lang: config.source_lang.clone(),
            target_lang: config.target_lang.clone(),
            delay: Duration::from_millis(config.delay_ms),
            failure_delay: Duration::from_millis(config.failure_delay_ms),
            passthrough,
            retry: retry.clone(),
        })
    }

    pub fn with_delays(mut self, delay: Duration, failure_delay: Duration) -> Self {
        self.delay = delay;
        self.failure_delay = failure_delay;
        self
    }

    pub fn with_passthrough(mut self, pattern: PathPattern) -> Self {
        self.passthrough.push(pattern);
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

/// An entry the service could not translate within the retry budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedEntry {
    pub key: String,
    pub error: RetryError<TransformError>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslateReport {
    pub translated: usize,
    /// Passthrough entries copied unchanged.
    pub copied: usize,
    /// Entries already present in the transformed mapping.
    pub resumed: usize,
    /// Entries the service answered with nothing.
    pub skipped: usize,
    pub ineligible: usize,
    pub failed: Vec<FailedEntry>,
    pub malformed: Vec<MalformedKey>,
}

enum Plan {
    Resumed,
    Malformed(page_path::PathError),
    Passthrough,
    Ineligible(Verdict),
    Translate,
}

pub struct TranslationSession<'a> {
    translator: &'a dyn Translator,
    sleeper: &'a dyn Sleeper,
    mapper: PatchMapper,
    policy: EligibilityPolicy,
    settings: TranslateSettings,
}

impl<'a> TranslationSession<'a> {
    pub fn new(
        translator: &'a dyn Translator,
        sleeper: &'a dyn Sleeper,
        mapper: PatchMapper,
        settings: TranslateSettings,
    ) -> Self {
        Self {
            translator,
            sleeper,
            mapper,
            policy: EligibilityPolicy::permissive(),
            settings,
        }
    }

    pub fn with_policy(mut self, policy: EligibilityPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn mapper(&self) -> &PatchMapper {
        &self.mapper
    }

    fn plan(&self, key: &str, value: &str, target: &FlatMapping) -> Plan {
        if target.contains_key(&self.mapper.mark(key)) {
            return Plan::Resumed;
        }
        let path = match decode(key) {
            Ok(path) => path,
            Err(err) => return Plan::Malformed(err),
        };
        if self.settings.passthrough.iter().any(|p| p.matches_suffix(&path)) {
            return Plan::Passthrough;
        }
        match self.policy.verdict(&path, &serde_json::Value::String(value.to_string())) {
            Verdict::Eligible => Plan::Translate,
            verdict => Plan::Ineligible(verdict),
        }
    }

    /// Number of entries a [`run`](Self::run) would still write.
    pub fn pending(&self, source: &FlatMapping, target: &FlatMapping) -> usize {
        source
            .iter()
            .filter(|(key, value)| {
                matches!(
                    self.plan(key, value, target),
                    Plan::Passthrough | Plan::Translate
                )
            })
            .count()
    }

    /// Translate every pending entry of `source` into `target`.
    ///
    /// `persist` is called after each entry written to `target`. Service
    /// failures are reported per entry; only a `persist` error stops the run.
    pub fn run(
        &self,
        source: &FlatMapping,
        target: &mut FlatMapping,
        persist: &mut dyn FnMut(&FlatMapping) -> Result<()>,
    ) -> Result<TranslateReport> {
        let mut report = TranslateReport::default();
        let total = source.len();
        for (position, (key, value)) in source.iter().enumerate() {
            match self.plan(key, value, target) {
                Plan::Resumed => report.resumed += 1,
                Plan::Malformed(error) => {
                    warn!(key, %error, "skipping malformed source key");
                    report.malformed.push(MalformedKey {
                        key: key.to_string(),
                        error,
                    });
                }
                Plan::Ineligible(verdict) => {
                    debug!(key, ?verdict, "not translated");
                    report.ineligible += 1;
                }
                Plan::Passthrough => {
                    debug!(key, "copied without translating");
                    target.insert(self.mapper.mark(key), value);
                    report.copied += 1;
                    persist(target)?;
                }
                Plan::Translate => {
                    info!(key, entry = position + 1, total, "translating");
                    match self.translate_one(value) {
                        Ok(Translation::Text(text)) => {
                            target.insert(self.mapper.mark(key), text);
                            report.translated += 1;
                            persist(target)?;
                            self.sleeper.sleep(self.settings.delay);
                        }
                        Ok(Translation::Skip) => {
                            warn!(key, "empty translation, skipping");
                            report.skipped += 1;
                            self.sleeper.sleep(self.settings.delay);
                        }
                        Err(error) => {
                            warn!(key, %error, "translation failed");
                            report.failed.push(FailedEntry {
                                key: key.to_string(),
                                error,
                            });
                            self.sleeper.sleep(self.settings.failure_delay);
                        }
                    }
                }
            }
        }
        info!(
            translated = report.translated,
            copied = report.copied,
            resumed = report.resumed,
            failed = report.failed.len(),
            "translation pass finished"
        );
        Ok(report)
    }

    fn translate_one(&self, text: &str) -> Result<Translation, RetryError<TransformError>> {
        execute_with_backoff(&self.settings.retry, self.sleeper, "translate", || {
            self.translator
                .translate(text, &self.settings.source_lang, &self.settings.target_lang)
        })
    }
}

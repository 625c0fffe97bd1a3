//! Run configuration: an optional TOML file, then environment overrides.
//!
//! Secrets and the page id come only from the environment.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::hubspot::HubSpotConfig;
use crate::mapper::PatchMapper;
use crate::policy::{EligibilityPolicy, PolicyConfig};
use crate::redact::{RedactConfig, Redaction};
use crate::retry::RetryConfig;
use crate::transfer::TransferSettings;
use crate::translate::{TranslateConfig, TranslateSettings};

pub const DEFAULT_CONFIG_FILENAME: &str = "page-translate.toml";
pub const SOURCE_ARTIFACT: &str = "hubspot_translatable_content.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MappingConfig {
    /// First field of every flattened path; empty for none.
    pub root_label: String,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            root_label: "root".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    /// Directory for the mapping artifacts.
    pub work_dir: PathBuf,
    /// Page backups before write-back; relative to `work_dir`.
    pub backup_dir: Option<PathBuf>,
    /// Explicit transformed mapping file.
    pub translated: Option<PathBuf>,
    /// Remove both mapping artifacts after a successful update.
    pub delete_artifacts: bool,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("."),
            backup_dir: Some(PathBuf::from("backups")),
            translated: None,
            delete_artifacts: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub hubspot: HubSpotConfig,
    pub translate: TranslateConfig,
    pub mapping: MappingConfig,
    pub policy: PolicyConfig,
    pub redact: RedactConfig,
    pub retry: RetryConfig,
    pub paths: PathsConfig,
}

impl Config {
    /// Load `path`, or `page-translate.toml` in the working directory if it
    /// exists, or the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILENAME);
                if !default.exists() {
                    debug!("no config file, using defaults");
                    return Ok(Self::default());
                }
                default
            }
        };
        let text = fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
        let config = Self::parse(&text)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn parse(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.translate.target_suffix.trim().is_empty() {
            return Err(Error::Config("translate.target_suffix must not be empty".into()));
        }
        Ok(())
    }

    /// Apply `TARGET_LANG_SUFFIX` and `TRANSLATED_JSON`. Returns the keys used.
    pub fn apply_env(&mut self, env: &HashMap<String, String>) -> Result<Vec<&'static str>> {
        let mut used = Vec::new();
        if let Some(value) = env.get("TARGET_LANG_SUFFIX") {
            self.translate.target_suffix = value.trim().to_string();
            used.push("TARGET_LANG_SUFFIX");
        }
        if let Some(value) = env.get("TRANSLATED_JSON").filter(|v| !v.is_empty()) {
            self.paths.translated = Some(PathBuf::from(value));
            used.push("TRANSLATED_JSON");
        }
        self.validate()?;
        Ok(used)
    }

    pub fn marker(&self) -> String {
        format!("_{}", self.translate.target_suffix.trim())
    }

    pub fn source_artifact(&self) -> PathBuf {
        self.paths.work_dir.join(SOURCE_ARTIFACT)
    }

    pub fn translated_artifact(&self) -> PathBuf {
        match &self.paths.translated {
            Some(path) => path.clone(),
            None => self.paths.work_dir.join(format!(
                "hubspot_translated_{}.json",
                self.translate.target_suffix.trim()
            )),
        }
    }

    /// Mapping read by `update`: the transformed artifact, or the source
    /// artifact when no transformed one exists yet.
    pub fn update_input(&self) -> PathBuf {
        let translated = self.translated_artifact();
        if self.paths.translated.is_some() || translated.exists() {
            translated
        } else {
            self.source_artifact()
        }
    }

    pub fn backup_dir(&self) -> Option<PathBuf> {
        self.paths.backup_dir.as_ref().map(|dir| self.paths.work_dir.join(dir))
    }

    pub fn policy(&self) -> Result<EligibilityPolicy> {
        EligibilityPolicy::new(&self.policy)
    }

    pub fn mapper(&self) -> Result<PatchMapper> {
        Ok(PatchMapper::new(self.marker())?.with_root_label(self.mapping.root_label.as_str()))
    }

    pub fn transfer_settings(&self) -> Result<TransferSettings> {
        let mut settings = TransferSettings::new(
            self.policy()?,
            PatchMapper::new(self.marker())?,
            Redaction::new(&self.redact)?,
        )
        .with_root_label(self.mapping.root_label.as_str())
        .with_retry(self.retry.clone());
        if let Some(dir) = self.backup_dir() {
            settings = settings.with_backup_dir(dir);
        }
        Ok(settings)
    }

    pub fn translate_settings(&self) -> Result<TranslateSettings> {
        TranslateSettings::from_config(&self.translate, &self.retry)
    }
}

/// Secrets and per-run ids read from the environment.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub hubspot_token: Option<String>,
    pub gemini_key: Option<String>,
    pub openai_key: Option<String>,
    pub page_id: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let set = |v: &Option<String>| if v.is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("Credentials")
            .field("hubspot_token", &set(&self.hubspot_token))
            .field("gemini_key", &set(&self.gemini_key))
            .field("openai_key", &set(&self.openai_key))
            .field("page_id", &self.page_id)
            .finish()
    }
}

impl Credentials {
    pub fn from_env(env: &HashMap<String, String>) -> Self {
        let first = |keys: &[&str]| -> Option<String> {
            keys.iter()
                .filter_map(|k| env.get(*k))
                .map(|v| v.trim())
                .find(|v| !v.is_empty())
                .map(str::to_string)
        };
        Self {
            hubspot_token: first(&["HUBSPOT_API_KEY", "HUBSPOT_PRIVATE_APP_TOKEN"]),
            gemini_key: first(&["GEMINI_API_KEY"]),
            openai_key: first(&["GPT_API_KEY", "OPENAI_API_KEY"]),
            page_id: first(&["PAGE_ID"]),
        }
    }

    pub fn hubspot_token(&self) -> Result<&str> {
        self.hubspot_token
            .as_deref()
            .ok_or_else(|| Error::Config("HUBSPOT_API_KEY is not set".into()))
    }

    pub fn translator_key(&self, provider: crate::translate::Provider) -> Result<&str> {
        use crate::translate::Provider;
        match provider {
            Provider::Gemini => self
                .gemini_key
                .as_deref()
                .ok_or_else(|| Error::Config("GEMINI_API_KEY is not set".into())),
            Provider::OpenAi => self
                .openai_key
                .as_deref()
                .ok_or_else(|| Error::Config("GPT_API_KEY is not set".into())),
        }
    }
}

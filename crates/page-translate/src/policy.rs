//! Eligibility policy: which leaves are collected for translation.
//!
//! Checks run in a fixed order and stop at the first failure:
//!
//! 1. path: exclusion patterns (matched against the tail of the path), then
//!    the key include/exclude lists (matched against the last field name);
//! 2. type: only strings are text;
//! 3. placeholder patterns;
//! 4. minimum length.

use page_path::{Path, PathPattern};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// Result of evaluating a leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Eligible,
    ExcludedPath,
    ExcludedKey,
    NotText,
    Placeholder,
    TooShort,
}

impl Verdict {
    pub fn is_eligible(self) -> bool {
        self == Verdict::Eligible
    }
}

/// Serializable policy options.
///
/// `Default` reproduces the extraction rules used for HubSpot pages; see
/// [`PolicyConfig::permissive`] for a policy that only drops empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PolicyConfig {
    /// Strings shorter than this (in chars) are ineligible.
    pub min_length: usize,
    /// Measure length after trimming whitespace.
    pub trim: bool,
    /// Regexes; a match anywhere in the value makes it ineligible.
    pub placeholder_patterns: Vec<String>,
    /// Path suffix patterns that are never eligible.
    pub path_exclusions: Vec<String>,
    /// Case-insensitive substrings the last key must contain. Empty accepts all.
    pub key_includes: Vec<String>,
    /// Case-insensitive substrings the last key must not contain.
    pub key_excludes: Vec<String>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        let strings =
            |items: &[&str]| -> Vec<String> { items.iter().map(|s| s.to_string()).collect() };
        Self {
            min_length: 1,
            trim: true,
            placeholder_patterns: strings(&[r"(?i)^\s*lorem ipsum"]),
            path_exclusions: strings(&["rows[*].0.rows[0].0.label"]),
            key_includes: strings(&[
                "text",
                "heading",
                "title",
                "label",
                "content",
                "value",
                "placeholder",
                "caption",
                "alt",
                "description",
            ]),
            key_excludes: strings(&["script", "style", "css", "path"]),
        }
    }
}

impl PolicyConfig {
    /// Only empty strings are excluded.
    pub fn permissive() -> Self {
        Self {
            min_length: 1,
            trim: false,
            placeholder_patterns: Vec::new(),
            path_exclusions: Vec::new(),
            key_includes: Vec::new(),
            key_excludes: Vec::new(),
        }
    }
}

/// Compiled eligibility policy.
#[derive(Debug, Clone)]
pub struct EligibilityPolicy {
    min_length: usize,
    trim: bool,
    placeholders: Vec<Regex>,
    path_exclusions: Vec<PathPattern>,
    key_includes: Vec<String>,
    key_excludes: Vec<String>,
}

impl Default for EligibilityPolicy {
    fn default() -> Self {
        Self::permissive()
    }
}

impl EligibilityPolicy {
    /// Compile a policy from its options.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] for an invalid regex, [`Error::MalformedPath`] for an
    /// invalid exclusion pattern.
    pub fn new(config: &PolicyConfig) -> Result<Self> {
        let placeholders = config
            .placeholder_patterns
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| Error::Config(format!("placeholder pattern {p:?}: {e}")))
            })
            .collect::<Result<Vec<_>>>()?;
        let path_exclusions = config
            .path_exclusions
            .iter()
            .map(|p| PathPattern::parse(p).map_err(|e| Error::malformed(p.as_str(), e)))
            .collect::<Result<Vec<_>>>()?;
        let lower =
            |items: &[String]| -> Vec<String> { items.iter().map(|s| s.to_lowercase()).collect() };
        Ok(Self {
            min_length: config.min_length,
            trim: config.trim,
            placeholders,
            path_exclusions,
            key_includes: lower(&config.key_includes),
            key_excludes: lower(&config.key_excludes),
        })
    }

    /// Accept every non-empty string.
    pub fn permissive() -> Self {
        Self {
            min_length: 1,
            trim: false,
            placeholders: Vec::new(),
            path_exclusions: Vec::new(),
            key_includes: Vec::new(),
            key_excludes: Vec::new(),
        }
    }

    pub fn with_min_length(mut self, min_length: usize) -> Self {
        self.min_length = min_length;
        self
    }

    pub fn with_placeholder(mut self, pattern: Regex) -> Self {
        self.placeholders.push(pattern);
        self
    }

    pub fn with_path_exclusion(mut self, pattern: PathPattern) -> Self {
        self.path_exclusions.push(pattern);
        self
    }

    /// Evaluate a leaf at `path`.
    ///
    /// # Example
    ///
    /// ```
    /// use page_path::decode;
    /// use page_translate::policy::{EligibilityPolicy, PolicyConfig, Verdict};
    /// use serde_json::json;
    ///
    /// let policy = EligibilityPolicy::new(&PolicyConfig::default()).unwrap();
    /// let title = decode("root.widgets.hero.title").unwrap();
    /// assert_eq!(policy.verdict(&title, &json!("Welcome")), Verdict::Eligible);
    /// assert_eq!(policy.verdict(&title, &json!("Lorem ipsum dolor")), Verdict::Placeholder);
    /// assert_eq!(policy.verdict(&title, &json!("   ")), Verdict::TooShort);
    /// assert_eq!(policy.verdict(&title, &json!(3)), Verdict::NotText);
    ///
    /// let css = decode("root.widgets.hero.css_class").unwrap();
    /// assert_eq!(policy.verdict(&css, &json!("big")), Verdict::ExcludedKey);
    /// ```
    pub fn verdict(&self, path: &Path, value: &Value) -> Verdict {
        if self.path_exclusions.iter().any(|p| p.matches_suffix(path)) {
            return Verdict::ExcludedPath;
        }
        if !self.key_allowed(path) {
            return Verdict::ExcludedKey;
        }
        let Value::String(text) = value else {
            return Verdict::NotText;
        };
        if self.placeholders.iter().any(|re| re.is_match(text)) {
            return Verdict::Placeholder;
        }
        let measured = if self.trim { text.trim() } else { text.as_str() };
        if measured.chars().count() < self.min_length {
            return Verdict::TooShort;
        }
        Verdict::Eligible
    }

    pub fn is_eligible(&self, path: &Path, value: &Value) -> bool {
        self.verdict(path, value).is_eligible()
    }

    fn key_allowed(&self, path: &Path) -> bool {
        if self.key_includes.is_empty() && self.key_excludes.is_empty() {
            return true;
        }
        let key = path.last_field().unwrap_or_default().to_lowercase();
        let included =
            self.key_includes.is_empty() || self.key_includes.iter().any(|kw| key.contains(kw));
        included && !self.key_excludes.iter().any(|kw| key.contains(kw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use page_path::decode;
    use serde_json::json;

    fn path(text: &str) -> Path {
        decode(text).unwrap()
    }

    #[test]
    fn test_permissive_drops_only_empty_and_non_text() {
        let policy = EligibilityPolicy::permissive();
        assert_eq!(policy.verdict(&path("a"), &json!("x")), Verdict::Eligible);
        assert_eq!(policy.verdict(&path("a"), &json!(" ")), Verdict::Eligible);
        assert_eq!(policy.verdict(&path("a"), &json!("")), Verdict::TooShort);
        assert_eq!(policy.verdict(&path("a"), &json!(true)), Verdict::NotText);
        assert_eq!(policy.verdict(&path("a"), &json!(1.5)), Verdict::NotText);
        assert_eq!(policy.verdict(&path("a"), &Value::Null), Verdict::NotText);
    }

    #[test]
    fn test_path_exclusion_runs_before_content_checks() {
        let policy = EligibilityPolicy::permissive()
            .with_path_exclusion(PathPattern::parse("rows[*].0.rows[0].0.label").unwrap())
            .with_placeholder(Regex::new("TODO").unwrap());
        let excluded = path("root.rows[5].0.rows[0].0.label");
        // Both the path and the placeholder would fail; the path check wins.
        assert_eq!(policy.verdict(&excluded, &json!("TODO")), Verdict::ExcludedPath);
        assert_eq!(
            policy.verdict(&path("root.rows[5].0.rows[1].0.label"), &json!("TODO")),
            Verdict::Placeholder
        );
    }

    #[test]
    fn test_placeholder_runs_before_length() {
        let policy = EligibilityPolicy::permissive()
            .with_min_length(10)
            .with_placeholder(Regex::new("(?i)lorem").unwrap());
        assert_eq!(policy.verdict(&path("a"), &json!("Lorem")), Verdict::Placeholder);
        assert_eq!(policy.verdict(&path("a"), &json!("short")), Verdict::TooShort);
    }

    #[test]
    fn test_min_length_counts_chars_not_bytes() {
        let policy = EligibilityPolicy::permissive().with_min_length(3);
        assert_eq!(policy.verdict(&path("a"), &json!("ไทย")), Verdict::Eligible);
        assert_eq!(policy.verdict(&path("a"), &json!("ab")), Verdict::TooShort);
    }

    #[test]
    fn test_default_key_rules() {
        let policy = EligibilityPolicy::new(&PolicyConfig::default()).unwrap();
        let v = json!("Some words");
        assert!(policy.is_eligible(&path("root.pageTitle"), &v));
        assert!(policy.is_eligible(&path("root.metaDescription"), &v));
        assert!(policy.is_eligible(&path("root.widgets.x.body.html_content"), &v));
        assert!(!policy.is_eligible(&path("root.widgets.x.body.html"), &v));
        assert!(!policy.is_eligible(&path("root.widgets.x.stylesheet_text"), &v));
        assert!(!policy.is_eligible(&path("root.widgets.x.image_path_alt"), &v));
    }

    #[test]
    fn test_key_rules_use_array_field_name() {
        let config = PolicyConfig {
            key_includes: vec!["tags".into()],
            ..PolicyConfig::permissive()
        };
        let policy = EligibilityPolicy::new(&config).unwrap();
        assert!(policy.is_eligible(&path("post.tags[2]"), &json!("news")));
        assert!(!policy.is_eligible(&path("post.slug"), &json!("news")));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let bad_regex = PolicyConfig {
            placeholder_patterns: vec!["(".into()],
            ..PolicyConfig::permissive()
        };
        assert!(matches!(
            EligibilityPolicy::new(&bad_regex),
            Err(Error::Config(_))
        ));

        let bad_pattern = PolicyConfig {
            path_exclusions: vec!["rows[".into()],
            ..PolicyConfig::permissive()
        };
        assert!(matches!(
            EligibilityPolicy::new(&bad_pattern),
            Err(Error::MalformedPath { .. })
        ));
    }
}

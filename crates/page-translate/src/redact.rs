//! Redaction filter: drop store-managed fields before a write-back.

use page_path::{Path, PathPattern, Step};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{Error, Result};

/// Fields the page store owns and rejects (or silently overrides) on update.
pub const HUBSPOT_MANAGED_FIELDS: &[&str] = &[
    "id",
    "createdAt",
    "updatedAt",
    "archived",
    "archivedAt",
    "authorName",
    "categoryId",
    "contentTypeCategory",
    "domain",
    "state",
    "currentState",
    "slug",
    "createdById",
    "updatedById",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RedactConfig {
    /// Path patterns; every subtree whose path matches one is removed.
    pub managed_fields: Vec<String>,
}

impl Default for RedactConfig {
    fn default() -> Self {
        Self {
            managed_fields: HUBSPOT_MANAGED_FIELDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Compiled set of managed-field patterns.
#[derive(Debug, Clone, Default)]
pub struct Redaction {
    patterns: Vec<PathPattern>,
}

impl Redaction {
    /// # Errors
    ///
    /// [`Error::MalformedPath`] for a pattern that does not parse,
    /// [`Error::Config`] for an empty one.
    pub fn new(config: &RedactConfig) -> Result<Self> {
        let patterns = config
            .managed_fields
            .iter()
            .map(|text| -> Result<PathPattern> {
                let pattern = PathPattern::parse(text).map_err(|e| Error::malformed(text.as_str(), e))?;
                if pattern.is_empty() {
                    return Err(Error::Config("empty managed field pattern".into()));
                }
                Ok(pattern.with_wildcard_indices())
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    pub fn from_patterns(patterns: impl IntoIterator<Item = PathPattern>) -> Self {
        Self {
            patterns: patterns.into_iter().map(PathPattern::with_wildcard_indices).collect(),
        }
    }

    pub fn patterns(&self) -> &[PathPattern] {
        &self.patterns
    }

    /// Copy of `tree` without managed subtrees, plus how many were removed.
    pub fn redact(&self, tree: &Value) -> (Value, usize) {
        let mut removed = 0;
        let mut path = Path::root();
        let out = self.copy(tree, &mut path, &mut removed);
        (out, removed)
    }

    fn is_managed(&self, path: &Path) -> bool {
        self.patterns.iter().any(|p| p.matches(path))
    }

    fn copy(&self, node: &Value, path: &mut Path, removed: &mut usize) -> Value {
        match node {
            Value::Object(map) => {
                let mut out = Map::new();
                for (key, child) in map {
                    if let Some(kept) = self.copy_child(Step::Field(key.clone()), child, path, removed) {
                        out.insert(key.clone(), kept);
                    }
                }
                Value::Object(out)
            }
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .enumerate()
                    .filter_map(|(idx, child)| self.copy_child(Step::Index(idx), child, path, removed))
                    .collect(),
            ),
            leaf => leaf.clone(),
        }
    }

    fn copy_child(
        &self,
        step: Step,
        child: &Value,
        path: &mut Path,
        removed: &mut usize,
    ) -> Option<Value> {
        // No pattern can name a step that has no path form.
        if path.push(step).is_err() {
            return Some(child.clone());
        }
        let kept = if self.is_managed(path) {
            debug!(%path, "redacted");
            *removed += 1;
            None
        } else {
            Some(self.copy(child, path, removed))
        };
        path.pop();
        kept
    }
}

/// Copy of `tree` with every subtree matching one of `patterns` removed.
///
/// Indices in the patterns match any index.
///
/// # Example
///
/// ```
/// use page_path::PathPattern;
/// use page_translate::redact::redact;
/// use serde_json::json;
///
/// let tree = json!({"id": 1, "createdAt": "2024-01-01", "content": {"title": "Hi"}});
/// let patterns = ["id", "createdAt"].map(|p| PathPattern::parse(p).unwrap());
/// assert_eq!(redact(&tree, &patterns), json!({"content": {"title": "Hi"}}));
/// ```
pub fn redact(tree: &Value, patterns: &[PathPattern]) -> Value {
    Redaction::from_patterns(patterns.iter().cloned()).redact(tree).0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_hubspot_fields() {
        let redaction = Redaction::new(&RedactConfig::default()).unwrap();
        let page = json!({
            "id": "123",
            "slug": "about",
            "state": "PUBLISHED",
            "name": "About",
            "layoutSections": {"dnd_area": {"label": "Main"}},
            "widgets": {"hero": {"id": "keep-me"}}
        });
        let (out, removed) = redaction.redact(&page);
        assert_eq!(removed, 3);
        assert_eq!(
            out,
            json!({
                "name": "About",
                "layoutSections": {"dnd_area": {"label": "Main"}},
                "widgets": {"hero": {"id": "keep-me"}}
            })
        );
    }

    #[test]
    fn test_indices_match_any_element() {
        let tree = json!({"rows": [{"id": 1, "x": "a"}, {"id": 2, "x": "b"}]});
        let patterns = [PathPattern::parse("rows[0].id").unwrap()];
        assert_eq!(
            redact(&tree, &patterns),
            json!({"rows": [{"x": "a"}, {"x": "b"}]})
        );
    }

    #[test]
    fn test_whole_subtree_removed_once() {
        let tree = json!({"audit": {"createdAt": 1, "by": {"id": 2}}, "keep": true});
        let redaction = Redaction::from_patterns([PathPattern::parse("audit").unwrap()]);
        let (out, removed) = redaction.redact(&tree);
        assert_eq!(out, json!({"keep": true}));
        assert_eq!(removed, 1);
    }

    #[test]
    fn test_nothing_matches() {
        let tree = json!({"a": [1, 2, {"b": null}]});
        let (out, removed) = Redaction::new(&RedactConfig::default()).unwrap().redact(&tree);
        assert_eq!(out, tree);
        assert_eq!(removed, 0);
    }

    #[test]
    fn test_invalid_patterns_rejected() {
        let bad = RedactConfig {
            managed_fields: vec!["a[".into()],
        };
        assert!(matches!(Redaction::new(&bad), Err(Error::MalformedPath { .. })));
        let empty = RedactConfig {
            managed_fields: vec![String::new()],
        };
        assert!(matches!(Redaction::new(&empty), Err(Error::Config(_))));
    }
}

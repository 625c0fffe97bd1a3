//! Patch mapper: from marked keys of a transformed mapping to destination
//! paths.
//!
//! A transformed key is the source path text with a fixed marker appended,
//! e.g. `root.rows[0].0.label_th`. Keys without the marker belong to another
//! variant (or to nothing) and are skipped, not reported as errors.

use page_path::{decode, Path, PathError, Step};
use serde_json::Value;
use tracing::warn;

use crate::error::{Error, Result};
use crate::mapping::FlatMapping;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(Path),
    NotMarked,
}

/// Strip `marker` from the end of `marked` and decode the rest.
///
/// # Example
///
/// ```
/// use page_translate::mapper::{resolve, Resolution};
///
/// let resolved = resolve("a.b[0]_th", "_th").unwrap();
/// assert_eq!(resolved, Resolution::Resolved(page_path::decode("a.b[0]").unwrap()));
/// assert_eq!(resolve("a.b[0]_ja", "_th").unwrap(), Resolution::NotMarked);
/// assert!(resolve("a.b[0_th", "_th").is_err());
/// ```
pub fn resolve(marked: &str, marker: &str) -> Result<Resolution, PathError> {
    match marked.strip_suffix(marker) {
        None => Ok(Resolution::NotMarked),
        Some(text) => decode(text).map(Resolution::Resolved),
    }
}

/// A transformed key that carried the marker but did not decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedKey {
    pub key: String,
    pub error: PathError,
}

/// Output of [`PatchMapper::resolve_all`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappedBatch {
    /// `(path, value)` pairs in mapping order.
    pub patches: Vec<(Path, Value)>,
    pub not_marked: usize,
    pub malformed: Vec<MalformedKey>,
}

/// Marker rule plus an optional root label to drop from resolved paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchMapper {
    marker: String,
    root_label: Option<String>,
}

impl PatchMapper {
    /// # Errors
    ///
    /// [`Error::Config`] if the marker is empty.
    pub fn new(marker: impl Into<String>) -> Result<Self> {
        let marker = marker.into();
        if marker.is_empty() {
            return Err(Error::Config("marker must not be empty".into()));
        }
        Ok(Self {
            marker,
            root_label: None,
        })
    }

    /// Marker for a target language code: `th` becomes `_th`.
    pub fn for_language(code: &str) -> Result<Self> {
        Self::new(format!("_{}", code.trim()))
    }

    /// Drop a leading field step named `label` from resolved paths.
    pub fn with_root_label(mut self, label: impl Into<String>) -> Self {
        let label = label.into();
        self.root_label = (!label.is_empty()).then_some(label);
        self
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Append the marker to a source key.
    pub fn mark(&self, key: &str) -> String {
        format!("{key}{}", self.marker)
    }

    /// Resolve one marked key to a destination path.
    pub fn resolve(&self, marked: &str) -> Result<Resolution, PathError> {
        match resolve(marked, &self.marker)? {
            Resolution::Resolved(path) => self.strip_root(path).map(Resolution::Resolved),
            Resolution::NotMarked => Ok(Resolution::NotMarked),
        }
    }

    fn strip_root(&self, path: Path) -> Result<Path, PathError> {
        match (&self.root_label, path.steps().first()) {
            (Some(label), Some(Step::Field(first))) if first == label => path.skip(1),
            _ => Ok(path),
        }
    }

    /// Resolve every entry of a transformed mapping.
    pub fn resolve_all(&self, mapping: &FlatMapping) -> MappedBatch {
        let mut batch = MappedBatch::default();
        for (key, value) in mapping.iter() {
            match self.resolve(key) {
                Ok(Resolution::Resolved(path)) => {
                    batch.patches.push((path, Value::String(value.to_string())));
                }
                Ok(Resolution::NotMarked) => batch.not_marked += 1,
                Err(error) => {
                    warn!(key, %error, "skipping malformed transformed key");
                    batch.malformed.push(MalformedKey {
                        key: key.to_string(),
                        error,
                    });
                }
            }
        }
        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use page_path::MalformedKind;

    #[test]
    fn test_empty_marker_rejected() {
        assert!(matches!(PatchMapper::new(""), Err(Error::Config(_))));
        assert_eq!(PatchMapper::for_language(" th ").unwrap().marker(), "_th");
    }

    #[test]
    fn test_marker_must_be_at_the_end() {
        assert_eq!(resolve("a_th.b", "_th").unwrap(), Resolution::NotMarked);
    }

    #[test]
    fn test_stripped_text_equals_path_text() {
        let marked = "root.rows[3].0.params.label_th";
        match resolve(marked, "_th").unwrap() {
            Resolution::Resolved(path) => assert_eq!(path.to_string(), "root.rows[3].0.params.label"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_malformed_after_strip() {
        assert_eq!(
            resolve("a[x]_th", "_th"),
            Err(PathError::Malformed {
                at: 1,
                kind: MalformedKind::InvalidIndex
            })
        );
    }

    #[test]
    fn test_root_label_is_dropped() {
        let mapper = PatchMapper::new("_th").unwrap().with_root_label("root");
        assert_eq!(
            mapper.resolve("root.widgets.title_th").unwrap(),
            Resolution::Resolved(decode("widgets.title").unwrap())
        );
        // Paths without the label are used as they are.
        assert_eq!(
            mapper.resolve("widgets.title_th").unwrap(),
            Resolution::Resolved(decode("widgets.title").unwrap())
        );
        // A root-level array cannot be addressed once the label is gone.
        assert_eq!(mapper.resolve("root[0]_th"), Err(PathError::OrphanIndex));
    }

    #[test]
    fn test_resolve_all_partitions_entries() {
        let mapping: FlatMapping = [
            ("root.a_th", "A"),
            ("root.b_ja", "B"),
            ("root.c[0]_th", "C"),
            ("root.d[_th", "D"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let mapper = PatchMapper::new("_th").unwrap().with_root_label("root");
        let batch = mapper.resolve_all(&mapping);

        let paths: Vec<String> = batch.patches.iter().map(|(p, _)| p.to_string()).collect();
        assert_eq!(paths, vec!["a", "c[0]"]);
        assert_eq!(batch.patches[1].1, Value::String("C".into()));
        assert_eq!(batch.not_marked, 1);
        assert_eq!(batch.malformed.len(), 1);
        assert_eq!(batch.malformed[0].key, "root.d[_th");
    }
}

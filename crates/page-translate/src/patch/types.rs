use page_path::{LookupMiss, Path};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UnresolvedReason {
    #[error(transparent)]
    Lookup(#[from] LookupMiss),
    #[error("target is an object or array")]
    NotALeaf,
    #[error("new value is an object or array")]
    ValueNotScalar,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchResult {
    Applied,
    Unresolved(UnresolvedReason),
}

impl PatchResult {
    pub fn is_applied(&self) -> bool {
        matches!(self, PatchResult::Applied)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedEntry {
    pub path: Path,
    pub reason: UnresolvedReason,
}

/// Summary of one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchReport {
    pub applied: usize,
    pub unresolved: Vec<UnresolvedEntry>,
    /// Paths that appeared more than once; the last value was kept.
    pub duplicates: Vec<Path>,
}

impl PatchReport {
    pub fn is_clean(&self) -> bool {
        self.unresolved.is_empty() && self.duplicates.is_empty()
    }
}

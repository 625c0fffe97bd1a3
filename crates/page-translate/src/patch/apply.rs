use std::collections::HashSet;

use page_path::{find_mut, Path};
use serde_json::Value;
use tracing::{debug, warn};

use super::types::{PatchReport, PatchResult, UnresolvedEntry, UnresolvedReason};

fn is_container(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Array(_))
}

/// Overwrite the scalar leaf at `path` with `value`.
///
/// # Example
///
/// ```
/// use page_path::decode;
/// use page_translate::patch::{apply, PatchResult};
/// use serde_json::json;
///
/// let mut tree = json!({"a": {"b": ["x", "y"]}});
/// let result = apply(&mut tree, &decode("a.b[0]").unwrap(), json!("new"));
/// assert_eq!(result, PatchResult::Applied);
/// assert_eq!(tree, json!({"a": {"b": ["new", "y"]}}));
///
/// let result = apply(&mut tree, &decode("a.c").unwrap(), json!("v"));
/// assert!(!result.is_applied());
/// assert_eq!(tree, json!({"a": {"b": ["new", "y"]}}));
/// ```
pub fn apply(tree: &mut Value, path: &Path, value: Value) -> PatchResult {
    if is_container(&value) {
        return PatchResult::Unresolved(UnresolvedReason::ValueNotScalar);
    }
    match find_mut(tree, path) {
        Err(miss) => PatchResult::Unresolved(miss.into()),
        Ok(target) if is_container(target) => PatchResult::Unresolved(UnresolvedReason::NotALeaf),
        Ok(target) => {
            *target = value;
            PatchResult::Applied
        }
    }
}

/// Apply every `(path, value)` pair in order.
///
/// Patches touch distinct leaves and never change structure, so the order
/// only matters for duplicate paths, where the last one wins.
pub fn apply_batch<I>(tree: &mut Value, batch: I) -> PatchReport
where
    I: IntoIterator<Item = (Path, Value)>,
{
    let mut report = PatchReport::default();
    let mut seen = HashSet::new();
    for (path, value) in batch {
        match apply(tree, &path, value) {
            PatchResult::Applied => {
                debug!(%path, "applied");
                report.applied += 1;
                if !seen.insert(path.clone()) {
                    warn!(%path, "duplicate path, keeping the last value");
                    report.duplicates.push(path);
                }
            }
            PatchResult::Unresolved(reason) => {
                warn!(%path, %reason, "unresolved");
                report.unresolved.push(UnresolvedEntry { path, reason });
            }
        }
    }
    report
}

/// [`apply_batch`] on a copy of `tree`.
pub fn patched<I>(tree: &Value, batch: I) -> (Value, PatchReport)
where
    I: IntoIterator<Item = (Path, Value)>,
{
    let mut out = tree.clone();
    let report = apply_batch(&mut out, batch);
    (out, report)
}

use serde_json::Value;

use crate::types::{Path, Step};
use crate::LookupMiss;

/// Find a value in a JSON tree by path.
///
/// Unlike [`get`](crate::get), the error says which step failed and why.
///
/// # Errors
///
/// - [`LookupMiss::MissingField`] - an object has no such key
/// - [`LookupMiss::IndexOutOfBounds`] - an array is too short
/// - [`LookupMiss::TypeMismatch`] - a field step met an array or a scalar, or
///   an index step met an object or a scalar
///
/// # Example
///
/// ```
/// use page_path::{decode, find, LookupMiss};
/// use serde_json::json;
///
/// let doc = json!({"a": {"b": ["x", "y"]}});
/// assert_eq!(find(&doc, &decode("a.b[1]").unwrap()), Ok(&json!("y")));
/// assert_eq!(
///     find(&doc, &decode("a.b[2]").unwrap()),
///     Err(LookupMiss::IndexOutOfBounds { depth: 2, len: 2 })
/// );
/// ```
pub fn find<'a>(val: &'a Value, path: &Path) -> Result<&'a Value, LookupMiss> {
    let mut current = val;
    for (depth, step) in path.steps().iter().enumerate() {
        current = match (current, step) {
            (Value::Object(map), Step::Field(name)) => map
                .get(name)
                .ok_or(LookupMiss::MissingField { depth })?,
            (Value::Array(arr), Step::Index(idx)) => arr.get(*idx).ok_or(
                LookupMiss::IndexOutOfBounds {
                    depth,
                    len: arr.len(),
                },
            )?,
            _ => return Err(LookupMiss::TypeMismatch { depth }),
        };
    }
    Ok(current)
}

/// Mutable counterpart of [`find`].
pub fn find_mut<'a>(val: &'a mut Value, path: &Path) -> Result<&'a mut Value, LookupMiss> {
    let mut current = val;
    for (depth, step) in path.steps().iter().enumerate() {
        current = match (current, step) {
            (Value::Object(map), Step::Field(name)) => map
                .get_mut(name)
                .ok_or(LookupMiss::MissingField { depth })?,
            (Value::Array(arr), Step::Index(idx)) => {
                let len = arr.len();
                arr.get_mut(*idx)
                    .ok_or(LookupMiss::IndexOutOfBounds { depth, len })?
            }
            _ => return Err(LookupMiss::TypeMismatch { depth }),
        };
    }
    Ok(current)
}

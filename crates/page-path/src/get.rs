use serde_json::Value;

use crate::find::{find, find_mut};
use crate::types::Path;

/// Get a value from a JSON tree by path.
///
/// Returns `None` if the path doesn't resolve.
///
/// # Example
///
/// ```
/// use page_path::{decode, get};
/// use serde_json::json;
///
/// let doc = json!({"foo": {"bar": [10, 20]}});
/// assert_eq!(get(&doc, &decode("foo.bar[1]").unwrap()), Some(&json!(20)));
/// assert_eq!(get(&doc, &decode("foo.baz").unwrap()), None);
/// ```
pub fn get<'a>(val: &'a Value, path: &Path) -> Option<&'a Value> {
    find(val, path).ok()
}

/// Get a mutable reference to a value in a JSON tree by path.
pub fn get_mut<'a>(val: &'a mut Value, path: &Path) -> Option<&'a mut Value> {
    find_mut(val, path).ok()
}

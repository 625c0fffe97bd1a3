//! Non-extending tree patcher.
//!
//! A patch overwrites an existing scalar leaf and nothing else: it never
//! adds keys or elements and never replaces an object or array. Anything
//! else is reported as [`PatchResult::Unresolved`] with the tree untouched.

pub mod apply;
pub mod types;

pub use apply::{apply, apply_batch, patched};
pub use types::{PatchReport, PatchResult, UnresolvedEntry, UnresolvedReason};

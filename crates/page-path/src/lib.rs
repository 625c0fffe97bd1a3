//! Canonical dotted paths into JSON trees.
//!
//! A [`Path`] is a sequence of [`Step`]s, each an object key or an array
//! position, with one canonical text form:
//!
//! ```text
//! root.rows[0].0.params.label
//! ```
//!
//! Fields are joined by `.`, indices are appended to the field naming the
//! array. The codec is exact: `decode(encode(p)) == p` for every path, and no
//! two paths share a spelling.
//!
//! # Example
//!
//! ```
//! use page_path::{decode, encode, get, PathPattern};
//!
//! let path = decode("a.b[0]").unwrap();
//! assert_eq!(encode(&path), "a.b[0]");
//!
//! let doc = serde_json::json!({"a": {"b": ["x", "y"]}});
//! assert_eq!(get(&doc, &path), Some(&serde_json::json!("x")));
//!
//! let pattern: PathPattern = "b[*]".parse().unwrap();
//! assert!(pattern.matches_suffix(&path));
//! ```

use std::fmt;

use thiserror::Error;

pub mod codec;
pub mod find;
pub mod get;
pub mod pattern;
pub mod types;

pub use codec::{decode, encode, escape_field, is_valid_index};
pub use find::{find, find_mut};
pub use get::{get, get_mut};
pub use pattern::{PathPattern, StepPattern};
pub use types::{Path, Step};

/// What made a path string unparseable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedKind {
    /// `[` without `]`, or a bracket where none may appear.
    UnbalancedBracket,
    /// Bracket contents are not a canonical non-negative integer.
    InvalidIndex,
    /// A `.`-separated segment has no field name.
    EmptyField,
    /// An index directly follows another index (`a[0][1]`).
    NestedIndex,
    /// The path starts with an index instead of a field.
    LeadingIndex,
    /// A backslash not followed by an escapable character.
    InvalidEscape,
    /// Characters after an index that are neither `.` nor the end.
    TrailingInput,
}

impl fmt::Display for MalformedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            MalformedKind::UnbalancedBracket => "unbalanced bracket",
            MalformedKind::InvalidIndex => "invalid array index",
            MalformedKind::EmptyField => "empty field name",
            MalformedKind::NestedIndex => "index directly after an index",
            MalformedKind::LeadingIndex => "path starts with an index",
            MalformedKind::InvalidEscape => "invalid escape sequence",
            MalformedKind::TrailingInput => "unexpected input after index",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("malformed path at byte {at}: {kind}")]
    Malformed { at: usize, kind: MalformedKind },
    #[error("field name must not be empty")]
    EmptyField,
    #[error("index step must directly follow a field step")]
    OrphanIndex,
}

/// Why a path did not resolve against a tree. `depth` is the position of the
/// failing step.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum LookupMiss {
    #[error("no such field at step {depth}")]
    MissingField { depth: usize },
    #[error("index out of bounds at step {depth} (length {len})")]
    IndexOutOfBounds { depth: usize, len: usize },
    #[error("step {depth} does not fit the container type")]
    TypeMismatch { depth: usize },
}

impl LookupMiss {
    pub fn depth(&self) -> usize {
        match self {
            LookupMiss::MissingField { depth }
            | LookupMiss::IndexOutOfBounds { depth, .. }
            | LookupMiss::TypeMismatch { depth } => *depth,
        }
    }
}

//! Type definitions for structural paths.

use std::fmt;
use std::str::FromStr;

use crate::codec;
use crate::PathError;

/// A step in a [`Path`].
///
/// Either an object key or an array position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Step {
    /// Object key. Never empty.
    Field(String),
    /// Array position.
    Index(usize),
}

impl Step {
    /// The key name if this is a field step.
    pub fn as_field(&self) -> Option<&str> {
        match self {
            Step::Field(name) => Some(name),
            Step::Index(_) => None,
        }
    }

    /// The position if this is an index step.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Step::Field(_) => None,
            Step::Index(idx) => Some(*idx),
        }
    }

    pub fn is_index(&self) -> bool {
        matches!(self, Step::Index(_))
    }
}

/// A structural address into a JSON tree.
///
/// A path is a sequence of [`Step`]s that always satisfies the shape the
/// textual codec can express:
///
/// - the first step, if any, is a field;
/// - an index step directly follows a field step, never another index;
/// - field names are non-empty.
///
/// The empty path addresses the root of the tree.
///
/// # Example
///
/// ```
/// use page_path::{Path, Step};
///
/// let mut path = Path::root();
/// path.push_field("rows").unwrap();
/// path.push_index(0).unwrap();
/// path.push_field("label").unwrap();
///
/// assert_eq!(path.to_string(), "rows[0].label");
/// assert_eq!(path.last(), Some(&Step::Field("label".into())));
/// assert!(path.push_index(1).is_ok());
/// assert!(path.push_index(2).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Path {
    steps: Vec<Step>,
}

impl Path {
    /// The root path (no steps).
    pub fn root() -> Self {
        Self { steps: Vec::new() }
    }

    /// Build a path from raw steps, checking the shape invariants.
    pub fn from_steps(steps: Vec<Step>) -> Result<Self, PathError> {
        let mut path = Self::root();
        for step in steps {
            path.push(step)?;
        }
        Ok(path)
    }

    /// Append a step, checking the shape invariants.
    pub fn push(&mut self, step: Step) -> Result<(), PathError> {
        match step {
            Step::Field(name) => self.push_field(name),
            Step::Index(idx) => self.push_index(idx),
        }
    }

    /// Append an object key.
    pub fn push_field(&mut self, name: impl Into<String>) -> Result<(), PathError> {
        let name = name.into();
        if name.is_empty() {
            return Err(PathError::EmptyField);
        }
        self.steps.push(Step::Field(name));
        Ok(())
    }

    /// Append an array position. Fails unless the last step is a field.
    pub fn push_index(&mut self, idx: usize) -> Result<(), PathError> {
        match self.steps.last() {
            Some(Step::Field(_)) => {
                self.steps.push(Step::Index(idx));
                Ok(())
            }
            _ => Err(PathError::OrphanIndex),
        }
    }

    /// Remove and return the last step.
    pub fn pop(&mut self) -> Option<Step> {
        self.steps.pop()
    }

    /// A copy of this path extended by one step.
    pub fn child(&self, step: Step) -> Result<Self, PathError> {
        let mut out = self.clone();
        out.push(step)?;
        Ok(out)
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_root(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn last(&self) -> Option<&Step> {
        self.steps.last()
    }

    /// Name of the nearest field step, counting from the end.
    ///
    /// For `rows[2]` this is `rows`; for `rows[2].label` it is `label`.
    pub fn last_field(&self) -> Option<&str> {
        self.steps.iter().rev().find_map(Step::as_field)
    }

    /// The path without its last step, or `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        if self.steps.is_empty() {
            return None;
        }
        Some(Self {
            steps: self.steps[..self.steps.len() - 1].to_vec(),
        })
    }

    /// Check if `prefix` is a (non-strict) prefix of this path.
    pub fn starts_with(&self, prefix: &Path) -> bool {
        self.steps.starts_with(&prefix.steps)
    }

    /// Drop the first `count` steps.
    ///
    /// Fails if the remainder would start with an index step.
    pub fn skip(&self, count: usize) -> Result<Self, PathError> {
        let rest = self.steps.get(count..).unwrap_or(&[]);
        Self::from_steps(rest.to_vec())
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&codec::encode(self))
    }
}

impl FromStr for Path {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        codec::decode(s)
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a Step;
    type IntoIter = std::slice::Iter<'a, Step>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

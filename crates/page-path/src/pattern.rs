//! Path patterns.
//!
//! A pattern is written like a path. A field segment that is exactly `*`
//! matches any key (write `\*` for a literal star) and `[*]` matches any
//! position. Patterns may begin with an index segment, since they are often
//! matched against the tail of a path.

use std::fmt;
use std::str::FromStr;

use crate::codec::{self, Mode, Token};
use crate::types::{Path, Step};
use crate::PathError;

/// Matcher for a single [`Step`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StepPattern {
    Field(String),
    AnyField,
    Index(usize),
    AnyIndex,
}

impl StepPattern {
    fn matches(&self, step: &Step, wildcard_indices: bool) -> bool {
        match (self, step) {
            (StepPattern::Field(want), Step::Field(name)) => want == name,
            (StepPattern::AnyField, Step::Field(_)) => true,
            (StepPattern::Index(want), Step::Index(idx)) => wildcard_indices || want == idx,
            (StepPattern::AnyIndex, Step::Index(_)) => true,
            _ => false,
        }
    }
}

/// A parsed path pattern.
///
/// # Example
///
/// ```
/// use page_path::{decode, PathPattern};
///
/// let pattern: PathPattern = "rows[*].0.label".parse().unwrap();
/// let path = decode("root.rows[3].0.label").unwrap();
/// assert!(pattern.matches_suffix(&path));
/// assert!(!pattern.matches(&path));
///
/// let managed = PathPattern::parse("widgets[0].id").unwrap().with_wildcard_indices();
/// assert!(managed.matches(&decode("widgets[7].id").unwrap()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathPattern {
    steps: Vec<StepPattern>,
    wildcard_indices: bool,
}

impl PathPattern {
    /// Parse a pattern string.
    pub fn parse(text: &str) -> Result<Self, PathError> {
        let mut steps = Vec::new();
        for token in codec::tokenize(text, Mode::Pattern)? {
            let step = match token {
                Token::Field { name, escaped } if name == "*" && !escaped => StepPattern::AnyField,
                Token::Field { name, .. } => StepPattern::Field(name),
                Token::Index { raw, .. } if raw == "*" => StepPattern::AnyIndex,
                Token::Index { raw, at } => StepPattern::Index(codec::parse_index(&raw, at)?),
            };
            steps.push(step);
        }
        Ok(Self {
            steps,
            wildcard_indices: false,
        })
    }

    /// Treat every concrete index in the pattern as `[*]`.
    pub fn with_wildcard_indices(mut self) -> Self {
        self.wildcard_indices = true;
        self
    }

    pub fn steps(&self) -> &[StepPattern] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    fn matches_slice(&self, steps: &[Step]) -> bool {
        self.steps
            .iter()
            .zip(steps)
            .all(|(pattern, step)| pattern.matches(step, self.wildcard_indices))
    }

    /// The whole path matches the whole pattern.
    pub fn matches(&self, path: &Path) -> bool {
        self.steps.len() == path.len() && self.matches_slice(path.steps())
    }

    /// The last `self.len()` steps of the path match the pattern.
    ///
    /// The empty pattern matches nothing.
    pub fn matches_suffix(&self, path: &Path) -> bool {
        if self.steps.is_empty() || self.steps.len() > path.len() {
            return false;
        }
        self.matches_slice(&path.steps()[path.len() - self.steps.len()..])
    }

    /// The first `self.len()` steps of the path match the pattern.
    ///
    /// The empty pattern matches nothing.
    pub fn matches_prefix(&self, path: &Path) -> bool {
        if self.steps.is_empty() || self.steps.len() > path.len() {
            return false;
        }
        self.matches_slice(&path.steps()[..self.steps.len()])
    }
}

impl FromStr for PathPattern {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            match step {
                StepPattern::Field(name) => {
                    if i > 0 {
                        f.write_str(".")?;
                    }
                    if name == "*" {
                        f.write_str("\\*")?;
                    } else {
                        f.write_str(&codec::escape_field(name))?;
                    }
                }
                StepPattern::AnyField => {
                    if i > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str("*")?;
                }
                StepPattern::Index(idx) => write!(f, "[{idx}]")?,
                StepPattern::AnyIndex => f.write_str("[*]")?,
            }
        }
        Ok(())
    }
}

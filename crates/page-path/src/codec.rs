//! Textual form of [`Path`]s.
//!
//! Fields are joined by `.`, an index is appended to the field naming the
//! array as `name[position]`. Inside a field name the characters `.`, `[`,
//! `]` and `\` are escaped with a backslash so that every path has exactly
//! one spelling.

use std::borrow::Cow;
use std::fmt::Write as _;
use std::iter::Peekable;
use std::str::CharIndices;

use crate::types::{Path, Step};
use crate::{MalformedKind, PathError};

/// Grammar variant accepted by [`tokenize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    Path,
    Pattern,
}

/// A raw segment before it is interpreted as a step or a step pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    Field { name: String, escaped: bool },
    Index { raw: String, at: usize },
}

fn malformed(at: usize, kind: MalformedKind) -> PathError {
    PathError::Malformed { at, kind }
}

fn is_escapable(ch: char, mode: Mode) -> bool {
    matches!(ch, '.' | '[' | ']' | '\\') || (mode == Mode::Pattern && ch == '*')
}

/// Escapes a field name for use in a path string.
///
/// # Example
///
/// ```
/// use page_path::escape_field;
///
/// assert_eq!(escape_field("label"), "label");
/// assert_eq!(escape_field("a.b"), "a\\.b");
/// assert_eq!(escape_field("x[0]"), "x\\[0\\]");
/// ```
pub fn escape_field(name: &str) -> Cow<'_, str> {
    if !name.contains(['.', '[', ']', '\\']) {
        return Cow::Borrowed(name);
    }
    let mut out = String::with_capacity(name.len() + 2);
    for ch in name.chars() {
        if is_escapable(ch, Mode::Path) {
            out.push('\\');
        }
        out.push(ch);
    }
    Cow::Owned(out)
}

/// Check if a string is a canonical array position: ASCII digits, no
/// leading zero unless the position is `0` itself.
///
/// # Example
///
/// ```
/// use page_path::is_valid_index;
///
/// assert!(is_valid_index("0"));
/// assert!(is_valid_index("123"));
/// assert!(!is_valid_index("01"));
/// assert!(!is_valid_index("-1"));
/// assert!(!is_valid_index(""));
/// ```
pub fn is_valid_index(index: &str) -> bool {
    if index.is_empty() {
        return false;
    }
    let bytes = index.as_bytes();
    if bytes.len() > 1 && bytes[0] == b'0' {
        return false;
    }
    bytes.iter().all(|&b| b.is_ascii_digit())
}

/// Render a path in its canonical textual form.
///
/// # Example
///
/// ```
/// use page_path::{encode, Path, Step};
///
/// let path = Path::from_steps(vec![
///     Step::Field("root".into()),
///     Step::Field("rows".into()),
///     Step::Index(0),
///     Step::Field("0".into()),
///     Step::Field("label".into()),
/// ]).unwrap();
/// assert_eq!(encode(&path), "root.rows[0].0.label");
/// assert_eq!(encode(&Path::root()), "");
/// ```
pub fn encode(path: &Path) -> String {
    let mut out = String::new();
    for step in path {
        match step {
            Step::Field(name) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(&escape_field(name));
            }
            Step::Index(idx) => {
                let _ = write!(out, "[{idx}]");
            }
        }
    }
    out
}

/// Parse the canonical textual form back into a path.
///
/// # Errors
///
/// Returns [`PathError::Malformed`] for unbalanced brackets, non-canonical
/// indices, empty field names, an index following another index, a leading
/// index, or a stray backslash.
///
/// # Example
///
/// ```
/// use page_path::{decode, MalformedKind, PathError, Step};
///
/// let path = decode("a.b[1].c").unwrap();
/// assert_eq!(path.steps()[2], Step::Index(1));
///
/// assert!(matches!(
///     decode("a.b[1"),
///     Err(PathError::Malformed { kind: MalformedKind::UnbalancedBracket, .. })
/// ));
/// assert!(matches!(
///     decode("a.b[x]"),
///     Err(PathError::Malformed { kind: MalformedKind::InvalidIndex, .. })
/// ));
/// ```
pub fn decode(text: &str) -> Result<Path, PathError> {
    let mut steps = Vec::new();
    for token in tokenize(text, Mode::Path)? {
        match token {
            Token::Field { name, .. } => steps.push(Step::Field(name)),
            Token::Index { raw, at } => steps.push(Step::Index(parse_index(&raw, at)?)),
        }
    }
    Path::from_steps(steps)
}

pub(crate) fn parse_index(raw: &str, at: usize) -> Result<usize, PathError> {
    if !is_valid_index(raw) {
        return Err(malformed(at, MalformedKind::InvalidIndex));
    }
    raw.parse()
        .map_err(|_| malformed(at, MalformedKind::InvalidIndex))
}

/// Split path text into field and index tokens.
///
/// Enforces the structural grammar shared by paths and path patterns: each
/// `.`-separated segment is a non-empty field name optionally followed by a
/// single `[...]` index. Pattern mode additionally admits a leading index
/// segment and the `\*` escape.
pub(crate) fn tokenize(text: &str, mode: Mode) -> Result<Vec<Token>, PathError> {
    let mut tokens = Vec::new();
    if text.is_empty() {
        return Ok(tokens);
    }
    let mut chars = text.char_indices().peekable();
    loop {
        let seg_start = chars.peek().map_or(text.len(), |&(at, _)| at);
        let (name, escaped) = read_field(&mut chars, mode)?;

        if name.is_empty() {
            let leading_index = seg_start == 0 && matches!(chars.peek(), Some((_, '[')));
            if !(leading_index && mode == Mode::Pattern) {
                let kind = if leading_index {
                    MalformedKind::LeadingIndex
                } else {
                    MalformedKind::EmptyField
                };
                return Err(malformed(seg_start, kind));
            }
        } else {
            tokens.push(Token::Field { name, escaped });
        }

        if let Some(&(open, '[')) = chars.peek() {
            chars.next();
            let raw = read_index(&mut chars, open)?;
            tokens.push(Token::Index { raw, at: open });
        }

        match chars.next() {
            None => return Ok(tokens),
            Some((_, '.')) => {}
            Some((at, '[')) => return Err(malformed(at, MalformedKind::NestedIndex)),
            Some((at, _)) => return Err(malformed(at, MalformedKind::TrailingInput)),
        }
    }
}

fn read_field(
    chars: &mut Peekable<CharIndices<'_>>,
    mode: Mode,
) -> Result<(String, bool), PathError> {
    let mut name = String::new();
    let mut escaped = false;
    while let Some(&(at, ch)) = chars.peek() {
        match ch {
            '.' | '[' => break,
            ']' => return Err(malformed(at, MalformedKind::UnbalancedBracket)),
            '\\' => {
                chars.next();
                match chars.next() {
                    Some((_, next)) if is_escapable(next, mode) => {
                        name.push(next);
                        escaped = true;
                    }
                    _ => return Err(malformed(at, MalformedKind::InvalidEscape)),
                }
            }
            _ => {
                name.push(ch);
                chars.next();
            }
        }
    }
    Ok((name, escaped))
}

fn read_index(chars: &mut Peekable<CharIndices<'_>>, open: usize) -> Result<String, PathError> {
    let mut raw = String::new();
    loop {
        match chars.next() {
            Some((_, ']')) => return Ok(raw),
            Some((at, '[')) => return Err(malformed(at, MalformedKind::UnbalancedBracket)),
            Some((_, ch)) => raw.push(ch),
            None => return Err(malformed(open, MalformedKind::UnbalancedBracket)),
        }
    }
}

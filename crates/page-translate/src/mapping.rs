//! Flat mapping documents: ordered `path text -> string` records.
//!
//! On disk a mapping is a pretty-printed UTF-8 JSON object, one key per
//! entry, keys in insertion order, non-ASCII written verbatim.

use std::fs;
use std::path::Path as FsPath;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::flatten::FlatEntry;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlatMapping {
    entries: IndexMap<String, String>,
}

impl FlatMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace. A replaced key keeps its original position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Read a mapping document.
    pub fn load(path: &FsPath) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        serde_json::from_str(&text).map_err(|e| Error::json(path, e))
    }

    /// Read a mapping document, or an empty mapping if the file is missing.
    pub fn load_or_default(path: &FsPath) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        Self::load(path)
    }

    /// Write the mapping, creating parent directories as needed.
    pub fn save(&self, path: &FsPath) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        let mut text = serde_json::to_string_pretty(self).map_err(|e| Error::json(path, e))?;
        text.push('\n');
        fs::write(path, text).map_err(|e| Error::io(path, e))
    }
}

impl FromIterator<(String, String)> for FlatMapping {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a> FromIterator<&'a FlatEntry> for FlatMapping {
    fn from_iter<T: IntoIterator<Item = &'a FlatEntry>>(iter: T) -> Self {
        iter.into_iter()
            .map(|entry| (entry.path.to_string(), entry.value.clone()))
            .collect()
    }
}

//! Page store seams: where trees come from and where they go back to.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use serde_json::Value;

use crate::error::TransferError;

/// Provides the tree of a document.
pub trait PageSource {
    fn fetch(&self, document: &str) -> Result<Value, TransferError>;
}

/// Accepts a partial update for a document.
pub trait PageSink {
    fn update(&self, document: &str, body: &Value) -> Result<(), TransferError>;
}

#[derive(Debug, Default)]
struct MemoryState {
    pages: HashMap<String, Value>,
    fetch_failures: VecDeque<TransferError>,
    update_failures: VecDeque<TransferError>,
    updates: Vec<(String, Value)>,
    fetches: usize,
}

/// In-memory page store.
///
/// Updates merge top-level fields into the stored page, like a PATCH.
/// Queued failures are returned, oldest first, before calls start to succeed.
#[derive(Debug, Default)]
pub struct MemoryPages {
    state: Mutex<MemoryState>,
}

impl MemoryPages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, document: impl Into<String>, tree: Value) -> Self {
        self.lock().pages.insert(document.into(), tree);
        self
    }

    pub fn fail_fetch(&self, error: TransferError) {
        self.lock().fetch_failures.push_back(error);
    }

    pub fn fail_update(&self, error: TransferError) {
        self.lock().update_failures.push_back(error);
    }

    pub fn page(&self, document: &str) -> Option<Value> {
        self.lock().pages.get(document).cloned()
    }

    /// Every accepted update body, in order.
    pub fn updates(&self) -> Vec<(String, Value)> {
        self.lock().updates.clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.lock().fetches
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        // A poisoned fake is still usable for assertions.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl PageSource for MemoryPages {
    fn fetch(&self, document: &str) -> Result<Value, TransferError> {
        let mut state = self.lock();
        state.fetches += 1;
        if let Some(err) = state.fetch_failures.pop_front() {
            return Err(err);
        }
        state
            .pages
            .get(document)
            .cloned()
            .ok_or_else(|| TransferError::NotFound(document.to_string()))
    }
}

impl PageSink for MemoryPages {
    fn update(&self, document: &str, body: &Value) -> Result<(), TransferError> {
        let mut state = self.lock();
        if let Some(err) = state.update_failures.pop_front() {
            return Err(err);
        }
        let page = state
            .pages
            .get_mut(document)
            .ok_or_else(|| TransferError::NotFound(document.to_string()))?;
        match (page, body) {
            (Value::Object(stored), Value::Object(fields)) => {
                for (key, value) in fields {
                    stored.insert(key.clone(), value.clone());
                }
            }
            (page, body) => *page = body.clone(),
        }
        state.updates.push((document.to_string(), body.clone()));
        Ok(())
    }
}

//! Parse cache for repeated UI strings
//!
//! UI code tends to parse the same handful of strings every frame. The cache
//! maps `(base prefix, raw text)` to a shared [`ParsedDocument`].

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use super::document::ParsedDocument;

/// Thread-safe cache of parsed documents
///
/// Concurrent misses on the same key may both parse; the last insert wins.
/// When the entry count reaches the capacity the whole cache is flushed.
pub struct ParseCache {
    /// base prefix -> raw text -> document
    entries: RwLock<HashMap<String, HashMap<String, Arc<ParsedDocument>>>>,
    /// Maximum number of documents kept
    capacity: usize,
}

impl ParseCache {
    /// Create a new empty cache
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Cached document for a key
    pub fn get(&self, base: &str, text: &str) -> Option<Arc<ParsedDocument>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(base)
            .and_then(|by_text| by_text.get(text))
            .map(Arc::clone)
    }

    /// Store a document
    pub fn insert(&self, base: &str, text: &str, document: Arc<ParsedDocument>) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);

        let count: usize = entries.values().map(HashMap::len).sum();
        if count >= self.capacity {
            log::debug!("Parse cache reached {} entries, flushing", count);
            entries.clear();
        }

        entries
            .entry(base.to_string())
            .or_default()
            .insert(text.to_string(), document);
    }

    /// Number of cached documents
    pub fn len(&self) -> usize {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.values().map(HashMap::len).sum()
    }

    /// Whether the cache holds nothing
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every cached document
    pub fn clear(&self) {
        self.entries.write().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

impl Default for ParseCache {
    fn default() -> Self {
        Self::new(4096)
    }
}

use std::rc::Rc;

use html::Document;

use crate::config::CacheConfig;

#[derive(Debug)]
pub struct CacheEntry {
    pub url: String,
    pub fragment: Rc<Document>,
    last_used: u64,
}

/// Fetched fragments keyed by exact request URL.
///
/// Unbounded by default: entries are appended and kept for the page view. With
/// `max_entries` set, the least recently used entry is evicted to make room.
#[derive(Debug, Default)]
pub struct FragmentCache {
    entries: Vec<CacheEntry>,
    max_entries: Option<usize>,
    clock: u64,
}

impl FragmentCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: Vec::new(),
            max_entries: config.max_entries.filter(|n| *n > 0),
            clock: 0,
        }
    }

    pub fn get(&mut self, url: &str) -> Option<Rc<Document>> {
        self.clock += 1;
        let clock = self.clock;
        let entry = self.entries.iter_mut().find(|e| e.url == url)?;
        entry.last_used = clock;
        Some(Rc::clone(&entry.fragment))
    }

    pub fn contains(&self, url: &str) -> bool {
        self.entries.iter().any(|e| e.url == url)
    }

    /// Stores `fragment` under `url` unless an entry already exists, and returns the
    /// cached fragment either way.
    pub fn insert(&mut self, url: String, fragment: Document) -> Rc<Document> {
        if let Some(existing) = self.get(&url) {
            return existing;
        }
        if let Some(max) = self.max_entries {
            while self.entries.len() >= max {
                self.evict_least_recent();
            }
        }
        self.clock += 1;
        let fragment = Rc::new(fragment);
        self.entries.push(CacheEntry {
            url,
            fragment: Rc::clone(&fragment),
            last_used: self.clock,
        });
        fragment
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cached URLs in insertion order.
    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.url.as_str())
    }

    fn evict_least_recent(&mut self) {
        let Some(index) = self
            .entries
            .iter()
            .enumerate()
            .min_by_key(|(_, e)| e.last_used)
            .map(|(i, _)| i)
        else {
            return;
        };
        let evicted = self.entries.remove(index);
        log::debug!(target: "facets::cache", "evicted {}", evicted.url);
    }
}

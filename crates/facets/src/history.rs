/// State stored with each pushed history entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryState {
    pub search_params: String,
}

/// The page's path and search string (without the leading `?`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Location {
    pub path: String,
    pub search: String,
}

impl Location {
    /// Splits `path[?search][#hash]`; the hash is dropped.
    pub fn parse(path_and_query: &str) -> Self {
        let without_hash = path_and_query
            .split_once('#')
            .map_or(path_and_query, |(before, _)| before);
        match without_hash.split_once('?') {
            Some((path, search)) => Self {
                path: path.to_string(),
                search: search.to_string(),
            },
            None => Self {
                path: without_hash.to_string(),
                search: String::new(),
            },
        }
    }

    pub fn href(&self) -> String {
        with_search(&self.path, &self.search)
    }
}

/// `path` plus `?search` when the search is non-empty.
pub fn with_search(path: &str, search: &str) -> String {
    if search.is_empty() {
        path.to_string()
    } else {
        format!("{path}?{search}")
    }
}

/// A traversal to another history entry, as delivered by `popstate`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PopState {
    pub state: Option<HistoryState>,
    pub url: String,
}

pub trait History {
    fn push_state(&mut self, state: HistoryState, url: &str);
    fn back(&mut self) -> Option<PopState>;
    fn forward(&mut self) -> Option<PopState>;
}

/// In-memory session history: a list of entries and a cursor.
#[derive(Clone, Debug)]
pub struct SessionHistory {
    entries: Vec<(Option<HistoryState>, String)>,
    index: usize,
}

impl SessionHistory {
    /// Starts with the initial page load, which carries no state.
    pub fn new(initial_url: &str) -> Self {
        Self {
            entries: vec![(None, initial_url.to_string())],
            index: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn current_url(&self) -> &str {
        &self.entries[self.index].1
    }

    pub fn current_state(&self) -> Option<&HistoryState> {
        self.entries[self.index].0.as_ref()
    }

    fn pop_state(&self) -> PopState {
        let (state, url) = &self.entries[self.index];
        PopState {
            state: state.clone(),
            url: url.clone(),
        }
    }
}

impl History for SessionHistory {
    fn push_state(&mut self, state: HistoryState, url: &str) {
        // truncate the forward branch
        self.entries.truncate(self.index + 1);
        self.entries.push((Some(state), url.to_string()));
        self.index = self.entries.len() - 1;
    }

    fn back(&mut self) -> Option<PopState> {
        if self.index == 0 {
            return None;
        }
        self.index -= 1;
        Some(self.pop_state())
    }

    fn forward(&mut self) -> Option<PopState> {
        if self.index + 1 >= self.entries.len() {
            return None;
        }
        self.index += 1;
        Some(self.pop_state())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(s: &str) -> HistoryState {
        HistoryState {
            search_params: s.to_string(),
        }
    }

    #[test]
    fn location_splits_path_and_search() {
        let loc = Location::parse("/collections/all?sort_by=best-selling#top");
        assert_eq!(loc.path, "/collections/all");
        assert_eq!(loc.search, "sort_by=best-selling");
        assert_eq!(loc.href(), "/collections/all?sort_by=best-selling");
        assert_eq!(Location::parse("/collections/all").href(), "/collections/all");
    }

    #[test]
    fn push_truncates_forward_entries() {
        let mut h = SessionHistory::new("/c");
        h.push_state(state("a=1"), "/c?a=1");
        h.push_state(state("a=2"), "/c?a=2");
        assert_eq!(h.back().map(|p| p.url), Some("/c?a=1".to_string()));
        h.push_state(state("a=3"), "/c?a=3");
        assert_eq!(h.len(), 3);
        assert_eq!(h.forward(), None);
        assert_eq!(h.current_url(), "/c?a=3");
    }

    #[test]
    fn initial_entry_has_no_state() {
        let mut h = SessionHistory::new("/c?sort_by=title");
        h.push_state(state("x=1"), "/c?x=1");
        let pop = h.back().unwrap();
        assert_eq!(pop.state, None);
        assert_eq!(pop.url, "/c?sort_by=title");
        assert_eq!(h.back(), None);
    }
}

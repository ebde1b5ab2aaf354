use std::collections::HashSet;

/// Identifiers already emitted within one feed session.
#[derive(Debug, Clone, Default)]
pub struct DedupTracker {
    seen: HashSet<String>,
}

impl DedupTracker {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn seen(&self, identifier: &str) -> bool {
        self.seen.contains(identifier)
    }
    /// Records the identifier, returning `false` if it was already seen.
    pub fn record(&mut self, identifier: &str) -> bool {
        if self.seen(identifier) {
            return false;
        }
        self.seen.insert(identifier.to_string())
    }
    pub fn reset(&mut self) {
        self.seen.clear();
    }
    pub fn len(&self) -> usize {
        self.seen.len()
    }
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

impl<'a> FromIterator<&'a str> for DedupTracker {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        Self {
            seen: iter.into_iter().map(String::from).collect(),
        }
    }
}

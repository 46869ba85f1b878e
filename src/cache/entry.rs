//! Cache Entry Module
//!
//! Defines the contents of a single cache slot.

// == Cache Entry ==
/// Contents of one cache slot.
///
/// Entries are never destroyed individually. An unallocated entry is an
/// empty slot waiting to be claimed; eviction overwrites in place.
#[derive(Debug, Clone, Default)]
pub struct CacheEntry {
    /// Request URI the body was fetched for
    pub uri: String,
    /// Response bytes exactly as relayed to the client
    pub body: Vec<u8>,
    /// Whether the slot currently holds valid data
    pub allocated: bool,
    /// LRU rank, higher = more recently written
    pub recency: i64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an empty, unallocated slot.
    pub fn empty() -> Self {
        Self::default()
    }

    // == Matches ==
    /// Returns true if the slot holds valid data for `uri`.
    pub fn matches(&self, uri: &str) -> bool {
        self.allocated && self.uri == uri
    }

    // == Overwrite ==
    /// Replaces key and body, marking the slot allocated.
    ///
    /// Reuses the existing buffers so a slot keeps its allocation across evictions.
    pub fn overwrite(&mut self, uri: &str, body: &[u8]) {
        self.uri.clear();
        self.uri.push_str(uri);
        self.body.clear();
        self.body.extend_from_slice(body);
        self.allocated = true;
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_entry() {
        let entry = CacheEntry::empty();

        assert!(!entry.allocated);
        assert!(entry.uri.is_empty());
        assert!(entry.body.is_empty());
        assert_eq!(entry.recency, 0);
    }

    #[test]
    fn test_empty_entry_never_matches() {
        let entry = CacheEntry::empty();
        assert!(!entry.matches(""));
    }

    #[test]
    fn test_overwrite_then_match() {
        let mut entry = CacheEntry::empty();
        entry.overwrite("http://example.com/a", b"hello");

        assert!(entry.allocated);
        assert!(entry.matches("http://example.com/a"));
        assert!(!entry.matches("http://example.com/b"));
        assert_eq!(entry.body, b"hello");
    }

    #[test]
    fn test_overwrite_replaces_previous_contents() {
        let mut entry = CacheEntry::empty();
        entry.overwrite("http://example.com/long", b"a much longer body");
        entry.overwrite("http://x/", b"short");

        assert_eq!(entry.uri, "http://x/");
        assert_eq!(entry.body, b"short");
    }

    #[test]
    fn test_overwrite_keeps_recency() {
        let mut entry = CacheEntry::empty();
        entry.recency = -3;
        entry.overwrite("http://example.com/", b"x");
        assert_eq!(entry.recency, -3);
    }
}

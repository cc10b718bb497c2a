use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Mutex;

/// Memo of raw response bodies keyed by request signature.
///
/// Unbounded by default: entries live as long as the cache and are never
/// expired, so memory grows with the number of distinct requests. Build it
/// with [`RequestCache::with_capacity`] to evict least-recently-used entries
/// instead. Safe to share between sessions behind an `Arc` since the key is
/// derived from the host and request content only.
#[derive(Debug)]
pub struct RequestCache {
    entries: Mutex<LruCache<String, String>>,
}

impl Default for RequestCache {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestCache {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(LruCache::unbounded()),
        }
    }

    pub fn with_capacity(capacity: NonZeroUsize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// `None` means unbounded.
    pub fn from_capacity(capacity: Option<usize>) -> Self {
        match capacity.and_then(NonZeroUsize::new) {
            Some(capacity) => Self::with_capacity(capacity),
            None => Self::new(),
        }
    }

    /// `base_url` is part of the key so clients pointed at different hosts
    /// never see each other's responses. Credentials are not.
    pub fn get_signature(base_url: &str, path: &str, query: &[(&str, &str)]) -> String {
        let query_string = query
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect::<Vec<_>>()
            .join("&");
        format!("GET {}{}?{}", base_url, path, query_string)
    }

    pub fn post_signature(base_url: &str, path: &str, body_json: &str) -> String {
        format!("POST {}{} {}", base_url, path, body_json)
    }

    pub fn get(&self, signature: &str) -> Option<String> {
        // A poisoned lock only means another caller panicked mid-insert;
        // the map itself is still consistent.
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.get(signature).cloned()
    }

    pub fn insert(&self, signature: String, body: String) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.put(signature, body);
    }

    pub fn contains(&self, signature: &str) -> bool {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.contains(signature)
    }

    pub fn len(&self) -> usize {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

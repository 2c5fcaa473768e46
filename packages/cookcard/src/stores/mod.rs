//! Storage implementations.

mod memory;

pub use memory::MemoryStore;

use sha2::{Digest, Sha256};

/// Content-addressed cache key: SHA-256 over (url, title, description).
///
/// Identical inputs always derive the same key, so a re-shared post with
/// an edited caption misses the cache while a byte-identical one hits.
pub fn cache_key(url: &str, title: &str, description: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hasher.update([0u8]);
    hasher.update(title.as_bytes());
    hasher.update([0u8]);
    hasher.update(description.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_deterministic() {
        let a = cache_key("https://example.com", "Pasta", "A recipe");
        let b = cache_key("https://example.com", "Pasta", "A recipe");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_cache_key_sensitive_to_fields() {
        let base = cache_key("https://example.com", "Pasta", "A recipe");
        assert_ne!(base, cache_key("https://example.com/x", "Pasta", "A recipe"));
        assert_ne!(base, cache_key("https://example.com", "Pasta!", "A recipe"));
        assert_ne!(base, cache_key("https://example.com", "Pasta", "Another"));
    }

    #[test]
    fn test_cache_key_field_boundaries() {
        // The separator prevents (ab, c) colliding with (a, bc)
        assert_ne!(cache_key("u", "ab", "c"), cache_key("u", "a", "bc"));
    }
}

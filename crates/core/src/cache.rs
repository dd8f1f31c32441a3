/// Bounded LRU of `text → embedding`, process-local latency optimisation
/// with no correctness role. Narrowed from the index's full-entry LRU cache
/// in this lineage down to a single text-to-vector map.
use std::num::NonZeroUsize;

use lru::LruCache;

pub struct EmbeddingCache {
    inner: LruCache<String, Vec<f32>>,
}

impl EmbeddingCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap();
        Self {
            inner: LruCache::new(capacity),
        }
    }

    pub fn get(&mut self, text: &str) -> Option<Vec<f32>> {
        self.inner.get(text).cloned()
    }

    pub fn put(&mut self, text: String, embedding: Vec<f32>) {
        self.inner.put(text, embedding);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get_round_trips() {
        let mut cache = EmbeddingCache::new(2);
        cache.put("a".to_string(), vec![1.0, 2.0]);
        assert_eq!(cache.get("a"), Some(vec![1.0, 2.0]));
    }

    #[test]
    fn evicts_least_recently_used_past_capacity() {
        let mut cache = EmbeddingCache::new(1);
        cache.put("a".to_string(), vec![1.0]);
        cache.put("b".to_string(), vec![2.0]);
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), Some(vec![2.0]));
    }
}

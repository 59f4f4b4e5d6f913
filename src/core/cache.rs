//! Time-bounded, size-bounded memoization of validation results.

use crate::core::models::ValidationResult;

use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

struct CacheEntry {
    result: ValidationResult,
    stored_at: Instant,
}

/// Results keyed by the trimmed, lower-cased company name.
///
/// Entries older than the TTL are never returned. When full, expired
/// entries are dropped first, then the least recently used one.
pub(crate) struct ResultCache {
    ttl: Duration,
    entries: Mutex<LruCache<String, CacheEntry>>,
}

pub(crate) fn normalize_key(company_name: &str) -> String {
    company_name.trim().to_lowercase()
}

impl ResultCache {
    pub(crate) fn new(ttl: Duration, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            ttl,
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub(crate) fn get(&self, company_name: &str) -> Option<ValidationResult> {
        let key = normalize_key(company_name);
        let mut entries = self.entries.lock();

        match entries.get(&key) {
            None => return None,
            Some(entry) if entry.stored_at.elapsed() < self.ttl => {
                tracing::debug!(target: "result_cache", "Cache hit for '{}'", key);
                return Some(entry.result.clone());
            }
            Some(_) => {}
        }
        entries.pop(&key);
        tracing::debug!(target: "result_cache", "Cache entry for '{}' expired", key);
        None
    }

    /// Stores `result`, replacing any existing entry for the same key.
    pub(crate) fn put(&self, company_name: &str, result: ValidationResult) {
        let key = normalize_key(company_name);
        let mut entries = self.entries.lock();

        if !entries.contains(&key) && entries.len() >= entries.cap().get() {
            self.purge_expired(&mut entries);
        }
        let entry = CacheEntry {
            result,
            stored_at: Instant::now(),
        };
        if let Some((evicted, _)) = entries.push(key.clone(), entry) {
            if evicted != key {
                tracing::debug!(target: "result_cache", "Evicted least recently used '{}'", evicted);
            }
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.lock().len()
    }

    fn purge_expired(&self, entries: &mut LruCache<String, CacheEntry>) {
        let expired: Vec<String> = entries
            .iter()
            .filter(|(_, entry)| entry.stored_at.elapsed() >= self.ttl)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            entries.pop(key);
        }
        if !expired.is_empty() {
            tracing::debug!(target: "result_cache", "Evicted {} expired entries", expired.len());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::ValidationStatus;

    fn result_for(name: &str) -> ValidationResult {
        let mut result = ValidationResult::failure(name, "unused");
        result.details.clear();
        result.status = ValidationStatus::Valid;
        result.confidence = 50;
        result
    }

    #[test]
    fn hit_within_ttl() {
        let cache = ResultCache::new(Duration::from_secs(60), 8);
        cache.put("Tesla", result_for("Tesla"));
        assert_eq!(cache.get("Tesla"), Some(result_for("Tesla")));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn keys_ignore_case_and_padding() {
        let cache = ResultCache::new(Duration::from_secs(60), 8);
        cache.put("  Tesla ", result_for("  Tesla "));
        let hit = cache.get("TESLA").unwrap();
        // The stored result keeps the first caller's spelling.
        assert_eq!(hit.company_name, "  Tesla ");
    }

    #[test]
    fn put_overwrites() {
        let cache = ResultCache::new(Duration::from_secs(60), 8);
        cache.put("tesla", result_for("tesla"));
        let mut newer = result_for("Tesla");
        newer.confidence = 95;
        cache.put("Tesla", newer);
        assert_eq!(cache.get("tesla").unwrap().confidence, 95);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn zero_ttl_never_hits() {
        let cache = ResultCache::new(Duration::ZERO, 8);
        cache.put("Tesla", result_for("Tesla"));
        assert!(cache.get("Tesla").is_none());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn full_cache_evicts_least_recently_used() {
        let cache = ResultCache::new(Duration::from_secs(60), 2);
        cache.put("alpha", result_for("alpha"));
        cache.put("beta", result_for("beta"));
        assert!(cache.get("alpha").is_some());

        cache.put("gamma", result_for("gamma"));
        assert_eq!(cache.len(), 2);
        assert!(cache.get("alpha").is_some());
        assert!(cache.get("beta").is_none());
        assert!(cache.get("gamma").is_some());
    }

    #[test]
    fn eviction_clears_all_expired_entries_first() {
        let cache = ResultCache::new(Duration::from_millis(50), 3);
        cache.put("alpha", result_for("alpha"));
        cache.put("beta", result_for("beta"));
        std::thread::sleep(Duration::from_millis(80));

        cache.put("gamma", result_for("gamma"));
        cache.put("delta", result_for("delta"));
        assert_eq!(cache.len(), 2);
        assert!(cache.get("gamma").is_some());
        assert!(cache.get("delta").is_some());
    }
}

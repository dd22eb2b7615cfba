use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::models::WebQueries;

struct CacheEntry<T> {
    value: T,
    expires_at: Instant,
    seq: u64,
}

struct CacheInner<T> {
    map: HashMap<String, CacheEntry<T>>,
    next_seq: u64,
}

/// Bounded in-process cache with per-entry expiry.
///
/// Expired entries are evicted lazily on `get`. When `set` hits capacity it
/// first sweeps all expired entries, then evicts the insertion-oldest entry,
/// so the cache never grows past `max_size`.
pub struct TtlCache<T> {
    inner: Mutex<CacheInner<T>>,
    default_ttl: Duration,
    max_size: usize,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(default_ttl: Duration, max_size: usize) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                map: HashMap::new(),
                next_seq: 0,
            }),
            default_ttl,
            max_size,
        }
    }

    pub fn get(&self, key: &str) -> Option<T> {
        let mut inner = self.inner.lock();
        let expired = inner
            .map
            .get(key)
            .map(|entry| Instant::now() > entry.expires_at)?;
        if expired {
            inner.map.remove(key);
            return None;
        }
        inner.map.get(key).map(|entry| entry.value.clone())
    }

    pub fn set(&self, key: &str, value: T) {
        self.set_with_ttl(key, value, self.default_ttl);
    }

    pub fn set_with_ttl(&self, key: &str, value: T, ttl: Duration) {
        let mut inner = self.inner.lock();

        if inner.map.len() >= self.max_size && !inner.map.contains_key(key) {
            let now = Instant::now();
            inner.map.retain(|_, entry| entry.expires_at >= now);

            if inner.map.len() >= self.max_size {
                let oldest = inner
                    .map
                    .iter()
                    .min_by_key(|(_, entry)| entry.seq)
                    .map(|(k, _)| k.clone());
                if let Some(oldest) = oldest {
                    inner.map.remove(&oldest);
                }
            }
        }

        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.map.insert(
            key.to_string(),
            CacheEntry {
                value,
                expires_at: Instant::now() + ttl,
                seq,
            },
        );
    }

    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ─── Key utilities ───────────────────────────────────────

/// Canonical form of an idea for cache keying: whitespace-collapsed,
/// lower-cased, trailing sentence punctuation stripped.
pub fn normalize_idea(idea: &str) -> String {
    let collapsed = idea
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    collapsed
        .trim_end_matches(['.', '!', '?', '。', '！', '？'])
        .to_string()
}

/// djb2 — cheap, stable, good enough for cache keys.
fn djb2(input: &str) -> u32 {
    let mut hash: u32 = 5381;
    for byte in input.bytes() {
        hash = hash.wrapping_mul(33) ^ u32::from(byte);
    }
    hash
}

fn hash_key(input: &str) -> String {
    format!("{:08x}", djb2(input))
}

pub fn classify_cache_key(idea: &str) -> String {
    format!("kw:{}", hash_key(&normalize_idea(idea)))
}

/// Deterministic under query/topic reordering: terms are sorted before
/// hashing.
pub fn github_cache_key(queries: &[String], topics: &[String]) -> String {
    let mut parts: Vec<&str> = queries
        .iter()
        .chain(topics.iter())
        .map(String::as_str)
        .collect();
    parts.sort_unstable();
    format!("gh:{}", hash_key(&parts.join("|")))
}

/// Category order is fixed, so positional joining is already deterministic.
pub fn web_cache_key(queries: &WebQueries) -> String {
    let combined = [
        queries.competitors.as_str(),
        queries.trends.as_str(),
        queries.technical.as_str(),
        queries.regional.as_deref().unwrap_or(""),
    ]
    .join("|");
    format!("web:{}", hash_key(&combined))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_round_trip() {
        let cache: TtlCache<String> = TtlCache::new(Duration::from_secs(60), 10);
        cache.set("k", "v".to_string());
        assert_eq!(cache.get("k"), Some("v".to_string()));
        assert!(cache.has("k"));
    }

    #[test]
    fn test_missing_key_absent() {
        let cache: TtlCache<u32> = TtlCache::new(Duration::from_secs(60), 10);
        assert_eq!(cache.get("nope"), None);
        assert!(!cache.has("nope"));
    }

    #[test]
    fn test_expired_entry_absent_and_evicted() {
        let cache: TtlCache<u32> = TtlCache::new(Duration::from_millis(5), 10);
        cache.set("k", 1);
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(cache.get("k"), None);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let cache: TtlCache<u32> = TtlCache::new(Duration::from_secs(60), 2);
        cache.set("a", 1);
        cache.set("b", 2);
        cache.set("c", 3);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a"), None); // oldest gone
        assert_eq!(cache.get("b"), Some(2));
        assert_eq!(cache.get("c"), Some(3));
    }

    #[test]
    fn test_capacity_sweeps_expired_first() {
        let cache: TtlCache<u32> = TtlCache::new(Duration::from_secs(60), 2);
        cache.set_with_ttl("stale", 1, Duration::from_millis(5));
        cache.set("live", 2);
        std::thread::sleep(Duration::from_millis(20));
        cache.set("new", 3);
        // The expired entry was swept, so the live one survives.
        assert_eq!(cache.get("live"), Some(2));
        assert_eq!(cache.get("new"), Some(3));
    }

    #[test]
    fn test_overwrite_does_not_evict_neighbors() {
        let cache: TtlCache<u32> = TtlCache::new(Duration::from_secs(60), 2);
        cache.set("a", 1);
        cache.set("b", 2);
        cache.set("a", 10);
        assert_eq!(cache.get("a"), Some(10));
        assert_eq!(cache.get("b"), Some(2));
    }

    #[test]
    fn test_normalize_idea() {
        assert_eq!(
            normalize_idea("  Photo   Tag\tGenerator!! "),
            "photo tag generator"
        );
        assert_eq!(normalize_idea("아이디어 검증。"), "아이디어 검증");
        assert_eq!(normalize_idea("simple"), "simple");
    }

    #[test]
    fn test_idea_key_stable_under_formatting() {
        assert_eq!(
            classify_cache_key("Photo Tag Generator."),
            classify_cache_key("  photo   tag generator ")
        );
    }

    #[test]
    fn test_github_key_stable_under_reordering() {
        let a = github_cache_key(
            &["one".into(), "two".into()],
            &["topic".into()],
        );
        let b = github_cache_key(
            &["two".into(), "one".into()],
            &["topic".into()],
        );
        assert_eq!(a, b);
        assert!(a.starts_with("gh:"));
    }

    #[test]
    fn test_github_key_differs_for_different_terms() {
        let a = github_cache_key(&["one".into()], &[]);
        let b = github_cache_key(&["other".into()], &[]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_web_key_positional() {
        let base = WebQueries {
            competitors: "a".into(),
            trends: "b".into(),
            technical: "c".into(),
            regional: None,
        };
        let mut swapped = base.clone();
        swapped.competitors = "b".into();
        swapped.trends = "a".into();
        // Categories are positional: swapping queries changes the key.
        assert_ne!(web_cache_key(&base), web_cache_key(&swapped));
        assert!(web_cache_key(&base).starts_with("web:"));
    }
}

//! TTL response cache keyed by request fingerprint.
//!
//! Expiry is lazy: a stale entry is reported as absent on read and only
//! dropped when it is overwritten, swept by `purge_expired`, or pushed out
//! by the capacity bound on insert.

use std::collections::HashMap;
use std::time::Duration;

use serde_json::Value;
use tokio::time::Instant;

use crate::http::HttpRequest;

/// Deterministic key for a logical request: method, absolute URL and the
/// serialized body. Headers do not participate.
pub fn fingerprint(request: &HttpRequest) -> String {
    format!(
        "{}:{}:{}",
        request.method,
        request.url,
        request.body.as_deref().unwrap_or("")
    )
}

#[derive(Debug, Clone)]
struct CacheEntry {
    payload: Value,
    stored_at: Instant,
}

#[derive(Debug)]
pub(crate) struct ResponseCache {
    entries: HashMap<String, CacheEntry>,
    ttl: Duration,
    max_entries: usize,
}

impl ResponseCache {
    pub(crate) fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
            max_entries,
        }
    }

    pub(crate) fn get(&self, key: &str, now: Instant) -> Option<&Value> {
        self.entries
            .get(key)
            .filter(|entry| !self.is_stale(entry, now))
            .map(|entry| &entry.payload)
    }

    pub(crate) fn insert(&mut self, key: String, payload: Value, now: Instant) {
        let bounded = self.max_entries > 0;
        if bounded && !self.entries.contains_key(&key) && self.entries.len() >= self.max_entries {
            self.purge_expired(now);
            while self.entries.len() >= self.max_entries {
                let Some(oldest) = self
                    .entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.stored_at)
                    .map(|(key, _)| key.clone())
                else {
                    break;
                };
                self.entries.remove(&oldest);
            }
        }
        self.entries.insert(
            key,
            CacheEntry {
                payload,
                stored_at: now,
            },
        );
    }

    /// Removes entries whose key contains `pattern`, or everything when
    /// `pattern` is `None`. Returns how many were removed.
    pub(crate) fn clear(&mut self, pattern: Option<&str>) -> usize {
        let before = self.entries.len();
        match pattern {
            Some(pattern) => self.entries.retain(|key, _| !key.contains(pattern)),
            None => self.entries.clear(),
        }
        before - self.entries.len()
    }

    pub(crate) fn purge_expired(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        let ttl = self.ttl;
        self.entries
            .retain(|_, entry| now.saturating_duration_since(entry.stored_at) < ttl);
        before - self.entries.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    fn is_stale(&self, entry: &CacheEntry, now: Instant) -> bool {
        now.saturating_duration_since(entry.stored_at) >= self.ttl
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::http::HttpMethod;

    const TTL: Duration = Duration::from_millis(300_000);

    fn request(method: HttpMethod, url: &str, body: Option<&str>) -> HttpRequest {
        HttpRequest {
            method,
            url: url.to_string(),
            headers: Vec::new(),
            body: body.map(str::to_string),
        }
    }

    #[test]
    fn fingerprint_ignores_headers() {
        let a = request(HttpMethod::Get, "http://h/api/history", None);
        let mut b = a.clone();
        b.headers.push(("x-trace".to_string(), "1".to_string()));
        assert_eq!(fingerprint(&a), fingerprint(&b));
        assert_eq!(fingerprint(&a), "GET:http://h/api/history:");
    }

    #[test]
    fn fingerprint_distinguishes_method_and_body() {
        let get = request(HttpMethod::Get, "http://h/api/grammar", None);
        let post = request(HttpMethod::Post, "http://h/api/grammar", Some(r#"{"q":1}"#));
        let post2 = request(HttpMethod::Post, "http://h/api/grammar", Some(r#"{"q":2}"#));
        assert_ne!(fingerprint(&get), fingerprint(&post));
        assert_ne!(fingerprint(&post), fingerprint(&post2));
    }

    #[test]
    fn entry_expires_after_ttl() {
        let start = Instant::now();
        let mut cache = ResponseCache::new(TTL, 0);
        cache.insert("k".into(), json!({"a": 1}), start);

        assert_eq!(cache.get("k", start + Duration::from_millis(299_999)), Some(&json!({"a": 1})));
        assert_eq!(cache.get("k", start + TTL), None);
        // Stale entries are not evicted by reads.
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn overwrite_refreshes_timestamp() {
        let start = Instant::now();
        let mut cache = ResponseCache::new(TTL, 0);
        cache.insert("k".into(), json!(1), start);
        cache.insert("k".into(), json!(2), start + Duration::from_millis(200_000));
        assert_eq!(cache.get("k", start + Duration::from_millis(400_000)), Some(&json!(2)));
    }

    #[test]
    fn clear_by_substring() {
        let now = Instant::now();
        let mut cache = ResponseCache::new(TTL, 0);
        cache.insert("GET:http://h/api/vocabulary/languages:".into(), json!(1), now);
        cache.insert("GET:http://h/api/history:".into(), json!(2), now);
        cache.insert("GET:http://h/api/phrasal-verbs:".into(), json!(3), now);

        assert_eq!(cache.clear(Some("vocab")), 1);
        assert_eq!(cache.len(), 2);
        assert!(cache.get("GET:http://h/api/history:", now).is_some());

        assert_eq!(cache.clear(None), 2);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn purge_drops_only_stale_entries() {
        let start = Instant::now();
        let mut cache = ResponseCache::new(TTL, 0);
        cache.insert("old".into(), json!(1), start);
        cache.insert("new".into(), json!(2), start + Duration::from_millis(250_000));
        assert_eq!(cache.purge_expired(start + Duration::from_millis(310_000)), 1);
        assert!(cache.get("new", start + Duration::from_millis(310_000)).is_some());
    }

    #[test]
    fn capacity_bound_evicts_stale_then_oldest() {
        let start = Instant::now();
        let mut cache = ResponseCache::new(TTL, 2);
        cache.insert("a".into(), json!(1), start);
        cache.insert("b".into(), json!(2), start + Duration::from_millis(10));
        cache.insert("c".into(), json!(3), start + Duration::from_millis(20));

        assert_eq!(cache.len(), 2);
        let now = start + Duration::from_millis(30);
        assert!(cache.get("a", now).is_none());
        assert!(cache.get("b", now).is_some());
        assert!(cache.get("c", now).is_some());

        // Replacing an existing key never evicts.
        cache.insert("b".into(), json!(20), now);
        assert_eq!(cache.len(), 2);
        assert!(cache.get("c", now).is_some());
    }
}

//! Result cache collaborator
//!
//! The pipeline caches the *intermediate* link tree, never final URLs:
//! gateway-issued tokens expire within hours, so the terminal resolution
//! step re-runs on every call. An expired entry is indistinguishable from
//! a miss, and empty trees are cached too so known misses are not
//! re-crawled within the TTL.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::types::{CacheEntry, MediaType};

/// Environment variable that disables caching entirely when set to "true"
pub const DISABLE_CACHE_ENV: &str = "DISABLE_CACHE";

/// Deterministic cache key for one resolution request
pub fn cache_key(
    media_id: &str,
    media_type: MediaType,
    season: Option<u32>,
    episode: Option<u32>,
) -> String {
    match (season, episode) {
        (Some(s), Some(e)) => format!("moviesmod_{}_{}_s{}e{}", media_id, media_type.as_str(), s, e),
        _ => format!("moviesmod_{}_{}", media_id, media_type.as_str()),
    }
}

/// Storage backing for resolved link trees
#[async_trait]
pub trait ResultCache: Send + Sync {
    /// Look up an entry; expired or absent both return `None`
    async fn get(&self, key: &str) -> Option<CacheEntry>;
    /// Store an entry under the cache's TTL
    async fn put(&self, key: &str, entry: CacheEntry);
}

/// In-memory TTL cache
pub struct MemoryCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, (Instant, CacheEntry)>>,
}

impl MemoryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl ResultCache for MemoryCache {
    async fn get(&self, key: &str) -> Option<CacheEntry> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some((expiry, entry)) if Instant::now() < *expiry => {
                tracing::debug!(key, "cache hit");
                Some(entry.clone())
            }
            Some(_) => {
                tracing::debug!(key, "cache entry expired");
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    async fn put(&self, key: &str, entry: CacheEntry) {
        let mut entries = self.entries.lock().await;
        entries.insert(key.to_string(), (Instant::now() + self.ttl, entry));
    }
}

/// Cache that never stores anything; used when caching is disabled
pub struct NoopCache;

#[async_trait]
impl ResultCache for NoopCache {
    async fn get(&self, _key: &str) -> Option<CacheEntry> {
        None
    }

    async fn put(&self, _key: &str, _entry: CacheEntry) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MediaInfo;

    fn entry(title: &str) -> CacheEntry {
        CacheEntry {
            qualities: vec![],
            media_info: MediaInfo {
                title: title.to_string(),
                year: None,
            },
        }
    }

    #[test]
    fn test_cache_key_movie() {
        assert_eq!(
            cache_key("603", MediaType::Movie, None, None),
            "moviesmod_603_movie"
        );
    }

    #[test]
    fn test_cache_key_episode() {
        assert_eq!(
            cache_key("1399", MediaType::Tv, Some(2), Some(5)),
            "moviesmod_1399_tv_s2e5"
        );
    }

    #[tokio::test]
    async fn test_memory_cache_roundtrip() {
        let cache = MemoryCache::new(Duration::from_secs(60));
        cache.put("k", entry("Inception")).await;
        let got = cache.get("k").await.expect("entry should be present");
        assert_eq!(got.media_info.title, "Inception");
    }

    #[tokio::test]
    async fn test_memory_cache_expiry_is_a_miss() {
        let cache = MemoryCache::new(Duration::from_millis(0));
        cache.put("k", entry("Inception")).await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(cache.get("k").await.is_none());
    }

    #[tokio::test]
    async fn test_noop_cache_never_stores() {
        let cache = NoopCache;
        cache.put("k", entry("Inception")).await;
        assert!(cache.get("k").await.is_none());
    }
}

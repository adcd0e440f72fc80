//! In-memory cache using DashMap

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Simple in-memory cache of rendered strings with TTL support
pub struct MemoryCache {
    data: Arc<DashMap<String, CacheEntry>>,
}

struct CacheEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl MemoryCache {
    /// Must be called inside a tokio runtime; spawns the expiry sweeper
    pub fn new() -> Self {
        let cache = Self {
            data: Arc::new(DashMap::new()),
        };

        cache.start_cleanup_task();

        cache
    }

    /// Get a value from cache
    pub fn get(&self, key: &str) -> Option<String> {
        let entry = self.data.get(key)?;
        if let Some(expires) = entry.expires_at {
            if Instant::now() > expires {
                drop(entry);
                self.data.remove(key);
                return None;
            }
        }
        Some(entry.value.clone())
    }

    /// Set a value with TTL
    pub fn set_with_ttl(&self, key: String, value: String, ttl: Duration) {
        self.data.insert(
            key,
            CacheEntry {
                value,
                expires_at: Some(Instant::now() + ttl),
            },
        );
    }

    /// Drop every entry whose key starts with `prefix`
    pub fn delete_prefix(&self, prefix: &str) {
        self.data.retain(|key, _| !key.starts_with(prefix));
    }

    fn start_cleanup_task(&self) {
        let data = self.data.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(60));
            loop {
                interval.tick().await;

                let now = Instant::now();
                data.retain(|_, entry| entry.expires_at.map(|e| now <= e).unwrap_or(true));
            }
        });
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

//! Rendered-fragment memoization on top of the memory cache

use crate::storage::MemoryCache;
use quire_core::Result;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

#[derive(Clone)]
pub struct FragmentCache {
    cache: Arc<MemoryCache>,
    ttl: Duration,
    /// Bumped on every invalidation
    generation: Arc<AtomicU64>,
}

impl FragmentCache {
    pub fn new(cache: Arc<MemoryCache>, ttl: Duration) -> Self {
        Self {
            cache,
            ttl,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Return the cached fragment for `key`, or render, store and return it.
    /// Failed renders are not cached, nor are renders that overlapped an
    /// invalidation.
    pub async fn get_or_render<F, Fut>(&self, key: String, render: F) -> Result<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String>>,
    {
        if let Some(hit) = self.cache.get(&key) {
            debug!("Fragment cache hit: {}", key);
            return Ok(hit);
        }

        debug!("Fragment cache miss: {}", key);
        let generation = self.generation.load(Ordering::SeqCst);
        let rendered = render().await?;
        if self.generation.load(Ordering::SeqCst) == generation {
            self.cache.set_with_ttl(key, rendered.clone(), self.ttl);
        } else {
            debug!("Fragment {} invalidated while rendering", key);
        }
        Ok(rendered)
    }

    pub fn invalidate_prefix(&self, prefix: &str) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.cache.delete_prefix(prefix);
    }
}

//! Injected cache for security contexts.
//!
//! Entries carry an absolute expiration. An entry whose expiration is at or
//! before "now" is treated as absent and removed on read.

use crate::context::provider::SecurityContext;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::clock::Clock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Key → security context store with per-entry absolute expiration.
#[async_trait]
pub trait TokenCache: Send + Sync {
    /// Live entry for `key`, if any.
    async fn get(&self, key: &str) -> Option<Arc<SecurityContext>>;

    /// Store `context` under `key` until `expires_at`. Last writer wins.
    async fn insert(&self, key: &str, context: Arc<SecurityContext>, expires_at: DateTime<Utc>);

    /// Drop the entry for `key`. Returns whether one was present.
    async fn remove(&self, key: &str) -> bool;
}

struct CacheEntry {
    context: Arc<SecurityContext>,
    expires_at: DateTime<Utc>,
}

/// In-process [`TokenCache`].
pub struct MemoryTokenCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    clock: Arc<dyn Clock>,
}

impl MemoryTokenCache {
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Number of stored entries, including ones that have expired but not yet
    /// been read.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl TokenCache for MemoryTokenCache {
    async fn get(&self, key: &str) -> Option<Arc<SecurityContext>> {
        let now = self.clock.now_utc();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => return None,
                Some(entry) if entry.expires_at > now => return Some(entry.context.clone()),
                Some(_) => {}
            }
        }

        // Expired: evict unless a writer replaced it in the meantime
        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|entry| entry.expires_at <= now) {
            entries.remove(key);
            tracing::trace!(target: "auth.context", "Evicted expired cache entry");
        }
        None
    }

    async fn insert(&self, key: &str, context: Arc<SecurityContext>, expires_at: DateTime<Utc>) {
        self.entries.write().await.insert(
            key.to_string(),
            CacheEntry {
                context,
                expires_at,
            },
        );
    }

    async fn remove(&self, key: &str) -> bool {
        self.entries.write().await.remove(key).is_some()
    }
}

impl fmt::Debug for MemoryTokenCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryTokenCache")
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

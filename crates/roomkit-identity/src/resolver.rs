use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use roomkit_core::IdentityId;
use roomkit_store::Store;

use crate::error::Result;
use crate::types::ResolveOutcome;

#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, channel_type: &str, address: &str) -> Result<ResolveOutcome>;
}

/// Default resolver: a single-identity lookup against the store, fronted by
/// a bounded `(channel_type, address) -> identity_id` cache so repeated
/// messages from the same sender skip the store round-trip. Eviction is the
/// same "oldest half at capacity" policy the host project's own identity
/// cache uses.
pub struct CachingIdentityResolver {
    store: Arc<dyn Store>,
    capacity: usize,
    cache: Mutex<std::collections::HashMap<(String, String), IdentityId>>,
    cache_order: Mutex<Vec<(String, String)>>,
}

impl CachingIdentityResolver {
    pub fn new(store: Arc<dyn Store>, capacity: usize) -> Self {
        Self {
            store,
            capacity,
            cache: Mutex::new(std::collections::HashMap::new()),
            cache_order: Mutex::new(Vec::new()),
        }
    }

    async fn cache_lookup(&self, key: &(String, String)) -> Option<IdentityId> {
        self.cache.lock().await.get(key).cloned()
    }

    async fn cache_insert(&self, key: (String, String), identity_id: IdentityId) {
        let mut cache = self.cache.lock().await;
        let mut order = self.cache_order.lock().await;

        cache.insert(key.clone(), identity_id);
        order.retain(|k| k != &key);
        order.push(key);

        if cache.len() > self.capacity {
            let evict_count = cache.len() / 2;
            for key in order.drain(0..evict_count) {
                cache.remove(&key);
            }
        }
    }
}

#[async_trait]
impl IdentityResolver for CachingIdentityResolver {
    async fn resolve(&self, channel_type: &str, address: &str) -> Result<ResolveOutcome> {
        let key = (channel_type.to_string(), address.to_string());
        if let Some(identity_id) = self.cache_lookup(&key).await {
            return Ok(ResolveOutcome::Found(identity_id));
        }

        match self.store.resolve_identity(channel_type, address).await {
            Ok(Some(identity)) => {
                self.cache_insert(key, identity.id.clone()).await;
                Ok(ResolveOutcome::Found(identity.id))
            }
            Ok(None) => Ok(ResolveOutcome::NotFound),
            Err(e) => Err(crate::error::IdentityError::Backend(e.to_string())),
        }
    }
}

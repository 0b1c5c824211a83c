//! Child load caching

use std::sync::Arc;

use ahash::AHashMap;
use parking_lot::RwLock;
use tn_core::{ChildLoader, ChildNode, ChildRequest};
use tracing::trace;

/// Loader wrapper remembering successful answers per request.
///
/// Re-expanding a branch after going back then costs no backend round trip.
/// Failures are never cached.
pub struct CachedLoader<L> {
    inner: L,
    /// Cached answers indexed by request
    entries: Arc<RwLock<AHashMap<ChildRequest, Vec<ChildNode>>>>,
    /// Maximum number of answers to keep
    max_entries: usize,
}

impl<L: ChildLoader> CachedLoader<L> {
    /// Create a new cache in front of `inner`
    pub fn new(inner: L, max_entries: usize) -> Self {
        Self {
            inner,
            entries: Arc::new(RwLock::new(AHashMap::new())),
            max_entries: max_entries.max(1),
        }
    }

    fn get(&self, request: &ChildRequest) -> Option<Vec<ChildNode>> {
        self.entries.read().get(request).cloned()
    }

    fn put(&self, request: ChildRequest, nodes: Vec<ChildNode>) {
        let mut entries = self.entries.write();

        if entries.len() >= self.max_entries && !entries.contains_key(&request) {
            // Evict an arbitrary entry
            if let Some(key) = entries.keys().next().cloned() {
                entries.remove(&key);
            }
        }

        entries.insert(request, nodes);
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Clear the cache
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn inner(&self) -> &L {
        &self.inner
    }
}

#[async_trait::async_trait]
impl<L: ChildLoader> ChildLoader for CachedLoader<L> {
    async fn children(&self, request: &ChildRequest) -> anyhow::Result<Vec<ChildNode>> {
        if let Some(nodes) = self.get(request) {
            trace!("Cache hit for '{}'", request.parent_value);
            return Ok(nodes);
        }

        let nodes = self.inner.children(request).await?;
        self.put(request.clone(), nodes.clone());
        Ok(nodes)
    }

    fn source_name(&self) -> &str {
        self.inner.source_name()
    }
}

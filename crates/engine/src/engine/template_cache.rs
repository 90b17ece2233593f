//! Process-wide read-through cache of activity templates.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::model::ActivityTemplate;
use crate::store::ActivityTemplateStore;

/// Templates are treated as immutable once published, so entries never
/// expire. Misses are not cached.
pub struct TemplateCache {
    store: Arc<dyn ActivityTemplateStore>,
    entries: RwLock<HashMap<Uuid, Arc<ActivityTemplate>>>,
}

impl TemplateCache {
    pub fn new(store: Arc<dyn ActivityTemplateStore>) -> Self {
        Self {
            store,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Return the template, loading it from the store on first use.
    ///
    /// Two callers racing on a cold key may both load it; the first insert
    /// wins and both observe an equal template.
    pub async fn get_template(&self, id: Uuid) -> AppResult<Arc<ActivityTemplate>> {
        {
            let entries = self.entries.read().await;
            if let Some(template) = entries.get(&id) {
                return Ok(Arc::clone(template));
            }
        }

        let loaded = self
            .store
            .get_template(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Activity template {}", id)))?;

        let mut entries = self.entries.write().await;
        let template = entries.entry(id).or_insert_with(|| Arc::new(loaded));
        tracing::debug!(template_id = %id, code = %template.code, "Cached activity template");
        Ok(Arc::clone(template))
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_second_lookup_is_served_from_cache() {
        let store = Arc::new(MemoryStore::new());
        let template = ActivityTemplate::new("Create client", "client.create");
        let id = template.id;
        store.insert_template(template).await;

        let cache = TemplateCache::new(store.clone());
        let first = cache.get_template(id).await.unwrap();
        let second = cache.get_template(id).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(store.template_reads(), 1);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_missing_template_is_not_cached() {
        let store = Arc::new(MemoryStore::new());
        let cache = TemplateCache::new(store.clone());
        let id = Uuid::new_v4();

        assert!(matches!(
            cache.get_template(id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(cache.is_empty().await);

        let mut template = ActivityTemplate::new("Late", "system.echo");
        template.id = id;
        store.insert_template(template).await;

        assert_eq!(cache.get_template(id).await.unwrap().code, "system.echo");
        assert_eq!(store.template_reads(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_lookups_agree() {
        let store = Arc::new(MemoryStore::new());
        let template = ActivityTemplate::new("Create client", "client.create");
        let id = template.id;
        store.insert_template(template).await;

        let cache = Arc::new(TemplateCache::new(store.clone()));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.get_template(id).await.unwrap() })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().code, "client.create");
        }
        assert!(store.template_reads() >= 1);
        assert_eq!(cache.len().await, 1);
    }
}

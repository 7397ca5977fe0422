//! Cache de listados de despachos
//!
//! Objeto explícito con TTL e invalidación manual. Cada listado se guarda
//! bajo la clave de su filtro; cualquier mutación de un despacho llama a
//! `invalidate()`. Un listado cargado antes de una invalidación no llega a
//! guardarse.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::debug;

use super::CacheConfig;
use crate::models::dispatch::DispatchRecord;
use crate::utils::errors::AppResult;

#[derive(Debug, Clone)]
struct CachedList {
    records: Vec<DispatchRecord>,
    stored_at: Instant,
}

/// Estadísticas del cache
#[derive(Debug, Default, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries_expired: u64,
    pub entries_evicted: u64,
    pub invalidations: u64,
}

pub struct DispatchCache {
    entries: RwLock<HashMap<String, CachedList>>,
    config: CacheConfig,
    stats: RwLock<CacheStats>,
    /// Se incrementa en cada `invalidate()`, siempre con `entries` bloqueado
    generation: AtomicU64,
}

impl DispatchCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            config,
            stats: RwLock::new(CacheStats::default()),
            generation: AtomicU64::new(0),
        }
    }

    pub async fn get(&self, key: &str) -> Option<Vec<DispatchRecord>> {
        let mut entries = self.entries.write().await;
        let mut stats = self.stats.write().await;

        match entries.get(key) {
            Some(cached) if cached.stored_at.elapsed() < self.config.ttl => {
                stats.hits += 1;
                debug!("📥 Cache HIT para listado: {}", key);
                Some(cached.records.clone())
            }
            Some(_) => {
                entries.remove(key);
                stats.entries_expired += 1;
                stats.misses += 1;
                debug!("⌛ Cache MISS (expirado) para listado: {}", key);
                None
            }
            None => {
                stats.misses += 1;
                debug!("❌ Cache MISS para listado: {}", key);
                None
            }
        }
    }

    pub async fn put(&self, key: &str, records: Vec<DispatchRecord>) {
        let mut entries = self.entries.write().await;
        self.insert_entry(&mut entries, key, records).await;
    }

    async fn insert_entry(
        &self,
        entries: &mut HashMap<String, CachedList>,
        key: &str,
        records: Vec<DispatchRecord>,
    ) {
        if entries.len() >= self.config.max_entries && !entries.contains_key(key) {
            // Expulsa el listado más antiguo
            if let Some(oldest) = entries
                .iter()
                .min_by_key(|(_, cached)| cached.stored_at)
                .map(|(k, _)| k.clone())
            {
                entries.remove(&oldest);
                self.stats.write().await.entries_evicted += 1;
            }
        }

        entries.insert(
            key.to_string(),
            CachedList {
                records,
                stored_at: Instant::now(),
            },
        );
    }

    /// Devuelve el listado cacheado o lo carga con `loader` y lo guarda
    pub async fn get_or_load<F, Fut>(&self, key: &str, loader: F) -> AppResult<Vec<DispatchRecord>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<Vec<DispatchRecord>>>,
    {
        if let Some(records) = self.get(key).await {
            return Ok(records);
        }
        self.refresh(key, loader).await
    }

    /// Recarga un listado ignorando lo que haya en cache
    pub async fn refresh<F, Fut>(&self, key: &str, loader: F) -> AppResult<Vec<DispatchRecord>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<Vec<DispatchRecord>>>,
    {
        let generation = self.generation.load(Ordering::Acquire);
        let records = loader().await?;

        let mut entries = self.entries.write().await;
        if self.generation.load(Ordering::Acquire) == generation {
            self.insert_entry(&mut entries, key, records.clone()).await;
        } else {
            debug!("🧹 Listado {} invalidado durante la carga, no se guarda", key);
        }
        Ok(records)
    }

    /// Descarta todos los listados
    pub async fn invalidate(&self) {
        let mut entries = self.entries.write().await;
        let dropped = entries.len();
        entries.clear();
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.stats.write().await.invalidations += 1;
        debug!("🧹 Cache de despachos invalidado ({} listados)", dropped);
    }

    pub async fn stats(&self) -> CacheStats {
        self.stats.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn cache_with_ttl(ttl: Duration, max_entries: usize) -> DispatchCache {
        DispatchCache::new(CacheConfig { ttl, max_entries })
    }

    #[tokio::test]
    async fn test_get_or_load_uses_cache_until_invalidated() {
        let cache = cache_with_ttl(Duration::from_secs(30), 8);

        let first = cache.get_or_load("all", || async { Ok(Vec::new()) }).await.unwrap();
        assert!(first.is_empty());

        // El loader no debe ejecutarse con el listado en cache
        let second = cache
            .get_or_load("all", || async {
                Err(crate::utils::errors::AppError::Internal("loader should not run".into()))
            })
            .await
            .unwrap();
        assert!(second.is_empty());

        cache.invalidate().await;
        assert!(cache.is_empty().await);

        let stats = cache.stats().await;
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.invalidations, 1);
    }

    #[tokio::test]
    async fn test_expired_entries_are_dropped() {
        let cache = cache_with_ttl(Duration::ZERO, 8);
        cache.put("all", Vec::new()).await;

        assert!(cache.get("all").await.is_none());
        assert_eq!(cache.stats().await.entries_expired, 1);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_oldest_entry_is_evicted_when_full() {
        let cache = cache_with_ttl(Duration::from_secs(30), 2);
        cache.put("a", Vec::new()).await;
        tokio::time::sleep(Duration::from_millis(2)).await;
        cache.put("b", Vec::new()).await;
        cache.put("c", Vec::new()).await;

        assert_eq!(cache.len().await, 2);
        assert!(cache.get("a").await.is_none());
        assert!(cache.get("c").await.is_some());
        assert_eq!(cache.stats().await.entries_evicted, 1);
    }

    #[tokio::test]
    async fn test_load_overlapping_invalidation_is_not_stored() {
        let cache = cache_with_ttl(Duration::from_secs(30), 8);

        let loaded = cache
            .get_or_load("all", || async {
                // Una mutación termina mientras el listado se está leyendo
                cache.invalidate().await;
                Ok(Vec::new())
            })
            .await
            .unwrap();
        assert!(loaded.is_empty());

        assert!(cache.get("all").await.is_none());
        assert!(cache.is_empty().await);

        // Sin invalidaciones de por medio se guarda normalmente
        cache.get_or_load("all", || async { Ok(Vec::new()) }).await.unwrap();
        assert!(cache.get("all").await.is_some());
    }

    #[tokio::test]
    async fn test_refresh_propagates_loader_errors() {
        let cache = cache_with_ttl(Duration::from_secs(30), 8);
        let result = cache
            .refresh("all", || async {
                Err(crate::utils::errors::AppError::Internal("boom".into()))
            })
            .await;
        assert!(result.is_err());
        assert!(cache.is_empty().await);
    }
}

// Beatmap metadata and pp vector stores, keyed by beatmap checksum.
use crate::beatmap::{Beatmap, PpVector};
use crate::config::CacheConfig;
use async_trait::async_trait;
use moka::sync::Cache;
use std::time::Duration;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait BeatmapStore: Send + Sync {
    async fn load(&self, checksum: &str, set_id: u32) -> Result<Option<Beatmap>, StoreError>;

    /// Inserts or replaces the stored beatmap.
    async fn save(&self, beatmap: &Beatmap) -> Result<(), StoreError>;
}

/// pp vectors of the no-mod, no-accuracy condition.
#[async_trait]
pub trait PpCache: Send + Sync {
    async fn get(&self, checksum: &str) -> Result<Option<PpVector>, StoreError>;

    async fn put(&self, checksum: &str, pp: PpVector) -> Result<(), StoreError>;
}

fn build_cache<V>(config: &CacheConfig) -> Cache<String, V>
where
    V: Clone + Send + Sync + 'static,
{
    let builder = Cache::<String, V>::builder().max_capacity(config.max_capacity);
    match config.ttl_secs {
        Some(ttl) => builder.time_to_live(Duration::from_secs(ttl)).build(),
        None => builder.build(),
    }
}

pub struct MemoryBeatmapStore {
    cache: Cache<String, Beatmap>,
}

impl MemoryBeatmapStore {
    pub fn new(config: &CacheConfig) -> Self {
        MemoryBeatmapStore {
            cache: build_cache(config),
        }
    }
}

#[async_trait]
impl BeatmapStore for MemoryBeatmapStore {
    async fn load(&self, checksum: &str, set_id: u32) -> Result<Option<Beatmap>, StoreError> {
        // A re-uploaded set can reuse a checksum under a new set id.
        Ok(self.cache.get(checksum).filter(|b| b.set_id == set_id))
    }

    async fn save(&self, beatmap: &Beatmap) -> Result<(), StoreError> {
        self.cache.insert(beatmap.checksum.clone(), beatmap.clone());
        Ok(())
    }
}

pub struct MemoryPpCache {
    cache: Cache<String, PpVector>,
}

impl MemoryPpCache {
    pub fn new(config: &CacheConfig) -> Self {
        MemoryPpCache {
            cache: build_cache(config),
        }
    }
}

#[async_trait]
impl PpCache for MemoryPpCache {
    async fn get(&self, checksum: &str) -> Result<Option<PpVector>, StoreError> {
        Ok(self.cache.get(checksum))
    }

    async fn put(&self, checksum: &str, pp: PpVector) -> Result<(), StoreError> {
        self.cache.insert(checksum.to_string(), pp);
        Ok(())
    }
}

use async_trait::async_trait;
use dashmap::DashMap;
use kabuka_core::cache::error::CacheError;
use kabuka_core::cache::port::Cache;

/// # Summary
/// 基于 DashMap 的进程内缓存。
///
/// # Invariants
/// - 所有操作均通过并发哈希表执行，可在多个任务间共享。
/// - 本层不做过期与容量控制，过期由 `BucketedCache` 负责。
pub struct MemCache {
    storage: DashMap<String, Vec<u8>>,
}

impl MemCache {
    pub fn new() -> Self {
        Self {
            storage: DashMap::new(),
        }
    }

    /// 当前条目数量。
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }
}

impl Default for MemCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Cache for MemCache {
    async fn set_raw(&self, key: &str, value: Vec<u8>) -> Result<(), CacheError> {
        self.storage.insert(key.to_string(), value);
        Ok(())
    }

    async fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(self.storage.get(key).map(|v| v.value().clone()))
    }

    async fn del(&self, key: &str) -> Result<(), CacheError> {
        self.storage.remove(key);
        Ok(())
    }

    /// # Summary
    /// 按前缀清理过期桶。
    ///
    /// # Logic
    /// 先收集待删除键再逐个移除，避免在持有分片读锁时写入。
    async fn evict_prefix(&self, prefix: &str, keep: &str) -> Result<usize, CacheError> {
        let stale: Vec<String> = self
            .storage
            .iter()
            .filter(|entry| entry.key().starts_with(prefix) && entry.key() != keep)
            .map(|entry| entry.key().clone())
            .collect();

        for key in &stale {
            self.storage.remove(key);
        }
        Ok(stale.len())
    }
}

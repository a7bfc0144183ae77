use kabuka_core::cache::error::CacheError;
use kabuka_core::cache::port::{Cache, CacheExt};
use kabuka_core::common::time::TimeProvider;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

/// # Summary
/// 以时间分桶实现 TTL 的强类型缓存包装。
///
/// # Logic
/// 1. 桶号 = `now.timestamp() / ttl_secs` (向下取整)。
/// 2. 实际存储键为 `"{key}@{bucket}"`，时钟跨过桶边界后旧键自然失效。
/// 3. 写入新桶时顺带清理同一逻辑键的旧桶。
///
/// # Invariants
/// - 当前时间只从 `TimeProvider` 读取，测试可拨动虚拟时钟。
/// - 同一桶内重复读取不会触发上游请求。
pub struct BucketedCache<C: Cache> {
    inner: C,
    clock: Arc<dyn TimeProvider>,
    ttl_secs: i64,
}

impl<C: Cache> BucketedCache<C> {
    /// # Summary
    /// 创建分桶缓存。
    ///
    /// # Arguments
    /// * `inner`: 底层 KV 存储。
    /// * `clock`: 时钟。
    /// * `ttl_secs`: 桶宽 (秒)，必须大于 0。
    ///
    /// # Returns
    /// `ttl_secs` 为 0 或超出 `i64` 时返回 `InvalidConfig`。
    pub fn new(inner: C, clock: Arc<dyn TimeProvider>, ttl_secs: u64) -> Result<Self, CacheError> {
        let ttl_secs = i64::try_from(ttl_secs)
            .ok()
            .filter(|ttl| *ttl > 0)
            .ok_or_else(|| CacheError::InvalidConfig(format!("非法 TTL: {} 秒", ttl_secs)))?;
        Ok(Self {
            inner,
            clock,
            ttl_secs,
        })
    }

    /// 当前时刻所在的桶号。
    pub fn bucket(&self) -> i64 {
        self.clock.now().timestamp().div_euclid(self.ttl_secs)
    }

    fn bucket_key(&self, key: &str) -> String {
        format!("{}@{}", key, self.bucket())
    }

    /// 读取当前桶中的值，跨桶后返回 `None`。
    pub async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>, CacheError> {
        self.inner.get(&self.bucket_key(key)).await
    }

    /// 写入当前桶并清理同一键的旧桶。
    pub async fn set<T: Serialize + Send + Sync>(&self, key: &str, value: &T) -> Result<(), CacheError> {
        let bucket_key = self.bucket_key(key);
        self.inner.set(&bucket_key, value).await?;

        let evicted = self.inner.evict_prefix(&format!("{}@", key), &bucket_key).await?;
        if evicted > 0 {
            debug!(key, evicted, "evicted stale cache buckets");
        }
        Ok(())
    }

    /// # Summary
    /// 命中则直接返回，否则调用 `fetch` 并写入当前桶。
    ///
    /// # Logic
    /// 1. 读取当前桶；反序列化失败视为未命中 (缓存结构可能已变更)。
    /// 2. 未命中时执行 `fetch`，其错误原样返回且不写缓存。
    /// 3. 写缓存失败只记录警告，不影响本次结果。
    pub async fn get_or_fetch<T, E, F, Fut>(&self, key: &str, fetch: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
        E: From<CacheError>,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<T, E>> + Send,
    {
        match self.get::<T>(key).await {
            Ok(Some(hit)) => {
                debug!(key, "cache hit");
                return Ok(hit);
            }
            Ok(None) => {}
            Err(CacheError::Deserialize(e)) => {
                warn!(key, error = %e, "discarding undecodable cache entry");
            }
            Err(e) => return Err(e.into()),
        }

        let value = fetch().await?;
        if let Err(e) = self.set(key, &value).await {
            warn!(key, error = %e, "failed to store cache entry");
        }
        Ok(value)
    }
}

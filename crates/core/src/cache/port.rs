use crate::cache::error::CacheError;
use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};

/// # Summary
/// 以字节为值的异步键值存储端口，行情缓存与 TTL 分桶都建在它之上。
///
/// # Invariants
/// - 只处理原始字节，保证 Trait 对象安全 (Object Safe)。
/// - 过期策略不在此层实现，由 `BucketedCache` 通过键名分桶完成。
#[async_trait]
pub trait Cache: Send + Sync {
    /// 写入原始字节，同名键直接覆盖。
    async fn set_raw(&self, key: &str, value: Vec<u8>) -> Result<(), CacheError>;

    /// 读取原始字节，不存在返回 `None`。
    async fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// 删除指定键，键不存在时同样返回 Ok。
    async fn del(&self, key: &str) -> Result<(), CacheError>;

    /// # Summary
    /// 删除所有以 `prefix` 开头且不等于 `keep` 的键。
    ///
    /// # Logic
    /// 1. 遍历存储中的键。
    /// 2. 匹配前缀且不是当前有效键的条目全部移除。
    ///
    /// # Arguments
    /// * `prefix`: 键名前缀。
    /// * `keep`: 需要保留的完整键名。
    ///
    /// # Returns
    /// 返回被删除的条目数量。
    async fn evict_prefix(&self, prefix: &str, keep: &str) -> Result<usize, CacheError>;
}

/// # Summary
/// 缓存泛型扩展接口，以 JSON 序列化提供强类型存取。
///
/// # Invariants
/// - 任何 `Cache` 实现 (含 trait object) 都自动获得这些方法。
#[async_trait]
pub trait CacheExt: Cache {
    /// 序列化为 JSON 后写入，错误信息附带键名。
    async fn set<T: Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), CacheError> {
        let bytes = serde_json::to_vec(value)
            .map_err(|e| CacheError::Serialize(format!("{}: {}", key, e)))?;
        self.set_raw(key, bytes).await
    }

    /// 读取并反序列化，键不存在返回 `None`。
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>, CacheError> {
        self.get_raw(key)
            .await?
            .map(|bytes| {
                serde_json::from_slice(&bytes)
                    .map_err(|e| CacheError::Deserialize(format!("{}: {}", key, e)))
            })
            .transpose()
    }
}

impl<T: Cache + ?Sized> CacheExt for T {}

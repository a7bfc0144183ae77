use thiserror::Error;

/// 缓存读写错误。键名会拼进描述里，便于定位是哪条缓存出了问题。
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("failed to encode cache entry {0}")]
    Serialize(String),
    // 多半是缓存结构变了而旧条目还在
    #[error("failed to decode cache entry {0}")]
    Deserialize(String),
    #[error("cache backend failure: {0}")]
    Storage(String),
    #[error("invalid cache setting: {0}")]
    InvalidConfig(String),
}

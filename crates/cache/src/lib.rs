//! # `kabuka-cache` - 缓存适配器
//!
//! - `mem`: 基于 DashMap 的进程内 KV 存储
//! - `ttl`: 按时间分桶实现过期的强类型包装

pub mod mem;
pub mod ttl;

pub use mem::MemCache;
pub use ttl::BucketedCache;

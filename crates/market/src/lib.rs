//! # `kabuka-market` - 行情领域服务
//!
//! 把数据源、缓存与指标引擎串联起来，对外提供 `Market` 端口的实现。

pub mod manager;

pub use manager::MarketImpl;

//! # `kabuka-core` - 领域核心
//!
//! 本 crate 只包含实体、错误枚举、端口 (Trait) 与全局配置，不含任何 I/O 实现。
//!
//! ## 模块划分
//! - `common`: 证券身份、K 线周期与时钟抽象
//! - `market`: K 线序列、公司资料、行情快照及数据源端口
//! - `indicator`: 指标窗口参数、指标结果集与信号快照
//! - `trade`: 手续费表、持仓与估值实体
//! - `cache`: 业务无关的 KV 缓存端口
//! - `config`: 应用全局配置

pub mod cache;
pub mod common;
pub mod config;
pub mod indicator;
pub mod market;
pub mod trade;

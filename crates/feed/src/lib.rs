//! # `kabuka-feed` - 外部行情数据源适配器
//!
//! 目前只有 Yahoo Finance 一个实现，同时提供 K 线、公司资料与汇率。

pub mod yahoo;

pub use yahoo::YahooProvider;

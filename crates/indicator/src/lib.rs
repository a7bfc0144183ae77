//! # `kabuka-indicator` - 技术指标与信号引擎
//!
//! 纯计算 crate：无 I/O、无共享可变状态，相同输入永远得到相同输出。
//!
//! ## 架构职责
//! - `primitives`: SMA / EMA / Wilder 平滑等序列基础运算
//! - `engine`: 由 K 线序列计算均线族、RSI、MACD 与相对成交量
//! - `classifier`: 将最新指标值映射为离散信号状态

pub mod classifier;
pub mod engine;
pub mod primitives;

pub use classifier::{classify_signal, classify_signal_with};
pub use engine::compute_indicators;

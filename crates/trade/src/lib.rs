//! # `kabuka-trade` - 交易试算
//!
//! 手续费、损益平衡价、目标卖价、损益估算与持仓合并。
//! 所有函数均为纯函数，金额统一使用 `Decimal` 计算。

pub mod economics;
